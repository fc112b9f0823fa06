//! Dev-Server Response Interceptor
//!
//! HTML the dev server renders for secondary routes never passes through the
//! index transform, so its injected client script would load eagerly. The
//! interceptor sits in front of the response's completion call and defers that
//! script before the body goes out.

use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::config::BuildEnv;
use crate::dev::adapt_dev_client;
use crate::dom::HtmlDocument;
use crate::error::TransformError;
use crate::rewrite::ImportPrefix;

#[cfg(feature = "napi")]
use napi_derive::napi;

/// Body handed to a response's completion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    Text(String),
    Binary(Vec<u8>),
}

impl From<String> for ResponsePayload {
    fn from(text: String) -> Self {
        ResponsePayload::Text(text)
    }
}

impl From<Vec<u8>> for ResponsePayload {
    fn from(bytes: Vec<u8>) -> Self {
        ResponsePayload::Binary(bytes)
    }
}

/// Middleware registration surface of a dev server.
pub trait DevServer {
    fn use_response_interceptor(&mut self, interceptor: DevResponseInterceptor);
}

/// Rewrites the dev client script in outgoing HTML.
///
/// Whether it does anything is decided per response: the build environment
/// may be captured after the interceptor is registered.
#[derive(Debug, Clone)]
pub struct DevResponseInterceptor {
    use_dev_mode: bool,
    env: Arc<OnceLock<BuildEnv>>,
}

impl DevResponseInterceptor {
    pub fn new(use_dev_mode: bool, env: Arc<OnceLock<BuildEnv>>) -> Self {
        Self { use_dev_mode, env }
    }

    /// An interceptor bound to an already known environment.
    pub fn for_env(env: BuildEnv) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(env);
        Self::new(true, Arc::new(cell))
    }

    pub fn is_active(&self) -> bool {
        self.use_dev_mode && !self.env().production
    }

    fn env(&self) -> BuildEnv {
        self.env.get().cloned().unwrap_or_default()
    }

    pub fn rewrite(&self, payload: ResponsePayload) -> ResponsePayload {
        if !self.is_active() {
            return payload;
        }
        match payload {
            ResponsePayload::Text(html) => ResponsePayload::Text(self.rewrite_text(html)),
            binary => binary,
        }
    }

    /// Wrap a completion call so every payload is rewritten before it is sent.
    pub fn wrap_end<'a, F, R>(&'a self, end: F) -> impl FnOnce(ResponsePayload) -> R + 'a
    where
        F: FnOnce(ResponsePayload) -> R + 'a,
    {
        move |payload| end(self.rewrite(payload))
    }

    fn rewrite_text(&self, html: String) -> String {
        match rewrite_dev_client_html(&html, &self.env()) {
            Ok(Some(rewritten)) => rewritten,
            Ok(None) => html,
            Err(err) => {
                warn!(target: "qiankun_html", error = %err, "dev response left unmodified");
                html
            }
        }
    }
}

/// Defer the dev client script in `html`; `None` when there is none to defer.
pub fn rewrite_dev_client_html(
    html: &str,
    env: &BuildEnv,
) -> Result<Option<String>, TransformError> {
    if !looks_like_html(html) || !html.contains(&env.dev_client_src()) {
        return Ok(None);
    }
    let doc = HtmlDocument::parse(html)?;
    if adapt_dev_client(&doc, env, ImportPrefix::QiankunPublicPath).is_none() {
        return Ok(None);
    }
    debug!(target: "qiankun_html", base = %env.base, "deferred dev client in response");
    doc.to_html().map(Some)
}

/// Cheap guard against module payloads (JS, CSS) the dev server also sends as text.
fn looks_like_html(text: &str) -> bool {
    let head = text.trim_start().as_bytes();
    [b"<!doctype html".as_slice(), b"<html".as_slice()]
        .iter()
        .any(|tag| head.len() >= tag.len() && head[..tag.len()].eq_ignore_ascii_case(tag))
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn rewrite_dev_response_native(html: String, base: String) -> napi::Result<String> {
    let env = BuildEnv {
        production: false,
        base: crate::config::normalize_base(&base),
    };
    Ok(rewrite_dev_client_html(&html, &env)?.unwrap_or(html))
}
