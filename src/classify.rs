//! Script Classifier
//!
//! Finds the scripts the rewriter has to touch:
//!
//! 1. **Entry scripts**: `type="module"` anywhere in `<body>`, or an empty
//!    `crossorigin` attribute in `<head>` (how production builds emit their
//!    entry chunk). Each is tagged with its ordinal so "the last one" is an
//!    explicit property of the selection.
//! 2. **Dev client**: the module script the dev server injects at
//!    `<base>@vite/client`.
//! 3. **Refresh shim**: the inline module script that statically imports
//!    `/@react-refresh`.

use crate::dom::{HtmlDocument, Region, ScriptElement};

/// Dev client path relative to the configured base.
pub const DEV_CLIENT_PATH: &str = "@vite/client";

/// Reference string that identifies the hot-reload shim's inline body.
pub const REFRESH_SHIM_PATH: &str = "/@react-refresh";

/// An entry script with its position in the selection.
#[derive(Debug, Clone)]
pub struct EntryScript {
    pub ordinal: usize,
    pub total: usize,
    pub script: ScriptElement,
}

impl EntryScript {
    pub fn is_last(&self) -> bool {
        self.ordinal + 1 == self.total
    }
}

pub fn is_entry_script(script: &ScriptElement) -> bool {
    match script.region() {
        Some(Region::Body) => script.is_module(),
        Some(Region::Head) => script.attr("crossorigin").is_some_and(|v| v.is_empty()),
        None => false,
    }
}

pub fn select_entry_scripts(doc: &HtmlDocument) -> Vec<EntryScript> {
    let scripts = doc.select_scripts(is_entry_script);
    let total = scripts.len();
    scripts
        .into_iter()
        .enumerate()
        .map(|(ordinal, script)| EntryScript {
            ordinal,
            total,
            script,
        })
        .collect()
}

/// The head module script whose `src` is exactly `client_src`.
pub fn select_dev_client(doc: &HtmlDocument, client_src: &str) -> Option<ScriptElement> {
    doc.select_scripts(|s| {
        s.region() == Some(Region::Head)
            && s.is_module()
            && s.attr("src").as_deref() == Some(client_src)
    })
    .into_iter()
    .next()
}

pub fn select_refresh_shim(doc: &HtmlDocument) -> Option<ScriptElement> {
    doc.select_scripts(|s| {
        s.region() == Some(Region::Head) && s.is_module() && s.text().contains(REFRESH_SHIM_PATH)
    })
    .into_iter()
    .next()
}
