//! Plugin facade
//!
//! Holds what one plugin instance knows (the sub-application name, its
//! options, the build environment once resolved) and exposes the three hooks
//! the build tool calls.

use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::classify::select_entry_scripts;
use crate::config::{BuildEnv, MicroOption, ResolvedConfig};
use crate::dev::{adapt_dev_client, adapt_refresh_shim};
use crate::dom::HtmlDocument;
use crate::error::TransformError;
use crate::intercept::{DevResponseInterceptor, DevServer};
use crate::lifecycle::bridge_snippet;
use crate::rewrite::{append_finalizer, module_to_dynamic_import, ImportPrefix};

#[cfg(feature = "napi")]
use napi_derive::napi;

#[derive(Debug)]
pub struct QiankunHtmlPlugin {
    qiankun_name: String,
    options: MicroOption,
    env: Arc<OnceLock<BuildEnv>>,
}

impl QiankunHtmlPlugin {
    pub const NAME: &'static str = "qiankun-html-transform";
    pub const ORDER: &'static str = "post";
    pub const ENFORCE: &'static str = "post";

    pub fn new(qiankun_name: impl Into<String>, options: MicroOption) -> Self {
        Self {
            qiankun_name: qiankun_name.into(),
            options,
            env: Arc::new(OnceLock::new()),
        }
    }

    pub fn qiankun_name(&self) -> &str {
        &self.qiankun_name
    }

    pub fn options(&self) -> &MicroOption {
        &self.options
    }

    /// The captured environment, or the serve-at-`/` defaults before capture.
    pub fn build_env(&self) -> BuildEnv {
        self.env.get().cloned().unwrap_or_default()
    }

    /// Dev-mode bridging: requested and not a production build.
    pub fn dev_mode_active(&self) -> bool {
        self.options.use_dev_mode && !self.build_env().production
    }

    /// Configuration-resolved hook. Only the first call is recorded.
    pub fn config_resolved(&self, config: &ResolvedConfig) {
        let env = BuildEnv::from_config(config);
        debug!(target: "qiankun_html", production = env.production, base = %env.base, "configuration resolved");
        if self.env.set(env).is_err() {
            warn!(target: "qiankun_html", "configuration already resolved, ignoring");
        }
    }

    /// Dev-server hook: registers the response interceptor.
    pub fn configure_server<S: DevServer + ?Sized>(&self, server: &mut S) {
        server.use_response_interceptor(DevResponseInterceptor::new(
            self.options.use_dev_mode,
            Arc::clone(&self.env),
        ));
    }

    /// Index-HTML hook. `Ok(None)` means the document needs no change.
    pub fn transform_index_html(&self, html: &str) -> Result<Option<String>, TransformError> {
        let mut doc = HtmlDocument::parse(html)?;

        let entries = select_entry_scripts(&doc);
        if entries.is_empty() {
            debug!(target: "qiankun_html", "no entry scripts, document unchanged");
            return Ok(None);
        }

        let env = self.build_env();
        let dev_mode = self.options.use_dev_mode && !env.production;
        let prefix = ImportPrefix::for_dev_mode(dev_mode);

        let rewritten: Vec<_> = entries
            .iter()
            .filter_map(|entry| module_to_dynamic_import(&entry.script, prefix))
            .collect();
        let Some(last) = rewritten.last() else {
            warn!(
                target: "qiankun_html",
                entries = entries.len(),
                "no entry script has a src, document unchanged"
            );
            return Ok(None);
        };
        append_finalizer(last, &self.qiankun_name);

        if dev_mode {
            adapt_dev_client(&doc, &env, prefix);
            adapt_refresh_shim(&doc, prefix);
        }

        doc.append_body_script(&bridge_snippet(&self.qiankun_name));
        debug!(
            target: "qiankun_html",
            name = %self.qiankun_name,
            entries = entries.len(),
            deferred = rewritten.len(),
            dev_mode,
            "transformed index html"
        );
        doc.to_html().map(Some)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "napi")]
#[napi]
pub fn transform_index_html_native(
    html: String,
    qiankun_name: String,
    micro_option: Option<serde_json::Value>,
    resolved_config: Option<serde_json::Value>,
) -> napi::Result<Option<String>> {
    let options: MicroOption = match micro_option {
        Some(value) => serde_json::from_value(value)
            .map_err(|e| napi::Error::from_reason(format!("Invalid microOption: {}", e)))?,
        None => MicroOption::default(),
    };

    let plugin = QiankunHtmlPlugin::new(qiankun_name, options);
    if let Some(value) = resolved_config {
        let config: ResolvedConfig = serde_json::from_value(value)
            .map_err(|e| napi::Error::from_reason(format!("Invalid resolved config: {}", e)))?;
        plugin.config_resolved(&config);
    }

    Ok(plugin.transform_index_html(&html)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Command;

    #[derive(Default)]
    struct MockServer {
        interceptors: Vec<DevResponseInterceptor>,
    }

    impl DevServer for MockServer {
        fn use_response_interceptor(&mut self, interceptor: DevResponseInterceptor) {
            self.interceptors.push(interceptor);
        }
    }

    #[test]
    fn test_config_resolved_is_write_once() {
        let plugin = QiankunHtmlPlugin::new("app1", MicroOption::default());
        assert_eq!(plugin.build_env(), BuildEnv::default());

        plugin.config_resolved(&ResolvedConfig {
            command: Command::Build,
            base: "/sub/".to_string(),
        });
        plugin.config_resolved(&ResolvedConfig {
            command: Command::Serve,
            base: "/other/".to_string(),
        });

        let env = plugin.build_env();
        assert!(env.production);
        assert_eq!(env.base, "/sub/");
    }

    #[test]
    fn test_dev_mode_requires_serve() {
        let plugin = QiankunHtmlPlugin::new("app1", MicroOption { use_dev_mode: true });
        assert!(plugin.dev_mode_active());

        plugin.config_resolved(&ResolvedConfig {
            command: Command::Build,
            base: "/".to_string(),
        });
        assert!(!plugin.dev_mode_active());
    }

    #[test]
    fn test_interceptor_sees_later_config() {
        let plugin = QiankunHtmlPlugin::new("app1", MicroOption { use_dev_mode: true });
        let mut server = MockServer::default();
        plugin.configure_server(&mut server);
        assert_eq!(server.interceptors.len(), 1);
        assert!(server.interceptors[0].is_active());

        plugin.config_resolved(&ResolvedConfig {
            command: Command::Build,
            base: "/".to_string(),
        });
        assert!(!server.interceptors[0].is_active());
    }

    #[test]
    fn test_plugin_metadata() {
        assert_eq!(QiankunHtmlPlugin::NAME, "qiankun-html-transform");
        assert_eq!(QiankunHtmlPlugin::ORDER, "post");
        assert_eq!(QiankunHtmlPlugin::ENFORCE, "post");
    }
}
