//! Dev-Mode Script Adapter
//!
//! Brings the dev server's own scripts under the same deferred loading as
//! the entry scripts: the injected client and the hot-reload shim.

use tracing::debug;

use crate::classify::{select_dev_client, select_refresh_shim, REFRESH_SHIM_PATH};
use crate::config::BuildEnv;
use crate::dom::{HtmlDocument, ScriptElement};
use crate::imports::rebind_static_imports;
use crate::rewrite::{module_to_dynamic_import, ImportPrefix};

/// Name the continuation gives the dynamically imported shim module.
pub const MODULE_BINDING: &str = "mod";

/// Defer `<script type="module" src="<base>@vite/client">`.
pub fn adapt_dev_client(
    doc: &HtmlDocument,
    env: &BuildEnv,
    prefix: ImportPrefix,
) -> Option<ScriptElement> {
    let client = select_dev_client(doc, &env.dev_client_src())?;
    module_to_dynamic_import(&client, prefix)
}

/// Defer the refresh shim and replay its inline body once the import settles.
pub fn adapt_refresh_shim(doc: &HtmlDocument, prefix: ImportPrefix) -> Option<ScriptElement> {
    let shim = select_refresh_shim(doc)?;

    let content = shim.text();
    shim.set_text("");
    shim.set_attr("src", REFRESH_SHIM_PATH);

    let script = module_to_dynamic_import(&shim, prefix)?;
    let body = rebind_static_imports(&content, REFRESH_SHIM_PATH, MODULE_BINDING);
    script.set_text(&format!(
        "{}.then(({}) => {{\n{}\n}})",
        script.text(),
        MODULE_BINDING,
        body.trim()
    ));

    debug!(target: "qiankun_html", "deferred refresh shim");
    Some(script)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFRESH_PREAMBLE: &str = r#"<script type="module">
import RefreshRuntime from "/@react-refresh"
RefreshRuntime.injectIntoGlobalHook(window)
window.$RefreshReg$ = () => {}
window.__vite_plugin_react_preamble_installed__ = true
</script>"#;

    #[test]
    fn test_refresh_shim_continuation() {
        let html = format!("<html><head>{}</head><body></body></html>", REFRESH_PREAMBLE);
        let doc = HtmlDocument::parse(&html).unwrap();
        let script = adapt_refresh_shim(&doc, ImportPrefix::None).unwrap();

        assert!(!script.has_attr("src"));
        assert!(!script.is_module());
        assert_eq!(
            script.text(),
            "import('/@react-refresh').then((mod) => {\nconst RefreshRuntime = mod.default;\nRefreshRuntime.injectIntoGlobalHook(window)\nwindow.$RefreshReg$ = () => {}\nwindow.__vite_plugin_react_preamble_installed__ = true\n})"
        );
    }

    #[test]
    fn test_dev_client_keeps_base() {
        let html = r#"<html><head><script type="module" src="/sub/@vite/client"></script></head><body></body></html>"#;
        let doc = HtmlDocument::parse(html).unwrap();
        let env = BuildEnv {
            production: false,
            base: "/sub/".to_string(),
        };
        let script = adapt_dev_client(&doc, &env, ImportPrefix::QiankunPublicPath).unwrap();
        assert!(script.text().ends_with("+ '/sub/@vite/client')"));
    }

    #[test]
    fn test_absent_dev_scripts() {
        let doc = HtmlDocument::parse("<html><head></head><body></body></html>").unwrap();
        assert!(adapt_dev_client(&doc, &BuildEnv::default(), ImportPrefix::None).is_none());
        assert!(adapt_refresh_shim(&doc, ImportPrefix::None).is_none());
    }
}
