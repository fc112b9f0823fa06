//! Dynamic-Import Rewriter
//!
//! Turns `<script type="module" src="X">` into an inert inline script whose
//! body is `import('X')`, so nothing runs until the page's loader evaluates it.

use tracing::{debug, warn};

use crate::dom::ScriptElement;
use crate::lifecycle::finalize_snippet;

/// Resolves the guest's own files against the host-injected public path.
///
/// The host rewrites the public path one directory too deep for the guest's
/// base, hence the `..`.
pub const QIANKUN_PUBLIC_PATH_PREFIX: &str =
    "(window.proxy ? (window.proxy.__INJECTED_PUBLIC_PATH_BY_QIANKUN__ + '..') : '') + ";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportPrefix {
    #[default]
    None,
    QiankunPublicPath,
}

impl ImportPrefix {
    pub fn for_dev_mode(active: bool) -> Self {
        if active {
            ImportPrefix::QiankunPublicPath
        } else {
            ImportPrefix::None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ImportPrefix::None => "",
            ImportPrefix::QiankunPublicPath => QIANKUN_PUBLIC_PATH_PREFIX,
        }
    }
}

/// `import(PREFIX'src')`, with `src` kept verbatim inside single quotes.
pub fn dynamic_import_expr(src: &str, prefix: ImportPrefix) -> String {
    format!("import({}'{}')", prefix.as_str(), escape_single_quoted(src))
}

/// Rewrite `script` in place and hand back a handle to the same element.
///
/// `src`, `type` and `crossorigin` are dropped: the element becomes a plain
/// inline script the build tool and the classifier both ignore. A script
/// without `src` is left alone.
pub fn module_to_dynamic_import(
    script: &ScriptElement,
    prefix: ImportPrefix,
) -> Option<ScriptElement> {
    let Some(src) = script.attr("src") else {
        warn!(target: "qiankun_html", ?script, "module script without src left untouched");
        return None;
    };

    script.remove_attr("src");
    script.remove_attr("type");
    script.remove_attr("crossorigin");
    script.set_text(&dynamic_import_expr(&src, prefix));

    debug!(target: "qiankun_html", %src, ?prefix, "deferred module script");
    Some(script.clone())
}

/// Chain the lifecycle wiring onto an already rewritten import.
pub fn append_finalizer(script: &ScriptElement, qiankun_name: &str) {
    let expr = script.text();
    script.set_text(&format!(
        "{}.finally(() => {{{}}})",
        expr,
        finalize_snippet(qiankun_name)
    ));
}

fn escape_single_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
