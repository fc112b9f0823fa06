//! Static Import Rebinder
//!
//! The refresh shim's inline body starts with a static import of the shim
//! module. Once the body runs inside `.then((mod) => { ... })`, that import has
//! to become a binding on `mod`:
//!
//! ```text
//! import RefreshRuntime from "/@react-refresh"   ->  const RefreshRuntime = mod.default;
//! import * as ns from "/@react-refresh"          ->  const ns = mod;
//! import { a, b as c } from "/@react-refresh"    ->  const { a, b: c } = mod;
//! import "/@react-refresh"                       ->  (removed)
//! ```
//!
//! Imports of any other module are kept verbatim. If the body does not parse,
//! the single `import X from "..."` shape is rewritten textually.

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::{ImportDeclarationSpecifier, ModuleExportName, Statement};
use oxc_parser::Parser;
use oxc_span::SourceType;
use regex::Regex;
use tracing::{debug, warn};

lazy_static! {
    static ref DEFAULT_IMPORT_RE: Regex = Regex::new(r#"import (\w+) from "(.*)""#).unwrap();
}

/// Rewrite static imports of `module_path` in `code` into bindings on `binding`.
pub fn rebind_static_imports(code: &str, module_path: &str, binding: &str) -> String {
    let allocator = Allocator::default();
    let source_type = SourceType::default().with_module(true);
    let ret = Parser::new(&allocator, code, source_type).parse();

    if ret.panicked || !ret.errors.is_empty() {
        warn!(
            target: "qiankun_html",
            errors = ret.errors.len(),
            "shim body did not parse, falling back to pattern rewrite"
        );
        return rebind_default_import_pattern(code, binding);
    }

    let mut replacements: Vec<(u32, u32, String)> = Vec::new();
    for stmt in &ret.program.body {
        let Statement::ImportDeclaration(import_decl) = stmt else {
            continue;
        };

        let source = import_decl.source.value.to_string();
        if !imports_module(&source, module_path) {
            warn!(target: "qiankun_html", %source, "import in shim body left as-is");
            continue;
        }

        let mut declarations = Vec::new();
        let mut named = Vec::new();
        if let Some(specifiers) = &import_decl.specifiers {
            for specifier in specifiers {
                match specifier {
                    ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                        declarations.push(format!("const {} = {}.default;", s.local.name, binding));
                    }
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                        declarations.push(format!("const {} = {};", s.local.name, binding));
                    }
                    ImportDeclarationSpecifier::ImportSpecifier(s) => {
                        named.push(destructure_entry(&s.imported, &s.local.name.to_string()));
                    }
                }
            }
        }
        if !named.is_empty() {
            declarations.push(format!("const {{ {} }} = {};", named.join(", "), binding));
        }

        debug!(target: "qiankun_html", %source, bindings = declarations.len(), "rebound shim import");
        replacements.push((
            import_decl.span.start,
            import_decl.span.end,
            declarations.join("\n"),
        ));
    }

    apply_replacements(code, replacements)
}

/// Textual fallback: only `import NAME from "PATH"` is recognized.
pub fn rebind_default_import_pattern(code: &str, binding: &str) -> String {
    let replacement = format!("const $1 = {}.default", binding);
    DEFAULT_IMPORT_RE
        .replace(code, replacement.as_str())
        .to_string()
}

/// The shim may be imported through the configured base (`/sub/@react-refresh`).
fn imports_module(source: &str, module_path: &str) -> bool {
    source == module_path || source.ends_with(module_path)
}

fn destructure_entry(imported: &ModuleExportName, local: &str) -> String {
    let imported_name = match imported {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(s) => {
            serde_json::Value::from(s.value.to_string()).to_string()
        }
        _ => local.to_string(),
    };

    if imported_name == local {
        imported_name
    } else {
        format!("{}: {}", imported_name, local)
    }
}

fn apply_replacements(code: &str, mut replacements: Vec<(u32, u32, String)>) -> String {
    replacements.sort_by(|a, b| b.0.cmp(&a.0));
    let mut result = code.to_string();
    for (start, end, text) in replacements {
        result.replace_range(start as usize..end as usize, &text);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHIM: &str = "/@react-refresh";

    #[test]
    fn test_default_import() {
        let code = "import RefreshRuntime from \"/@react-refresh\"\nRefreshRuntime.injectIntoGlobalHook(window)";
        let out = rebind_static_imports(code, SHIM, "mod");
        assert_eq!(
            out,
            "const RefreshRuntime = mod.default;\nRefreshRuntime.injectIntoGlobalHook(window)"
        );
    }

    #[test]
    fn test_import_through_base() {
        let code = "import RefreshRuntime from '/sub/@react-refresh';\nRefreshRuntime.x()";
        let out = rebind_static_imports(code, SHIM, "mod");
        assert!(out.starts_with("const RefreshRuntime = mod.default;\n"));
    }

    #[test]
    fn test_named_and_namespace_imports() {
        let code = "import Runtime, { inject, register as reg } from \"/@react-refresh\";\nimport * as all from \"/@react-refresh\";\ninject(reg, all)";
        let out = rebind_static_imports(code, SHIM, "mod");
        assert!(out.contains("const Runtime = mod.default;\nconst { inject, register: reg } = mod;"));
        assert!(out.contains("const all = mod;"));
        assert!(out.ends_with("inject(reg, all)"));
    }

    #[test]
    fn test_side_effect_import_removed() {
        let code = "import \"/@react-refresh\";\nwindow.ready = true";
        let out = rebind_static_imports(code, SHIM, "mod");
        assert_eq!(out, "\nwindow.ready = true");
    }

    #[test]
    fn test_other_imports_untouched() {
        let code = "import other from \"/other.js\"\nother()";
        assert_eq!(rebind_static_imports(code, SHIM, "mod"), code);
    }

    #[test]
    fn test_unparsable_body_uses_pattern() {
        let code = "import RefreshRuntime from \"/@react-refresh\"\nRefreshRuntime.x(";
        let out = rebind_default_import_pattern(code, "mod");
        assert_eq!(out, "const RefreshRuntime = mod.default\nRefreshRuntime.x(");
        assert_eq!(rebind_static_imports(code, SHIM, "mod"), out);
    }
}
