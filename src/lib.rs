//! # qiankun HTML transform
//!
//! Rewrites the index HTML of a Vite application so it can run as a qiankun
//! sub-application: nothing the guest ships executes until the host drives
//! its lifecycle.
//!
//! ## Document Invariants
//!
//! 1. **Entry Selection**: entry scripts are `<body> script[type=module]` and
//!    `<head> script[crossorigin=""]`, taken in document order. No entry
//!    scripts means the document is returned unchanged (`Ok(None)`).
//!
//! 2. **Deferred Import**: every entry script loses `src`, `type` and
//!    `crossorigin` and becomes `import([prefix + ]'src')`. A rewritten script
//!    never matches the entry selection again, so a second pass is a no-op.
//!
//! 3. **Single Finalizer**: only the last entry that was actually rewritten
//!    carries `.finally(() => { ... })`, which wires
//!    `window.moudleQiankunAppLifeCycles[NAME]` to `window.proxy.vite<phase>`
//!    after the guest's module code has run. Inline entries without `src` are
//!    skipped, and a page where no entry has a `src` is returned unchanged.
//!
//! 4. **Bridge Last**: the bridge snippet is appended as the final child of
//!    `<body>` and publishes `window[NAME]` with one deferred entry point per
//!    phase.
//!
//! 5. **Phase Lock-Step**: the bridge and the finalizer are both generated
//!    from `LifecyclePhase::ALL`.
//!
//! 6. **Dev-Mode Toggle**: `useDevMode` on a non-production build is the only
//!    switch for the public-path import prefix, the dev script adapter and the
//!    response interceptor.

#[cfg(feature = "napi")]
use napi_derive::napi;

mod bridge;
mod classify;
mod config;
mod dev;
mod dom;
mod error;
mod imports;
mod intercept;
mod lifecycle;
mod plugin;
mod rewrite;


pub use bridge::{BridgeError, GuestLifecycle, LifecycleBridge, LifecycleFn};
pub use classify::{
    is_entry_script, select_dev_client, select_entry_scripts, select_refresh_shim, EntryScript,
    DEV_CLIENT_PATH, REFRESH_SHIM_PATH,
};
pub use config::{normalize_base, BuildEnv, Command, MicroOption, ResolvedConfig};
pub use dev::{adapt_dev_client, adapt_refresh_shim, MODULE_BINDING};
pub use dom::{HtmlDocument, Region, ScriptElement};
pub use error::TransformError;
pub use imports::{rebind_default_import_pattern, rebind_static_imports};
pub use intercept::{rewrite_dev_client_html, DevResponseInterceptor, DevServer, ResponsePayload};
pub use lifecycle::{bridge_snippet, finalize_snippet, LifecyclePhase, LIFECYCLE_REGISTRY};
pub use plugin::QiankunHtmlPlugin;
pub use rewrite::{
    append_finalizer, dynamic_import_expr, module_to_dynamic_import, ImportPrefix,
    QIANKUN_PUBLIC_PATH_PREFIX,
};

#[cfg(feature = "napi")]
pub use intercept::rewrite_dev_response_native;
#[cfg(feature = "napi")]
pub use plugin::transform_index_html_native;

#[cfg(feature = "napi")]
#[napi]
pub fn plugin_name() -> String {
    QiankunHtmlPlugin::NAME.to_string()
}
