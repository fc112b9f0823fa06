//! Plugin configuration and the build environment captured from the host tool.

use serde::{Deserialize, Serialize};

/// Options passed alongside the sub-application name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MicroOption {
    /// Defer and base-prefix the dev server's own client scripts.
    pub use_dev_mode: bool,
}

/// Which command the build tool is running.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Command {
    Build,
    #[default]
    Serve,
}

/// The slice of the build tool's resolved configuration this plugin reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedConfig {
    #[serde(default)]
    pub command: Command,
    #[serde(default = "default_base")]
    pub base: String,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            command: Command::Serve,
            base: default_base(),
        }
    }
}

fn default_base() -> String {
    "/".to_string()
}

/// Build mode and public base path, fixed once the configuration is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildEnv {
    pub production: bool,
    pub base: String,
}

impl BuildEnv {
    pub fn from_config(config: &ResolvedConfig) -> Self {
        Self {
            production: config.command == Command::Build,
            base: normalize_base(&config.base),
        }
    }

    /// `src` the dev server gives its injected client script under this base.
    pub fn dev_client_src(&self) -> String {
        format!("{}{}", self.base, crate::classify::DEV_CLIENT_PATH)
    }
}

impl Default for BuildEnv {
    fn default() -> Self {
        Self {
            production: false,
            base: default_base(),
        }
    }
}

/// Bases are joined by plain concatenation, so they always end in `/`.
pub fn normalize_base(base: &str) -> String {
    if base.is_empty() {
        return default_base();
    }
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}
