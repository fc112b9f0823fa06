//! Lifecycle snippets
//!
//! Two generated scripts share one contract and must agree on it phase by
//! phase, so both are driven by [`LifecyclePhase::ALL`]:
//!
//! - the **bridge snippet**, appended to `<body>`, creates one deferred promise
//!   per phase, hands its resolver to `window.proxy.vite<phase>` and publishes
//!   `window[NAME]` for the host to call;
//! - the **finalize snippet**, run once the last entry import settles, looks up
//!   the guest's registered lifecycles and resolves each deferred promise with
//!   a forwarder.

/// Global registry the guest bundle publishes its lifecycles under.
pub const LIFECYCLE_REGISTRY: &str = "moudleQiankunAppLifeCycles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    Bootstrap,
    Mount,
    Unmount,
    Update,
}

impl LifecyclePhase {
    pub const ALL: [LifecyclePhase; 4] = [
        LifecyclePhase::Bootstrap,
        LifecyclePhase::Mount,
        LifecyclePhase::Unmount,
        LifecyclePhase::Update,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LifecyclePhase::Bootstrap => "bootstrap",
            LifecyclePhase::Mount => "mount",
            LifecyclePhase::Unmount => "unmount",
            LifecyclePhase::Update => "update",
        }
    }

    pub fn index(self) -> usize {
        match self {
            LifecyclePhase::Bootstrap => 0,
            LifecyclePhase::Mount => 1,
            LifecyclePhase::Unmount => 2,
            LifecyclePhase::Update => 3,
        }
    }

    /// Property on `window.proxy` holding this phase's resolver.
    pub fn proxy_slot(self) -> String {
        format!("vite{}", self.name())
    }

    /// Bootstrap is called without props.
    pub fn takes_props(self) -> bool {
        !matches!(self, LifecyclePhase::Bootstrap)
    }
}

impl std::fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Inline script that defers every phase and publishes `window[qiankun_name]`.
///
/// A phase whose `window.proxy` slot is never filled stays pending forever.
pub fn bridge_snippet(qiankun_name: &str) -> String {
    let mut code = String::from(
        r#"
  const createDeffer = (hookName) => {
    const d = new Promise((resolve, reject) => {
      window.proxy && (window.proxy[`vite${hookName}`] = resolve)
    })
    return props => d.then(fn => fn(props));
  }
"#,
    );

    for phase in LifecyclePhase::ALL {
        code.push_str(&format!(
            "  const {} = createDeffer('{}');\n",
            phase.name(),
            phase.name()
        ));
    }

    let exports = LifecyclePhase::ALL
        .iter()
        .map(|p| format!("      {}", p.name()))
        .collect::<Vec<_>>()
        .join(",\n");

    code.push_str(&format!(
        r#"
  ;(global => {{
    global.qiankunName = '{name}';
    global['{name}'] = {{
{exports}
    }};
  }})(window);
"#,
        name = qiankun_name,
        exports = exports,
    ));

    code
}

/// Completion block bound to the guest's registered lifecycles.
pub fn finalize_snippet(qiankun_name: &str) -> String {
    let mut code = format!(
        "\n    const qiankunLifeCycle = window.{reg} && window.{reg}['{name}'];\n    if (qiankunLifeCycle) {{\n",
        reg = LIFECYCLE_REGISTRY,
        name = qiankun_name,
    );

    for phase in LifecyclePhase::ALL {
        let (params, args) = if phase.takes_props() {
            ("(props)", "props")
        } else {
            ("()", "")
        };
        code.push_str(&format!(
            "      window.proxy.{}({} => qiankunLifeCycle.{}({}));\n",
            phase.proxy_slot(),
            params,
            phase.name(),
            args
        ));
    }

    code.push_str("    }\n  ");
    code
}
