//! Lifecycle Bridge Model
//!
//! Typed counterpart of the protocol the generated snippets speak at runtime.
//! Each phase is a one-shot slot:
//!
//! - the guest side fills it once its lifecycles are registered
//!   ([`LifecycleBridge::register`], the finalize snippet's job);
//! - the host side awaits it and calls through ([`LifecycleBridge::invoke`],
//!   what `window[NAME].<phase>(props)` does).
//!
//! A bridge created without a host proxy can never be filled, so its phases
//! stay pending for good. Nothing times out.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use futures::channel::oneshot;
use futures::future::{FutureExt, Shared};
use thiserror::Error;

use crate::lifecycle::LifecyclePhase;

pub type LifecycleFn<P> = Arc<dyn Fn(P) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("lifecycle slot `{0}` was dropped before it resolved")]
    Detached(LifecyclePhase),
}

/// Lifecycles a guest registers under its sub-application name.
pub trait GuestLifecycle<P>: Send + Sync + 'static {
    fn bootstrap(&self);
    fn mount(&self, props: P);
    fn unmount(&self, props: P);
    fn update(&self, props: P);
}

struct PhaseSlot<P> {
    resolver: Mutex<Option<oneshot::Sender<LifecycleFn<P>>>>,
    settled: Shared<oneshot::Receiver<LifecycleFn<P>>>,
}

impl<P> PhaseSlot<P> {
    fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            resolver: Mutex::new(Some(tx)),
            settled: rx.shared(),
        }
    }

    fn resolve(&self, f: LifecycleFn<P>) -> bool {
        match lock(&self.resolver).take() {
            Some(tx) => tx.send(f).is_ok(),
            None => false,
        }
    }

    fn is_pending(&self) -> bool {
        self.settled.clone().now_or_never().is_none()
    }
}

pub struct LifecycleBridge<P> {
    name: String,
    proxy_present: bool,
    slots: [PhaseSlot<P>; 4],
}

impl<P: 'static> LifecycleBridge<P> {
    /// Bridge for a page where the host proxy exists.
    pub fn attached(name: impl Into<String>) -> Self {
        Self::build(name.into(), true)
    }

    /// Bridge for a page loaded without a host proxy.
    pub fn detached(name: impl Into<String>) -> Self {
        Self::build(name.into(), false)
    }

    fn build(name: String, proxy_present: bool) -> Self {
        Self {
            name,
            proxy_present,
            slots: std::array::from_fn(|_| PhaseSlot::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn slot(&self, phase: LifecyclePhase) -> &PhaseSlot<P> {
        &self.slots[phase.index()]
    }

    /// Fill one phase. Returns false when detached or already filled.
    pub fn resolve<F>(&self, phase: LifecyclePhase, f: F) -> bool
    where
        F: Fn(P) + Send + Sync + 'static,
    {
        self.resolve_with(phase, Arc::new(f))
    }

    fn resolve_with(&self, phase: LifecyclePhase, f: LifecycleFn<P>) -> bool {
        if !self.proxy_present {
            return false;
        }
        self.slot(phase).resolve(f)
    }

    /// Bind every phase to the guest. Returns how many phases were filled.
    pub fn register<G: GuestLifecycle<P>>(&self, guest: G) -> usize {
        let guest = Arc::new(guest);
        let mut bound = 0;
        for phase in LifecyclePhase::ALL {
            let g = Arc::clone(&guest);
            let f: LifecycleFn<P> = match phase {
                LifecyclePhase::Bootstrap => Arc::new(move |_props: P| g.bootstrap()),
                LifecyclePhase::Mount => Arc::new(move |props: P| g.mount(props)),
                LifecyclePhase::Unmount => Arc::new(move |props: P| g.unmount(props)),
                LifecyclePhase::Update => Arc::new(move |props: P| g.update(props)),
            };
            if self.resolve_with(phase, f) {
                bound += 1;
            }
        }
        bound
    }

    pub fn is_pending(&self, phase: LifecyclePhase) -> bool {
        self.slot(phase).is_pending()
    }

    /// Wait for `phase` to be filled, then call it with `props`.
    pub fn invoke(
        &self,
        phase: LifecyclePhase,
        props: P,
    ) -> impl Future<Output = Result<(), BridgeError>> {
        let settled = self.slot(phase).settled.clone();
        async move {
            let f = settled.await.map_err(|_| BridgeError::Detached(phase))?;
            f(props);
            Ok(())
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
