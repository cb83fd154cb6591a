//! Listener registry with identity-based set semantics.
//!
//! Listeners may be added or removed from any thread, including from inside a
//! listener callback while a tick is dispatching. Dispatch iterates over a
//! snapshot taken under the lock, so the lock is never held while user code
//! runs.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::SolarError;
use crate::events::{SolarEvent, SolarEventKind};

/// Receives sunrise and sunset notifications.
///
/// Returning an error (or panicking) only affects this listener: the event is
/// still delivered to every other registered listener and the failure is
/// reported through the logger.
pub trait SolarEventListener: Send + Sync {
    fn on_sunrise(&self, event: &SolarEvent) -> anyhow::Result<()>;

    fn on_sunset(&self, event: &SolarEvent) -> anyhow::Result<()>;

    /// Name used in diagnostics.
    fn name(&self) -> &str {
        "listener"
    }
}

/// Shared handle to a registered listener; identity is the allocation.
pub type ListenerHandle = Arc<dyn SolarEventListener>;

#[derive(Default)]
pub struct ListenerRegistry {
    listeners: Mutex<Vec<ListenerHandle>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Returns `false` if that same handle was already present.
    pub fn add(&self, listener: ListenerHandle) -> bool {
        let mut listeners = self.lock();
        if listeners.iter().any(|l| same_listener(l, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    /// Unregister a listener. Returns `false` if it was not registered.
    pub fn remove(&self, listener: &ListenerHandle) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|l| !same_listener(l, listener));
        listeners.len() != before
    }

    pub fn contains(&self, listener: &ListenerHandle) -> bool {
        self.lock().iter().any(|l| same_listener(l, listener))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Deliver `event` to every listener registered at the time of the call.
    ///
    /// Returns the failures; each one has already been logged.
    pub fn notify(&self, event: &SolarEvent) -> Vec<SolarError> {
        let snapshot: Vec<ListenerHandle> = self.lock().clone();
        let mut failures = Vec::new();

        for listener in snapshot {
            let outcome = catch_unwind(AssertUnwindSafe(|| match event.kind() {
                SolarEventKind::Sunrise => listener.on_sunrise(event),
                SolarEventKind::Sunset => listener.on_sunset(event),
            }));

            let reason = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => format!("{e:#}"),
                Err(panic) => panic_message(panic.as_ref()),
            };

            log_warning!(
                "Listener '{}' failed handling {}: {}",
                listener.name(),
                event.kind(),
                reason
            );
            failures.push(SolarError::Listener {
                listener: listener.name().to_string(),
                kind: event.kind(),
                reason,
            });
        }

        failures
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ListenerHandle>> {
        // A panicking listener never runs under this lock, so the data is intact
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn same_listener(a: &ListenerHandle, b: &ListenerHandle) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}
