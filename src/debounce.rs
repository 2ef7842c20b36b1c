//! Trailing-edge debouncing on the tokio runtime.
//!
//! Each [`Debounced::call`] aborts the pending invocation (if any) and
//! schedules a new one `delay` later, so only the last call in a burst runs.
//! Calls are fire-and-forget: nothing is returned to the caller.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::trace;

/// A debounced wrapper around an action taking `A`.
///
/// Clones share the same pending slot.
pub struct Debounced<A> {
    action: Arc<dyn Fn(A) + Send + Sync>,
    delay: Duration,
    pending: Arc<Mutex<Option<JoinHandle<()>>>>,
}

/// Wrap `action` so rapid calls collapse into one, `delay` after the last.
///
/// Must be called from within a tokio runtime.
pub fn debounce<A, F>(action: F, delay: Duration) -> Debounced<A>
where
    F: Fn(A) + Send + Sync + 'static,
{
    Debounced {
        action: Arc::new(action),
        delay,
        pending: Arc::new(Mutex::new(None)),
    }
}

impl<A> Debounced<A>
where
    A: Send + 'static,
{
    /// Cancel any pending call and schedule `action(args)` after the delay.
    pub fn call(&self, args: A) {
        let action = Arc::clone(&self.action);
        let delay = self.delay;
        let task = tokio::spawn(async move {
            sleep(delay).await;
            action(args);
        });

        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = pending.replace(task) {
            if !previous.is_finished() {
                trace!("Superseding pending debounced call");
            }
            previous.abort();
        }
    }

    /// Drop the pending call without running it.
    pub fn cancel(&self) {
        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}

impl<A> Clone for Debounced<A> {
    fn clone(&self) -> Self {
        Self {
            action: Arc::clone(&self.action),
            delay: self.delay,
            pending: Arc::clone(&self.pending),
        }
    }
}

impl<A> fmt::Debug for Debounced<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Debounced")
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}
