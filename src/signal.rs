//! # Update Signal
//! Coalescing wake-up flag between the producer loops and the single
//! render loop.
//!
//! Level-triggered: once raised the flag stays raised until drained, and
//! any number of raises before a drain collapse into one pending wake-up.
//! Implemented as a mutex-guarded flag plus a [`Notify`], not a counting
//! semaphore, so wake-ups never queue.

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct UpdateSignal {
    raised: Mutex<bool>,
    notify: Notify,
}

impl UpdateSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the flag. Safe from any task; concurrent raises coalesce.
    pub fn raise(&self) {
        *self.raised.lock().expect("update signal mutex poisoned") = true;
        self.notify.notify_waiters();
    }

    /// Clear the flag, returning whether it was raised.
    pub fn drain(&self) -> bool {
        std::mem::take(&mut *self.raised.lock().expect("update signal mutex poisoned"))
    }

    /// Wait until the flag is raised or `bound` elapses. Returns `true`
    /// when woken by a raise, `false` on timeout. Does not clear the flag.
    pub async fn wait(&self, bound: Duration) -> bool {
        let raised = async {
            loop {
                // register interest before checking, so a raise between the
                // check and the await cannot be lost
                let notified = self.notify.notified();
                if *self.raised.lock().expect("update signal mutex poisoned") {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(bound, raised).await.is_ok()
    }
}
