// ── Subscription handle ──

use std::sync::Arc;

use tokio::sync::watch;

use crate::model::Tracked;

/// Subscription handle vended by a [`ResourceStore`](crate::ResourceStore).
///
/// Wraps a `watch::Receiver` over the store's snapshot. Multiple
/// consumers hold independent handles onto one shared collection; a
/// handle outliving its consumer is dropped without affecting the store.
#[derive(Clone)]
pub struct ResourceStream {
    rx: watch::Receiver<Arc<Vec<Arc<Tracked>>>>,
}

impl ResourceStream {
    pub(crate) fn new(rx: watch::Receiver<Arc<Vec<Arc<Tracked>>>>) -> Self {
        Self { rx }
    }

    /// The current snapshot, without consuming the change notification.
    pub fn current(&self) -> Arc<Vec<Arc<Tracked>>> {
        self.rx.borrow().clone()
    }

    /// The current snapshot, marking it as seen.
    pub fn latest(&mut self) -> Arc<Vec<Arc<Tracked>>> {
        self.rx.borrow_and_update().clone()
    }

    /// Wait for the next mutation. Returns `false` once the store has
    /// been dropped and no further changes can arrive.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
