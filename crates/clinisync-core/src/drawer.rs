// ── Drawer stack machine ──
//
// An ordered stack of overlay descriptors; the active UI surface is
// always the top of the stack. Decoupled from the resource stores — a
// drawer only references a resource by id/data, it never owns one.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// One stacked overlay.
///
/// `id` is assigned by the stack, not the caller: the current timestamp
/// in milliseconds, bumped past the previous id on collision so two
/// pushes in the same millisecond stay distinct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawerDescriptor {
    pub id: i64,
    /// Which drawer to render, e.g. `"appointment-editor"`.
    pub kind: String,
    /// Contextual data for the drawer (resource id, prefill values).
    pub data: Option<serde_json::Value>,
    /// True when the drawer edits a not-yet-committed resource.
    pub is_new: bool,
    pub opened_at: DateTime<Utc>,
}

/// Ordered stack of drawer descriptors with push-based change
/// notification.
///
/// Exactly one descriptor is active (the last element) whenever the
/// stack is non-empty; closing it reveals the previous one. No
/// confirmation step lives at this layer — that is a caller concern.
pub struct DrawerStack {
    stack: Mutex<Vec<DrawerDescriptor>>,
    last_id: AtomicI64,
    snapshot: watch::Sender<Arc<Vec<DrawerDescriptor>>>,
}

impl Default for DrawerStack {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawerStack {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            stack: Mutex::new(Vec::new()),
            last_id: AtomicI64::new(0),
            snapshot,
        }
    }

    /// Open a drawer on top of the stack; it becomes the active one.
    pub fn push(
        &self,
        kind: impl Into<String>,
        data: Option<serde_json::Value>,
        is_new: bool,
    ) -> DrawerDescriptor {
        let descriptor = DrawerDescriptor {
            id: self.next_id(),
            kind: kind.into(),
            data,
            is_new,
            opened_at: Utc::now(),
        };
        {
            let mut stack = self.lock();
            stack.push(descriptor.clone());
        }
        self.publish();
        descriptor
    }

    /// Close the active drawer unconditionally, revealing the previous
    /// one (if any).
    pub fn pop(&self) -> Option<DrawerDescriptor> {
        let popped = {
            let mut stack = self.lock();
            stack.pop()
        };
        if popped.is_some() {
            self.publish();
        }
        popped
    }

    /// Close a drawer anywhere in the stack without disturbing the
    /// relative order of the remainder. Returns `true` if it existed.
    pub fn remove(&self, id: i64) -> bool {
        let removed = {
            let mut stack = self.lock();
            let before = stack.len();
            stack.retain(|d| d.id != id);
            stack.len() != before
        };
        if removed {
            self.publish();
        }
        removed
    }

    /// Close every drawer atomically.
    pub fn clear(&self) {
        {
            let mut stack = self.lock();
            stack.clear();
        }
        self.publish();
    }

    /// The active drawer: the last element, if any.
    pub fn current(&self) -> Option<DrawerDescriptor> {
        self.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Subscribe to stack changes. Consumers re-resolve the active
    /// drawer (and its resource context) from each new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<DrawerDescriptor>>> {
        self.snapshot.subscribe()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Monotonic millisecond id, collision-tolerant: never at or below
    /// the previously issued id.
    fn next_id(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut prev = self.last_id.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self.last_id.compare_exchange_weak(
                prev,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<DrawerDescriptor>> {
        self.stack
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn publish(&self) {
        let snapshot = self.lock().clone();
        self.snapshot.send_modify(|snap| *snap = Arc::new(snapshot));
    }
}
