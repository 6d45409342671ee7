// ── Ordered reactive tracked collection ──
//
// Position-preserving storage with O(1) lookups and push-based change
// notification via `watch` channels. Order matters here: reconciliation
// overwrites in place and prepends unknown records, so the collection is
// an IndexMap rather than an unordered map.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use tokio::sync::watch;

use crate::model::Tracked;

/// An ordered, reactive collection of tracked records for one resource type.
///
/// Every mutation happens as a single synchronous step under the lock,
/// bumps a version counter, and rebuilds the snapshot that subscribers
/// receive — no interleaved partial state is ever observable.
pub(crate) struct TrackedCollection {
    /// Primary storage: collection key (server id or `tmp:{uuid}`) -> record.
    records: Mutex<IndexMap<String, Arc<Tracked>>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Arc<Tracked>>>>,
}

impl TrackedCollection {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            records: Mutex::new(IndexMap::new()),
            version,
            snapshot,
        }
    }

    /// Insert or overwrite a record. An existing key keeps its position;
    /// a new key is appended. Returns `true` if the key was new.
    pub(crate) fn upsert(&self, key: String, record: Tracked) -> bool {
        let is_new = {
            let mut records = self.lock();
            records.insert(key, Arc::new(record)).is_none()
        };
        self.publish();
        is_new
    }

    /// Insert a record at the front of the collection.
    ///
    /// Used for push events addressing records this client has never
    /// seen — newest-first, matching how the remote list orders them.
    pub(crate) fn prepend(&self, key: String, record: Tracked) {
        {
            let mut records = self.lock();
            records.shift_remove(&key);
            records.shift_insert(0, key, Arc::new(record));
        }
        self.publish();
    }

    /// Replace a record under a new key, preserving its position.
    ///
    /// This is the temp-id retirement step: the optimistic `tmp:{uuid}`
    /// entry becomes the server-id entry without moving in the list.
    pub(crate) fn rekey(&self, old_key: &str, new_key: String, record: Tracked) -> bool {
        let rekeyed = {
            let mut records = self.lock();
            match records.get_index_of(old_key) {
                Some(index) => {
                    records.shift_remove(old_key);
                    // A record under the new key may already exist (the
                    // push event for our own create won the race). Drop
                    // it rather than duplicating.
                    records.shift_remove(&new_key);
                    let index = index.min(records.len());
                    records.shift_insert(index, new_key, Arc::new(record));
                    true
                }
                None => false,
            }
        };
        if rekeyed {
            self.publish();
        }
        rekeyed
    }

    /// Remove a record. Returns it if it existed; relative order of the
    /// remainder is preserved.
    pub(crate) fn remove(&self, key: &str) -> Option<Arc<Tracked>> {
        let removed = {
            let mut records = self.lock();
            records.shift_remove(key)
        };
        if removed.is_some() {
            self.publish();
        }
        removed
    }

    /// Look up a record by its collection key.
    pub(crate) fn get(&self, key: &str) -> Option<Arc<Tracked>> {
        self.lock().get(key).map(Arc::clone)
    }

    /// Replace the whole collection in one step (load results).
    pub(crate) fn replace_all(&self, items: Vec<(String, Tracked)>) {
        {
            let mut records = self.lock();
            records.clear();
            for (key, record) in items {
                records.insert(key, Arc::new(record));
            }
        }
        self.publish();
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<Tracked>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<Tracked>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn lock(&self) -> std::sync::MutexGuard<'_, IndexMap<String, Arc<Tracked>>> {
        // The lock is never held across an await point; a poisoned lock
        // still holds a structurally valid map, so recover it.
        self.records
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Rebuild the snapshot vec and broadcast to subscribers.
    fn publish(&self) {
        let values: Vec<Arc<Tracked>> = self.lock().values().map(Arc::clone).collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
        self.version.send_modify(|v| *v += 1);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Resource, TenantScope, Tracked};
    use serde_json::json;

    fn confirmed(id: &str) -> Tracked {
        let mut resource = Resource::new(TenantScope::new("biz", "loc"), json!({"n": id}));
        resource.id = Some(id.to_owned());
        Tracked::confirmed(resource)
    }

    fn keys(col: &TrackedCollection) -> Vec<String> {
        col.snapshot()
            .iter()
            .map(|r| r.key().unwrap())
            .collect()
    }

    #[test]
    fn upsert_returns_true_for_new_key() {
        let col = TrackedCollection::new();
        assert!(col.upsert("a".into(), confirmed("a")));
        assert!(!col.upsert("a".into(), confirmed("a")));
    }

    #[test]
    fn upsert_preserves_position_of_existing_key() {
        let col = TrackedCollection::new();
        col.upsert("a".into(), confirmed("a"));
        col.upsert("b".into(), confirmed("b"));
        col.upsert("c".into(), confirmed("c"));

        col.upsert("b".into(), confirmed("b"));
        assert_eq!(keys(&col), vec!["a", "b", "c"]);
    }

    #[test]
    fn prepend_puts_new_records_first() {
        let col = TrackedCollection::new();
        col.upsert("a".into(), confirmed("a"));
        col.prepend("b".into(), confirmed("b"));
        assert_eq!(keys(&col), vec!["b", "a"]);
    }

    #[test]
    fn rekey_keeps_position() {
        let col = TrackedCollection::new();
        let pending = Tracked::pending_create(Resource::new(
            TenantScope::new("biz", "loc"),
            json!({}),
        ));
        let temp_key = pending.key().unwrap();

        col.upsert("a".into(), confirmed("a"));
        col.upsert(temp_key.clone(), pending);
        col.upsert("c".into(), confirmed("c"));

        assert!(col.rekey(&temp_key, "b".into(), confirmed("b")));
        assert_eq!(keys(&col), vec!["a", "b", "c"]);
        assert!(col.get(&temp_key).is_none());
    }

    #[test]
    fn rekey_collapses_existing_target_key() {
        let col = TrackedCollection::new();
        col.upsert("tmp".into(), confirmed("tmp"));
        col.upsert("b".into(), confirmed("b"));

        assert!(col.rekey("tmp", "b".into(), confirmed("b")));
        assert_eq!(col.len(), 1);
    }

    #[test]
    fn remove_preserves_remaining_order() {
        let col = TrackedCollection::new();
        col.upsert("a".into(), confirmed("a"));
        col.upsert("b".into(), confirmed("b"));
        col.upsert("c".into(), confirmed("c"));

        assert!(col.remove("b").is_some());
        assert_eq!(keys(&col), vec!["a", "c"]);
        assert!(col.remove("b").is_none());
    }

    #[test]
    fn snapshot_reflects_replace_all() {
        let col = TrackedCollection::new();
        col.upsert("stale".into(), confirmed("stale"));

        col.replace_all(vec![
            ("a".to_owned(), confirmed("a")),
            ("b".to_owned(), confirmed("b")),
        ]);
        assert_eq!(keys(&col), vec!["a", "b"]);
    }

    #[test]
    fn subscribers_see_every_mutation() {
        let col = TrackedCollection::new();
        let rx = col.subscribe();

        col.upsert("a".into(), confirmed("a"));
        assert_eq!(rx.borrow().len(), 1);

        col.remove("a");
        assert!(rx.borrow().is_empty());
    }
}
