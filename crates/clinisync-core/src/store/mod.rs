// ── Resource store ──
//
// One store per resource type: the authoritative in-memory collection,
// optimistic-write bookkeeping, cache fallback on the read path, and
// reconciliation of push-channel events. Shared process-wide — every UI
// consumer reads and writes through the same instance.

pub(crate) mod collection;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use clinisync_api::{ResourceClient, ResourceFilters};

use crate::cache::{LocalCache, matches_filters};
use crate::error::CoreError;
use crate::model::{EventKind, Resource, ResourceEvent, ResourceType, SyncState, Tracked};
use crate::stream::ResourceStream;

use collection::TrackedCollection;

// ── SourceState ──────────────────────────────────────────────────────

/// Where the collection's data last came from.
///
/// `CachedFallback` is the degraded mode: the remote list failed and the
/// store is serving the persistent local cache. Informational only — the
/// read path never fails because of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceState {
    Live,
    CachedFallback,
}

// ── ResourceStore ────────────────────────────────────────────────────

/// Shared synchronization state for one resource type.
///
/// All mutations to the collection go through this type's methods and
/// apply as single synchronous steps; subscribers are notified after
/// each one and never observe partial state.
pub struct ResourceStore {
    resource_type: ResourceType,
    gateway: Arc<ResourceClient>,
    cache: Arc<dyn LocalCache>,
    collection: TrackedCollection,
    source_state: watch::Sender<SourceState>,
}

impl ResourceStore {
    pub fn new(
        resource_type: ResourceType,
        gateway: Arc<ResourceClient>,
        cache: Arc<dyn LocalCache>,
    ) -> Self {
        let (source_state, _) = watch::channel(SourceState::Live);
        Self {
            resource_type,
            gateway,
            cache,
            collection: TrackedCollection::new(),
            source_state,
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        self.resource_type
    }

    // ── Read path ────────────────────────────────────────────────────

    /// Fetch the collection from the remote gateway, replacing the
    /// in-memory state.
    ///
    /// A transient remote failure falls back to the persistent local
    /// cache filtered equivalently, and flips [`SourceState`] to
    /// `CachedFallback` — consumers see cached data plus an informational
    /// flag, never an error. Non-transient failures (bad request, auth)
    /// propagate.
    pub async fn load(
        &self,
        filters: &ResourceFilters,
    ) -> Result<Arc<Vec<Arc<Tracked>>>, CoreError> {
        match self.gateway.list(self.resource_type.as_str(), filters).await {
            Ok(records) => {
                let items = records
                    .into_iter()
                    .map(Resource::from)
                    .filter_map(|r| {
                        let key = r.id.clone()?;
                        Some((key, Tracked::confirmed(r)))
                    })
                    .collect();
                self.collection.replace_all(items);
                let _ = self.source_state.send(SourceState::Live);
                Ok(self.collection.snapshot())
            }
            Err(e) if e.is_transient() => {
                warn!(
                    resource_type = %self.resource_type,
                    error = %e,
                    "remote list failed, serving local cache"
                );
                let cached = self.cache.get_all(self.resource_type)?;
                let items = cached
                    .into_iter()
                    .filter(|r| matches_filters(r, filters))
                    .filter_map(|r| {
                        let key = r.id.clone()?;
                        Some((key, Tracked::confirmed(r)))
                    })
                    .collect();
                self.collection.replace_all(items);
                let _ = self.source_state.send(SourceState::CachedFallback);
                Ok(self.collection.snapshot())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Look up a record in the in-memory collection. Never fetches.
    pub fn get_by_id(&self, id: &str) -> Option<Arc<Tracked>> {
        self.collection.get(id)
    }

    /// The current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<Arc<Tracked>>> {
        self.collection.snapshot()
    }

    /// Subscribe to collection changes.
    pub fn subscribe(&self) -> ResourceStream {
        ResourceStream::new(self.collection.subscribe())
    }

    /// Observe the degraded-mode flag.
    pub fn source_state(&self) -> watch::Receiver<SourceState> {
        self.source_state.subscribe()
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    // ── Write path ───────────────────────────────────────────────────

    /// Create a resource.
    ///
    /// Optimistically inserts a `PendingCreate` record under a temp id
    /// for instant visibility, then issues the remote create. On success
    /// the temp record is replaced in place by the server-confirmed one;
    /// on failure it is removed and the error propagated.
    pub async fn add(&self, resource: Resource) -> Result<Arc<Tracked>, CoreError> {
        let optimistic = Tracked::pending_create(resource.clone());
        let temp_key = optimistic
            .key()
            .ok_or_else(|| CoreError::InvalidResponse {
                message: "optimistic record without a key".to_owned(),
            })?;
        self.collection.upsert(temp_key.clone(), optimistic);

        let result = self
            .gateway
            .create(self.resource_type.as_str(), &resource.to_record())
            .await;

        match result {
            Ok(record) => {
                let confirmed = Tracked::confirmed(Resource::from(record));
                let Some(server_key) = confirmed.key() else {
                    self.collection.remove(&temp_key);
                    return Err(CoreError::InvalidResponse {
                        message: "create response missing server id".to_owned(),
                    });
                };
                // The push event for our own create may have landed first
                // and inserted the server-keyed record already; rekey
                // collapses the two into one either way.
                if !self.collection.rekey(&temp_key, server_key.clone(), confirmed.clone()) {
                    self.collection.upsert(server_key.clone(), confirmed);
                }
                self.collection
                    .get(&server_key)
                    .ok_or_else(|| CoreError::InvalidResponse {
                        message: "confirmed record vanished during reconciliation".to_owned(),
                    })
            }
            Err(e) => {
                self.collection.remove(&temp_key);
                Err(e.into())
            }
        }
    }

    /// Update a resource in place.
    ///
    /// The existing record is immediately replaced by a `PendingUpdate`
    /// version for instant UI feedback, then the remote update is
    /// issued. On success the optimistic record is replaced by the
    /// server-confirmed one; on failure the pre-mutation record is
    /// restored and the error propagated — the optimistic value is never
    /// silently kept.
    pub async fn update(&self, id: &str, resource: Resource) -> Result<Arc<Tracked>, CoreError> {
        let prior = self
            .collection
            .get(id)
            .ok_or_else(|| CoreError::NotFound {
                resource_type: self.resource_type,
                id: id.to_owned(),
            })?;

        let mut staged = resource;
        staged.id = Some(id.to_owned());
        staged.created_at = staged.created_at.or(prior.resource.created_at);
        let optimistic = Tracked {
            resource: staged.clone(),
            sync_state: SyncState::PendingUpdate,
            temp_id: None,
        };
        self.collection.upsert(id.to_owned(), optimistic);

        let result = self
            .gateway
            .update(self.resource_type.as_str(), id, &staged.to_record())
            .await;

        match result {
            Ok(record) => {
                let confirmed = Tracked::confirmed(Resource::from(record));
                // A push "deleted" event may have removed the record while
                // the update was in flight; the push channel is
                // authoritative, so do not resurrect it.
                if self.collection.get(id).is_some() {
                    self.collection.upsert(id.to_owned(), confirmed.clone());
                }
                Ok(Arc::new(confirmed))
            }
            Err(e) => {
                // Roll back only if our optimistic record is still what
                // the collection holds — a push event arriving mid-flight
                // is authoritative and must not be clobbered.
                if self
                    .collection
                    .get(id)
                    .is_some_and(|cur| cur.sync_state == SyncState::PendingUpdate)
                {
                    self.collection.upsert(id.to_owned(), prior.as_ref().clone());
                }
                Err(e.into())
            }
        }
    }

    /// Delete a resource.
    ///
    /// Marks the record `PendingDelete` in place (it stays visible,
    /// typically struck through), then issues the remote delete. On
    /// success the record is removed; on failure the prior sync state is
    /// restored and the error propagated.
    pub async fn remove(&self, id: &str) -> Result<(), CoreError> {
        let prior = self
            .collection
            .get(id)
            .ok_or_else(|| CoreError::NotFound {
                resource_type: self.resource_type,
                id: id.to_owned(),
            })?;

        let marked = Tracked {
            resource: prior.resource.clone(),
            sync_state: SyncState::PendingDelete,
            temp_id: prior.temp_id,
        };
        self.collection.upsert(id.to_owned(), marked);

        match self.gateway.delete(self.resource_type.as_str(), id).await {
            Ok(()) => {
                self.collection.remove(id);
                Ok(())
            }
            Err(e) => {
                if self
                    .collection
                    .get(id)
                    .is_some_and(|cur| cur.sync_state == SyncState::PendingDelete)
                {
                    self.collection.upsert(id.to_owned(), prior.as_ref().clone());
                }
                Err(e.into())
            }
        }
    }

    /// Surface an externally committed resource — a committed draft —
    /// through the collection, as if its create had just confirmed.
    pub fn insert_confirmed(&self, resource: Resource) -> Result<Arc<Tracked>, CoreError> {
        let confirmed = Tracked::confirmed(resource);
        let Some(key) = confirmed.key() else {
            return Err(CoreError::InvalidResponse {
                message: "confirmed resource missing server id".to_owned(),
            });
        };
        if self.collection.get(&key).is_some() {
            self.collection.upsert(key.clone(), confirmed);
        } else {
            self.collection.prepend(key.clone(), confirmed);
        }
        self.collection
            .get(&key)
            .ok_or_else(|| CoreError::InvalidResponse {
                message: "confirmed record vanished during insert".to_owned(),
            })
    }

    // ── Reconciliation ───────────────────────────────────────────────

    /// Apply an authoritative push-channel event.
    ///
    /// Server events always win over local optimistic state, including
    /// echoes of this client's own writes — the resulting record is
    /// `Confirmed`, so re-applying the same event is idempotent.
    pub fn apply_event(&self, event: &ResourceEvent) {
        if event.resource_type != self.resource_type {
            debug!(
                store = %self.resource_type,
                event_type = %event.resource_type,
                "ignoring event for foreign resource type"
            );
            return;
        }

        let Some(id) = event.payload.id.clone() else {
            debug!(resource_type = %self.resource_type, "dropping event without id");
            return;
        };

        match event.kind {
            EventKind::Created | EventKind::Updated => {
                let confirmed = Tracked::confirmed(event.payload.clone());
                if self.collection.get(&id).is_some() {
                    // Overwrite in place, preserving position. Clears any
                    // optimistic or deleting state for this id.
                    self.collection.upsert(id, confirmed);
                } else {
                    self.collection.prepend(id, confirmed);
                }
            }
            EventKind::Deleted => {
                // Unconditional: deletions initiated by other clients
                // arrive for records never marked PendingDelete locally.
                self.collection.remove(&id);
            }
        }
    }
}
