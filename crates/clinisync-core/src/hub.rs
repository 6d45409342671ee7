// ── Sync hub ──
//
// Process-wide facade over the per-type stores, the draft manager, the
// drawer stack, and the push dispatcher. Constructed once at startup and
// injected into consumers — the shared collections and subscriber sets
// outlive any single UI consumer.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;
use strum::IntoEnumIterator;

use clinisync_api::{DraftClient, ResourceClient};

use crate::cache::{JsonFileCache, LocalCache};
use crate::config::SyncConfig;
use crate::drafts::DraftManager;
use crate::drawer::DrawerStack;
use crate::error::CoreError;
use crate::model::ResourceType;
use crate::push::PushDispatcher;
use crate::store::ResourceStore;

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<HubInner>`. Owns one [`ResourceStore`] per
/// resource type, the [`DraftManager`], the [`DrawerStack`], and the
/// push-channel routing task.
#[derive(Clone)]
pub struct SyncHub {
    inner: Arc<HubInner>,
}

struct HubInner {
    config: SyncConfig,
    stores: HashMap<ResourceType, Arc<ResourceStore>>,
    drafts: DraftManager,
    drawers: Arc<DrawerStack>,
    dispatcher: Arc<PushDispatcher>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl SyncHub {
    /// Build the hub and every store. Does not start the push bridge —
    /// call [`spawn_push_bridge`](Self::spawn_push_bridge) once the
    /// transport hands over its event receiver.
    pub fn new(config: SyncConfig) -> Result<Self, CoreError> {
        let gateway = Arc::new(ResourceClient::from_api_key(
            config.base_url.as_str(),
            &config.api_key,
            &config.transport,
        )?);
        let draft_client = Arc::new(DraftClient::from_api_key(
            config.base_url.as_str(),
            &config.api_key,
            &config.transport,
        )?);
        let cache: Arc<dyn LocalCache> = Arc::new(JsonFileCache::new(&config.cache_dir));

        let mut stores = HashMap::new();
        let mut dispatcher = PushDispatcher::new();
        for resource_type in ResourceType::iter() {
            let store = Arc::new(ResourceStore::new(
                resource_type,
                Arc::clone(&gateway),
                Arc::clone(&cache),
            ));
            dispatcher.register(Arc::clone(&store));
            stores.insert(resource_type, store);
        }

        let drafts = DraftManager::new(draft_client, config.scope.clone());

        Ok(Self {
            inner: Arc::new(HubInner {
                config,
                stores,
                drafts,
                drawers: Arc::new(DrawerStack::new()),
                dispatcher: Arc::new(dispatcher),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.inner.config
    }

    /// The shared store for one resource type.
    pub fn store(&self, resource_type: ResourceType) -> Arc<ResourceStore> {
        // Every variant is registered in `new`; the map is total.
        self.inner
            .stores
            .get(&resource_type)
            .cloned()
            .unwrap_or_else(|| unreachable!("store registered for every resource type"))
    }

    pub fn drafts(&self) -> &DraftManager {
        &self.inner.drafts
    }

    pub fn drawers(&self) -> &Arc<DrawerStack> {
        &self.inner.drawers
    }

    /// Route one raw push message synchronously (useful when the
    /// transport already runs its own receive loop).
    pub fn dispatch_push(&self, raw: &serde_json::Value) {
        self.inner.dispatcher.dispatch(raw);
    }

    /// Spawn the background task draining the push channel into the
    /// dispatcher. The transport owns the sending half.
    pub async fn spawn_push_bridge(&self, rx: mpsc::UnboundedReceiver<serde_json::Value>) {
        let dispatcher = Arc::clone(&self.inner.dispatcher);
        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(dispatcher.run(rx, cancel));
        self.inner.task_handles.lock().await.push(handle);
        info!("push bridge spawned");
    }

    /// Cancel background tasks and wait for them to finish.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        info!("sync hub stopped");
    }
}

impl std::fmt::Debug for SyncHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncHub")
            .field("scope", &self.inner.config.scope)
            .field("base_url", &self.inner.config.base_url.as_str())
            .finish_non_exhaustive()
    }
}
