// ── Push-channel dispatcher ──
//
// Routes server-pushed mutation events to the store registered for
// their resource type. The transport delivering the raw JSON values is
// an external collaborator; this layer only parses and routes.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::model::{ResourceEvent, ResourceType};
use crate::store::ResourceStore;

/// Registration map from resource type to its store.
///
/// Malformed or unroutable messages are dropped with a log line — no
/// error ever propagates into the event loop.
#[derive(Default)]
pub struct PushDispatcher {
    routes: HashMap<ResourceType, Arc<ResourceStore>>,
}

impl PushDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a store as the handler for its resource type.
    /// Re-registering a type replaces the previous handler.
    pub fn register(&mut self, store: Arc<ResourceStore>) {
        self.routes.insert(store.resource_type(), store);
    }

    /// Parse and route one raw push message.
    pub fn dispatch(&self, raw: &serde_json::Value) {
        let Some(event) = ResourceEvent::parse(raw) else {
            debug!("dropping malformed or unroutable push message");
            return;
        };
        match self.routes.get(&event.resource_type) {
            Some(store) => store.apply_event(&event),
            None => {
                debug!(
                    resource_type = %event.resource_type,
                    "no store registered for push event"
                );
            }
        }
    }

    /// Drain the push channel until it closes or the token cancels.
    pub async fn run(
        self: Arc<Self>,
        mut rx: mpsc::UnboundedReceiver<serde_json::Value>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                msg = rx.recv() => {
                    match msg {
                        Some(raw) => self.dispatch(&raw),
                        None => break,
                    }
                }
            }
        }
        debug!("push dispatcher stopped");
    }
}
