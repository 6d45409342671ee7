//! Client-side resource synchronization core for clinisync.
//!
//! This crate keeps a clinic-management client's resource collections
//! consistent across multiple mounted UI consumers, an unreliable remote
//! API, a persistent offline cache, and a real-time push channel
//! delivering out-of-band mutations from other clients:
//!
//! - **[`SyncHub`]** — Process-wide facade constructed once at startup:
//!   builds the gateway clients, one [`ResourceStore`] per
//!   [`ResourceType`], the [`DraftManager`], the [`DrawerStack`], and
//!   the push-channel routing task.
//!
//! - **[`ResourceStore`]** — The authoritative in-memory collection for
//!   one resource type. Optimistic writes with rollback
//!   ([`add`](ResourceStore::add) / [`update`](ResourceStore::update) /
//!   [`remove`](ResourceStore::remove)), cache fallback on the read
//!   path with a [`SourceState`] degraded flag, and reconciliation of
//!   authoritative push events ([`apply_event`](ResourceStore::apply_event)).
//!
//! - **[`ResourceStream`]** — Subscription handle vended by a store.
//!   Exposes `current()` / `latest()` / `changed()` for reactive
//!   rendering; the shared collection outlives any consumer.
//!
//! - **[`DraftManager`]** — Stages create/edit operations server-side
//!   under a session id so partial edits never leak into shared state
//!   before the user confirms.
//!
//! - **[`DrawerStack`]** — Ordered stack of modal overlay descriptors;
//!   the last element is the single active drawer.
//!
//! - **Domain model** ([`model`]) — [`Resource`] with its opaque
//!   payload, the [`Tracked`]/[`SyncState`] sync-metadata wrapper, and
//!   the [`ResourceEvent`] tagged union for push messages.

pub mod cache;
pub mod config;
pub mod drafts;
pub mod drawer;
pub mod error;
pub mod hub;
pub mod model;
pub mod push;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use cache::{JsonFileCache, LocalCache};
pub use config::SyncConfig;
pub use drafts::{DraftManager, DraftQuery};
pub use drawer::{DrawerDescriptor, DrawerStack};
pub use error::CoreError;
pub use hub::SyncHub;
pub use push::PushDispatcher;
pub use store::{ResourceStore, SourceState};
pub use stream::ResourceStream;

// Re-export model types at the crate root for ergonomics.
pub use model::{EventKind, Resource, ResourceEvent, ResourceType, SyncState, TenantScope, Tracked};
