pub mod event;
pub mod resource;

pub use event::{EventKind, ResourceEvent};
pub use resource::{Resource, ResourceType, SyncState, TenantScope, Tracked};
