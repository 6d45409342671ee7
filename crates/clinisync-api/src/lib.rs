// clinisync-api: Async Rust client for the clinisync practice-management REST API

pub mod drafts;
pub mod error;
pub mod resources;
pub mod transport;
pub mod types;

pub use drafts::DraftClient;
pub use error::Error;
pub use resources::ResourceClient;
pub use transport::{TlsMode, TransportConfig};
pub use types::{DraftPayload, DraftRecord, ResourceFilters, ResourceRecord};
