use thiserror::Error;

use crate::model::ResourceType;

/// Top-level error type for the `clinisync-core` crate.
///
/// Write failures surface here for the UI layer to handle; read-path
/// failures are absorbed by the cache fallback and never reach callers
/// as errors (see `ResourceStore::load`).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Remote gateway error.
    #[error(transparent)]
    Api(#[from] clinisync_api::Error),

    /// Payload rejected before any network call. Never mutates shared state.
    #[error("Validation failed: {message}")]
    Validation { message: String },

    /// The record is not present in the in-memory collection.
    #[error("No {resource_type} record with id {id}")]
    NotFound {
        resource_type: ResourceType,
        id: String,
    },

    /// The server response was missing data the sync core depends on.
    #[error("Invalid server response: {message}")]
    InvalidResponse { message: String },

    /// The persistent local cache could not be read.
    #[error("Local cache error: {message}")]
    Cache { message: String },
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
