// ── Persistent local cache ──
//
// Read-only fallback source for the read path. Population and refresh
// of the cache are an external collaborator's responsibility; the sync
// core only ever reads from it when the remote list call fails.

use std::path::PathBuf;

use tracing::debug;

use clinisync_api::{ResourceFilters, ResourceRecord};

use crate::error::CoreError;
use crate::model::{Resource, ResourceType};

/// Durable per-resource-type fallback store surviving reloads.
pub trait LocalCache: Send + Sync {
    /// All cached records for one resource type. A type that has never
    /// been cached yields an empty collection, not an error.
    fn get_all(&self, resource_type: ResourceType) -> Result<Vec<Resource>, CoreError>;
}

/// File-backed cache: one JSON array of resource records per type,
/// at `<dir>/<resource_type>.json`.
pub struct JsonFileCache {
    dir: PathBuf,
}

impl JsonFileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LocalCache for JsonFileCache {
    fn get_all(&self, resource_type: ResourceType) -> Result<Vec<Resource>, CoreError> {
        let path = self.dir.join(format!("{resource_type}.json"));
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(?path, "no cache file for {resource_type}");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(CoreError::Cache {
                    message: format!("failed to read {}: {e}", path.display()),
                });
            }
        };

        let records: Vec<ResourceRecord> =
            serde_json::from_str(&raw).map_err(|e| CoreError::Cache {
                message: format!("malformed cache file {}: {e}", path.display()),
            })?;

        Ok(records.into_iter().map(Resource::from).collect())
    }
}

/// Apply list filters to a cached resource, mirroring the remote
/// endpoint's semantics: tenant scope plus field equality against the
/// payload's top-level fields.
pub(crate) fn matches_filters(resource: &Resource, filters: &ResourceFilters) -> bool {
    if let Some(ref business_id) = filters.business_id {
        if resource.scope.business_id != *business_id {
            return false;
        }
    }
    if let Some(ref location_id) = filters.location_id {
        if resource.scope.location_id != *location_id {
            return false;
        }
    }
    filters.fields.iter().all(|(key, expected)| {
        resource
            .data
            .get(key)
            .is_some_and(|v| match v {
                serde_json::Value::String(s) => s == expected,
                other => other.to_string() == *expected,
            })
    })
}
