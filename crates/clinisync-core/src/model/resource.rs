// ── Core domain types ──
//
// Resource, TenantScope, and the Tracked wrapper form the foundation of
// every store. Sync metadata lives on Tracked, never inside the domain
// payload, so rollback and reconciliation can reason about it directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use clinisync_api::ResourceRecord;

// ── ResourceType ────────────────────────────────────────────────────

/// The closed set of resource types the sync core manages.
///
/// The string form is the wire tag used in URLs, push messages, and
/// cache file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Settings,
    Appointments,
    Users,
    Treatments,
    Roles,
}

impl ResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Settings => "settings",
            Self::Appointments => "appointments",
            Self::Users => "users",
            Self::Treatments => "treatments",
            Self::Roles => "roles",
        }
    }
}

// ── TenantScope ─────────────────────────────────────────────────────

/// Tenant/location scope keys. Every read and write is implicitly
/// scoped by these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantScope {
    pub business_id: String,
    pub location_id: String,
}

impl TenantScope {
    pub fn new(business_id: impl Into<String>, location_id: impl Into<String>) -> Self {
        Self {
            business_id: business_id.into(),
            location_id: location_id.into(),
        }
    }
}

// ── Resource ────────────────────────────────────────────────────────

/// A server-managed domain entity. The payload is opaque to the sync
/// core — only identity, scope, and timestamps are interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Server-assigned identity; `None` for a purely local record that
    /// has not been confirmed yet.
    pub id: Option<String>,
    pub scope: TenantScope,
    pub data: serde_json::Value,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Resource {
    /// A new, unconfirmed resource ready for an optimistic create.
    pub fn new(scope: TenantScope, data: serde_json::Value) -> Self {
        Self {
            id: None,
            scope,
            data,
            created_at: None,
            updated_at: None,
        }
    }

    /// Convert to the wire shape for create/update requests.
    pub fn to_record(&self) -> ResourceRecord {
        ResourceRecord {
            id: self.id.clone(),
            resource_id: None,
            business_id: self.scope.business_id.clone(),
            location_id: self.scope.location_id.clone(),
            data: self.data.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<ResourceRecord> for Resource {
    fn from(record: ResourceRecord) -> Self {
        let id = record.server_id().map(str::to_owned);
        Self {
            id,
            scope: TenantScope {
                business_id: record.business_id,
                location_id: record.location_id,
            },
            data: record.data,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

// ── Sync metadata ───────────────────────────────────────────────────

/// Synchronization state of one tracked record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    /// Matches the server's view.
    Confirmed,
    /// Optimistically inserted; the create request is in flight.
    PendingCreate,
    /// Optimistically replaced; the update request is in flight.
    PendingUpdate,
    /// Marked for deletion; still visible until the delete confirms.
    PendingDelete,
}

/// A resource plus its sync bookkeeping.
///
/// `temp_id` is the client-generated identity assigned at
/// optimistic-create time and retired once the server id arrives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tracked {
    pub resource: Resource,
    pub sync_state: SyncState,
    pub temp_id: Option<Uuid>,
}

impl Tracked {
    /// A confirmed record mirroring the server.
    pub fn confirmed(resource: Resource) -> Self {
        Self {
            resource,
            sync_state: SyncState::Confirmed,
            temp_id: None,
        }
    }

    /// An optimistic insert with a fresh temp id.
    pub fn pending_create(resource: Resource) -> Self {
        Self {
            resource,
            sync_state: SyncState::PendingCreate,
            temp_id: Some(Uuid::new_v4()),
        }
    }

    /// The collection key: the server id once assigned, the temp id before.
    pub fn key(&self) -> Option<String> {
        self.resource
            .id
            .clone()
            .or_else(|| self.temp_id.map(|t| format!("tmp:{t}")))
    }

    /// True while any write for this record is in flight and unconfirmed.
    pub fn is_optimistic(&self) -> bool {
        matches!(
            self.sync_state,
            SyncState::PendingCreate | SyncState::PendingUpdate
        )
    }

    /// True while a delete is in flight (record still visible).
    pub fn is_deleting(&self) -> bool {
        self.sync_state == SyncState::PendingDelete
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scope() -> TenantScope {
        TenantScope::new("biz-1", "loc-1")
    }

    #[test]
    fn resource_type_wire_tags() {
        assert_eq!(ResourceType::Settings.as_str(), "settings");
        assert_eq!("treatments".parse::<ResourceType>().unwrap(), ResourceType::Treatments);
        assert!("invoices".parse::<ResourceType>().is_err());
    }

    #[test]
    fn pending_create_gets_temp_key() {
        let tracked = Tracked::pending_create(Resource::new(scope(), json!({})));
        let key = tracked.key().unwrap();
        assert!(key.starts_with("tmp:"));
        assert!(tracked.is_optimistic());
        assert!(!tracked.is_deleting());
    }

    #[test]
    fn server_id_wins_over_temp_id() {
        let mut tracked = Tracked::pending_create(Resource::new(scope(), json!({})));
        tracked.resource.id = Some("res-1".to_owned());
        assert_eq!(tracked.key().unwrap(), "res-1");
    }

    #[test]
    fn record_round_trip_preserves_identity() {
        let record: ResourceRecord = serde_json::from_value(json!({
            "resourceId": "res-5",
            "businessId": "biz-1",
            "locationId": "loc-1",
            "data": { "name": "Dr. Okafor" }
        }))
        .unwrap();

        let resource = Resource::from(record);
        assert_eq!(resource.id.as_deref(), Some("res-5"));
        assert_eq!(resource.to_record().id.as_deref(), Some("res-5"));
    }
}
