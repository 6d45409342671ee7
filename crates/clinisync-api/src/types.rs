// Wire types for the clinisync REST API.
//
// Field names follow the server's camelCase JSON. Client-side sync
// metadata (optimistic flags, temp ids) never appears here — the server
// only ever sees the committed resource shape.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Resources ────────────────────────────────────────────────────────

/// A committed resource as the server represents it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    /// Server-assigned identity. Absent only in request bodies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Some endpoints echo the identity under `resourceId` instead of `id`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,

    pub business_id: String,
    pub location_id: String,

    /// Resource-type-specific payload, opaque to the sync core.
    #[serde(default)]
    pub data: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl ResourceRecord {
    /// The server identity of this record, whichever field carried it.
    pub fn server_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.resource_id.as_deref())
    }
}

/// Filters applied to list/search requests, serialized as query parameters.
///
/// Tenant scope is always present; additional field-equality filters are
/// forwarded verbatim (the server interprets them per resource type).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilters {
    pub business_id: Option<String>,
    pub location_id: Option<String>,
    pub fields: BTreeMap<String, String>,
}

impl ResourceFilters {
    pub fn scoped(business_id: impl Into<String>, location_id: impl Into<String>) -> Self {
        Self {
            business_id: Some(business_id.into()),
            location_id: Some(location_id.into()),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Flatten into query parameters for the list endpoint.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(2 + self.fields.len());
        if let Some(ref b) = self.business_id {
            params.push(("businessId".to_owned(), b.clone()));
        }
        if let Some(ref l) = self.location_id {
            params.push(("locationId".to_owned(), l.clone()));
        }
        for (k, v) in &self.fields {
            params.push((k.clone(), v.clone()));
        }
        params
    }
}

// ── Drafts ───────────────────────────────────────────────────────────

/// A staged, uncommitted resource held server-side against a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRecord {
    pub id: Uuid,
    pub session_id: String,
    pub resource_type: String,
    pub business_id: String,
    pub location_id: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Request body for creating or overwriting a draft.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPayload {
    pub session_id: String,
    pub resource_type: String,
    pub business_id: String,
    pub location_id: String,
    pub data: serde_json::Value,
}

// ── Error envelope ───────────────────────────────────────────────────

/// Error response shape from the API.
#[derive(Deserialize)]
pub(crate) struct ErrorResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}
