// ── Push-channel events ──
//
// The wire message is `{ "type": "resource_*", "resourceType": "...",
// "data": {...} }`. Parsing is tolerant: anything unroutable yields
// `None` and is dropped by the dispatcher, never an error.

use serde::Deserialize;
use strum::{Display, EnumString};

use clinisync_api::ResourceRecord;

use super::resource::{Resource, ResourceType};

/// Mutation kind carried by a push message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum EventKind {
    #[strum(serialize = "resource_created")]
    Created,
    #[strum(serialize = "resource_updated")]
    Updated,
    #[strum(serialize = "resource_deleted")]
    Deleted,
}

/// An authoritative mutation delivered out-of-band by another client or
/// session. Reconciliation applies these over any local optimistic state.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceEvent {
    pub kind: EventKind,
    pub resource_type: ResourceType,
    pub payload: Resource,
}

/// Raw wire shape, before the tags are validated.
#[derive(Deserialize)]
struct RawPushMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(rename = "resourceType")]
    resource_type: String,
    data: ResourceRecord,
}

impl ResourceEvent {
    /// Parse a raw push message into a routable event.
    ///
    /// Returns `None` for unknown event types, unknown resource types,
    /// malformed bodies, or payloads missing a server id.
    pub fn parse(raw: &serde_json::Value) -> Option<Self> {
        let msg: RawPushMessage = serde_json::from_value(raw.clone()).ok()?;
        let kind: EventKind = msg.kind.parse().ok()?;
        let resource_type: ResourceType = msg.resource_type.parse().ok()?;

        // Every event addresses a committed record; no id means there is
        // nothing to locate or remove.
        msg.data.server_id()?;

        Some(Self {
            kind,
            resource_type,
            payload: Resource::from(msg.data),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(kind: &str, resource_type: &str) -> serde_json::Value {
        json!({
            "type": kind,
            "resourceType": resource_type,
            "data": {
                "id": "res-1",
                "businessId": "biz-1",
                "locationId": "loc-1",
                "data": { "name": "Cleaning" }
            }
        })
    }

    #[test]
    fn parses_all_three_kinds() {
        for (tag, kind) in [
            ("resource_created", EventKind::Created),
            ("resource_updated", EventKind::Updated),
            ("resource_deleted", EventKind::Deleted),
        ] {
            let event = ResourceEvent::parse(&raw(tag, "treatments")).unwrap();
            assert_eq!(event.kind, kind);
            assert_eq!(event.resource_type, ResourceType::Treatments);
            assert_eq!(event.payload.id.as_deref(), Some("res-1"));
        }
    }

    #[test]
    fn unknown_type_tag_is_unroutable() {
        assert!(ResourceEvent::parse(&raw("resource_archived", "treatments")).is_none());
    }

    #[test]
    fn unknown_resource_type_is_unroutable() {
        assert!(ResourceEvent::parse(&raw("resource_created", "invoices")).is_none());
    }

    #[test]
    fn payload_without_id_is_unroutable() {
        let msg = json!({
            "type": "resource_created",
            "resourceType": "users",
            "data": { "businessId": "b", "locationId": "l" }
        });
        assert!(ResourceEvent::parse(&msg).is_none());
    }

    #[test]
    fn malformed_body_is_unroutable() {
        assert!(ResourceEvent::parse(&json!("not an object")).is_none());
        assert!(ResourceEvent::parse(&json!({ "type": "resource_created" })).is_none());
    }
}
