#![allow(clippy::unwrap_used)]
// Integration tests for `ResourceClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clinisync_api::{Error, ResourceClient, ResourceFilters, ResourceRecord};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ResourceClient) {
    let server = MockServer::start().await;
    let client = ResourceClient::from_reqwest(&server.uri(), reqwest::Client::new()).unwrap();
    (server, client)
}

fn treatment(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "businessId": "biz-1",
        "locationId": "loc-1",
        "data": { "name": name },
        "createdAt": "2024-03-01T10:00:00Z",
        "updatedAt": "2024-03-01T10:00:00Z"
    })
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_forwards_scope_and_filters() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/resources/treatments"))
        .and(query_param("businessId", "biz-1"))
        .and(query_param("locationId", "loc-1"))
        .and(query_param("category", "hygiene"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            treatment("t-1", "Cleaning"),
            treatment("t-2", "Polish"),
        ])))
        .mount(&server)
        .await;

    let filters = ResourceFilters::scoped("biz-1", "loc-1").field("category", "hygiene");
    let records = client.list("treatments", &filters).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].server_id(), Some("t-1"));
    assert_eq!(records[1].data["name"], "Polish");
}

#[tokio::test]
async fn test_get_resource() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/resources/appointments/apt-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(treatment("apt-9", "Checkup")))
        .mount(&server)
        .await;

    let record = client.get_resource("appointments", "apt-9").await.unwrap();
    assert_eq!(record.server_id(), Some("apt-9"));
    assert_eq!(record.business_id, "biz-1");
}

#[tokio::test]
async fn test_create_returns_server_assigned_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/resources/treatments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(treatment("t-new", "Whitening")))
        .mount(&server)
        .await;

    let body: ResourceRecord = serde_json::from_value(json!({
        "businessId": "biz-1",
        "locationId": "loc-1",
        "data": { "name": "Whitening" }
    }))
    .unwrap();

    let created = client.create("treatments", &body).await.unwrap();
    assert_eq!(created.server_id(), Some("t-new"));
    assert!(created.created_at.is_some());
}

#[tokio::test]
async fn test_update_and_delete() {
    let (server, client) = setup().await;

    Mock::given(method("PUT"))
        .and(path("/api/v1/resources/settings/set-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(treatment("set-1", "Hours")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/resources/settings/set-1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let body: ResourceRecord = serde_json::from_value(json!({
        "businessId": "biz-1",
        "locationId": "loc-1",
        "data": { "name": "Hours" }
    }))
    .unwrap();

    let updated = client.update("settings", "set-1", &body).await.unwrap();
    assert_eq!(updated.server_id(), Some("set-1"));

    client.delete("settings", "set-1").await.unwrap();
}

#[tokio::test]
async fn test_search_appends_query() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/resources/users/search"))
        .and(query_param("q", "smith"))
        .and(query_param("businessId", "biz-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([treatment("u-1", "Smith")])))
        .mount(&server)
        .await;

    let filters = ResourceFilters {
        business_id: Some("biz-1".to_owned()),
        ..ResourceFilters::default()
    };
    let hits = client.search("users", "smith", &filters).await.unwrap();
    assert_eq!(hits.len(), 1);
}

// ── Error-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_api_error_envelope_is_parsed() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/resources/roles/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "role not found",
            "code": "NOT_FOUND"
        })))
        .mount(&server)
        .await;

    let err = client.get_resource("roles", "missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.api_error_code(), Some("NOT_FOUND"));
    match err {
        Error::Api { status, message, .. } => {
            assert_eq!(status, 404);
            assert_eq!(message, "role not found");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_is_transient() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/resources/settings"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client
        .list("settings", &ResourceFilters::default())
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_connection_refused_is_transient() {
    // Bind an ephemeral port, then drop the listener so connecting to it
    // is refused.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client =
        ResourceClient::from_reqwest(&format!("http://127.0.0.1:{port}"), reqwest::Client::new())
            .unwrap();

    let err = client
        .list("settings", &ResourceFilters::default())
        .await
        .unwrap_err();
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_api_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/resources/settings"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client
        .list("settings", &ResourceFilters::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidApiKey));
}
