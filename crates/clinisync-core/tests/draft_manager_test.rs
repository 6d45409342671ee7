#![allow(clippy::unwrap_used)]
// Integration tests for the draft lifecycle: stage, overwrite, commit
// into the owning store, cancel, and recovery listing.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clinisync_api::{DraftClient, ResourceClient};
use clinisync_core::{
    CoreError, DraftManager, DraftQuery, JsonFileCache, ResourceStore, ResourceType, SyncState,
    TenantScope,
};

struct Fixture {
    server: MockServer,
    manager: DraftManager,
    store: Arc<ResourceStore>,
    _cache_dir: tempfile::TempDir,
}

async fn setup() -> Fixture {
    let server = MockServer::start().await;
    let draft_client =
        Arc::new(DraftClient::from_reqwest(&server.uri(), reqwest::Client::new()).expect("client"));
    let manager = DraftManager::new(draft_client, TenantScope::new("biz-1", "loc-1"));

    let gateway = Arc::new(
        ResourceClient::from_reqwest(&server.uri(), reqwest::Client::new()).expect("client"),
    );
    let cache_dir = tempfile::tempdir().expect("tempdir");
    let cache = Arc::new(JsonFileCache::new(cache_dir.path()));
    let store = Arc::new(ResourceStore::new(ResourceType::Settings, gateway, cache));

    Fixture {
        server,
        manager,
        store,
        _cache_dir: cache_dir,
    }
}

fn draft_body(id: &Uuid) -> serde_json::Value {
    json!({
        "id": id,
        "sessionId": "sess-1",
        "resourceType": "settings",
        "businessId": "biz-1",
        "locationId": "loc-1",
        "data": { "days": ["mon"] }
    })
}

#[tokio::test]
async fn draft_lifecycle_stays_out_of_the_main_collection() {
    let fx = setup().await;
    let draft_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/api/v1/drafts"))
        .respond_with(ResponseTemplate::new(201).set_body_json(draft_body(&draft_id)))
        .mount(&fx.server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("/api/v1/drafts/{draft_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(draft_body(&draft_id)))
        .mount(&fx.server)
        .await;

    let draft = fx
        .manager
        .create_draft(ResourceType::Settings, json!({ "days": ["mon"] }), "sess-1")
        .await
        .expect("create draft");
    assert_eq!(draft.id, draft_id);

    fx.manager
        .update_draft(&draft_id, ResourceType::Settings, json!({ "days": ["mon", "tue"] }), "sess-1")
        .await
        .expect("update draft");

    // Staged edits never touch the shared store.
    assert!(fx.store.is_empty());
}

#[tokio::test]
async fn committed_draft_surfaces_through_the_store() {
    let fx = setup().await;
    let draft_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path(format!("/api/v1/drafts/{draft_id}/commit")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "set-42",
            "businessId": "biz-1",
            "locationId": "loc-1",
            "data": { "days": ["mon", "tue"] },
            "createdAt": "2024-03-01T10:05:00Z"
        })))
        .mount(&fx.server)
        .await;

    let resource = fx.manager.commit_draft(&draft_id).await.expect("commit");
    let tracked = fx.store.insert_confirmed(resource).expect("surface");

    assert_eq!(tracked.resource.id.as_deref(), Some("set-42"));
    assert_eq!(tracked.sync_state, SyncState::Confirmed);
    assert_eq!(fx.store.len(), 1);
}

#[tokio::test]
async fn cancelled_draft_leaves_no_trace() {
    let fx = setup().await;
    let draft_id = Uuid::new_v4();

    Mock::given(method("DELETE"))
        .and(path(format!("/api/v1/drafts/{draft_id}")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&fx.server)
        .await;

    fx.manager.cancel_draft(&draft_id).await.expect("cancel");
    assert!(fx.store.is_empty());
}

#[tokio::test]
async fn validation_failures_never_reach_the_network() {
    let fx = setup().await;
    // No mocks mounted: any request would 404 and fail differently.

    let err = fx
        .manager
        .create_draft(ResourceType::Settings, json!("not an object"), "sess-1")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));

    let err = fx
        .manager
        .create_draft(ResourceType::Settings, json!({}), "")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Validation { .. }));
}

#[tokio::test]
async fn outstanding_drafts_can_be_listed_for_recovery() {
    let fx = setup().await;
    let draft_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/api/v1/drafts"))
        .and(query_param("sessionId", "sess-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([draft_body(&draft_id)])))
        .mount(&fx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/drafts"))
        .and(query_param("resourceType", "settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([draft_body(&draft_id)])))
        .mount(&fx.server)
        .await;

    let by_session = fx
        .manager
        .list_drafts(DraftQuery::Session("sess-1"))
        .await
        .expect("list by session");
    assert_eq!(by_session.len(), 1);
    assert_eq!(by_session[0].session_id, "sess-1");

    let by_type = fx
        .manager
        .list_drafts(DraftQuery::ResourceType(ResourceType::Settings))
        .await
        .expect("list by type");
    assert_eq!(by_type[0].id, draft_id);
}
