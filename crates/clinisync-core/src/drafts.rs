// ── Draft lifecycle manager ──
//
// Drafts separate "being edited" from "visible to all consumers": a
// multi-step form stages its state server-side under a session id, and
// nothing reaches the shared collections until the draft is committed.

use std::sync::Arc;

use uuid::Uuid;

use clinisync_api::{DraftClient, DraftPayload, DraftRecord};

use crate::error::CoreError;
use crate::model::{Resource, ResourceType, TenantScope};

/// Query shape for enumerating outstanding drafts.
#[derive(Debug, Clone)]
pub enum DraftQuery<'a> {
    Session(&'a str),
    ResourceType(ResourceType),
}

/// Stages create/edit operations against the draft endpoints.
///
/// Validation happens synchronously before any network call and never
/// touches shared store state. Committing yields an ordinary
/// [`Resource`]; the caller surfaces it through the owning store
/// ([`ResourceStore::insert_confirmed`](crate::ResourceStore::insert_confirmed)).
pub struct DraftManager {
    client: Arc<DraftClient>,
    scope: TenantScope,
}

impl DraftManager {
    pub fn new(client: Arc<DraftClient>, scope: TenantScope) -> Self {
        Self { client, scope }
    }

    /// Stage a new draft under a session.
    pub async fn create_draft(
        &self,
        resource_type: ResourceType,
        data: serde_json::Value,
        session_id: &str,
    ) -> Result<DraftRecord, CoreError> {
        let payload = self.payload(resource_type, data, session_id)?;
        Ok(self.client.create(&payload).await?)
    }

    /// Re-validate and overwrite an existing draft.
    pub async fn update_draft(
        &self,
        draft_id: &Uuid,
        resource_type: ResourceType,
        data: serde_json::Value,
        session_id: &str,
    ) -> Result<DraftRecord, CoreError> {
        let payload = self.payload(resource_type, data, session_id)?;
        Ok(self.client.update(draft_id, &payload).await?)
    }

    /// Convert a draft into a committed resource.
    ///
    /// The returned resource has not been inserted anywhere — it is the
    /// caller's job to surface it through the owning store, exactly like
    /// a confirmed `add`.
    pub async fn commit_draft(&self, draft_id: &Uuid) -> Result<Resource, CoreError> {
        let record = self.client.commit(draft_id).await?;
        if record.server_id().is_none() {
            return Err(CoreError::InvalidResponse {
                message: "commit response missing server id".to_owned(),
            });
        }
        Ok(Resource::from(record))
    }

    /// Discard a draft with no trace in any collection.
    pub async fn cancel_draft(&self, draft_id: &Uuid) -> Result<(), CoreError> {
        Ok(self.client.cancel(draft_id).await?)
    }

    /// Enumerate outstanding drafts, e.g. to resume an abandoned
    /// multi-step form.
    pub async fn list_drafts(&self, query: DraftQuery<'_>) -> Result<Vec<DraftRecord>, CoreError> {
        let drafts = match query {
            DraftQuery::Session(session_id) => self.client.list_by_session(session_id).await?,
            DraftQuery::ResourceType(rt) => self.client.list_by_type(rt.as_str()).await?,
        };
        Ok(drafts)
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Structural validation only; business rules per resource type are
    /// a non-goal of this layer.
    fn payload(
        &self,
        resource_type: ResourceType,
        data: serde_json::Value,
        session_id: &str,
    ) -> Result<DraftPayload, CoreError> {
        if session_id.trim().is_empty() {
            return Err(CoreError::validation("session id must not be empty"));
        }
        if !data.is_object() {
            return Err(CoreError::validation("draft payload must be a JSON object"));
        }
        Ok(DraftPayload {
            session_id: session_id.to_owned(),
            resource_type: resource_type.as_str().to_owned(),
            business_id: self.scope.business_id.clone(),
            location_id: self.scope.location_id.clone(),
            data,
        })
    }
}
