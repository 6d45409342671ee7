// Async HTTP client for the clinisync draft endpoints.
//
// Drafts stage create/edit operations server-side under a session id
// until they are committed (becoming ordinary resources) or cancelled.

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::Error;
use crate::resources::{handle_empty, handle_response, normalize_base_url};
use crate::transport::TransportConfig;
use crate::types::{DraftPayload, DraftRecord, ResourceRecord};

/// Async client for `/api/v1/drafts`.
pub struct DraftClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DraftClient {
    /// Build from an API key and transport config.
    pub fn from_api_key(
        base_url: &str,
        api_key: &secrecy::SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut key_value =
            HeaderValue::from_str(api_key.expose_secret()).map_err(|_| Error::InvalidApiKey)?;
        key_value.set_sensitive(true);
        headers.insert("X-API-KEY", key_value);

        let http = transport.build_client_with_headers(headers)?;
        let base_url = normalize_base_url(base_url)?;

        Ok(Self { http, base_url })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Stage a new draft.
    pub async fn create(&self, payload: &DraftPayload) -> Result<DraftRecord, Error> {
        let url = self.base_url.join("drafts")?;
        debug!("POST {url}");
        let resp = self.http.post(url).json(payload).send().await?;
        handle_response(resp).await
    }

    /// Overwrite an existing draft.
    pub async fn update(&self, draft_id: &Uuid, payload: &DraftPayload) -> Result<DraftRecord, Error> {
        let url = self.base_url.join(&format!("drafts/{draft_id}"))?;
        debug!("PUT {url}");
        let resp = self.http.put(url).json(payload).send().await?;
        handle_response(resp).await
    }

    /// Commit a draft, converting it into an ordinary resource.
    pub async fn commit(&self, draft_id: &Uuid) -> Result<ResourceRecord, Error> {
        let url = self.base_url.join(&format!("drafts/{draft_id}/commit"))?;
        debug!("POST {url}");
        let resp = self.http.post(url).send().await?;
        handle_response(resp).await
    }

    /// Discard a draft without committing.
    pub async fn cancel(&self, draft_id: &Uuid) -> Result<(), Error> {
        let url = self.base_url.join(&format!("drafts/{draft_id}"))?;
        debug!("DELETE {url}");
        let resp = self.http.delete(url).send().await?;
        handle_empty(resp).await
    }

    /// List outstanding drafts for a session.
    pub async fn list_by_session(&self, session_id: &str) -> Result<Vec<DraftRecord>, Error> {
        self.list(&[("sessionId", session_id)]).await
    }

    /// List outstanding drafts for a resource type.
    pub async fn list_by_type(&self, resource_type: &str) -> Result<Vec<DraftRecord>, Error> {
        self.list(&[("resourceType", resource_type)]).await
    }

    async fn list(&self, params: &[(&str, &str)]) -> Result<Vec<DraftRecord>, Error> {
        let url = self.base_url.join("drafts")?;
        debug!("GET {url} params={params:?}");
        let resp = self.http.get(url).query(params).send().await?;
        handle_response(resp).await
    }
}
