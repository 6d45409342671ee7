// Hand-crafted async HTTP client for the clinisync resource endpoints.
//
// Base path: /api/v1/
// Auth: X-API-KEY header

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::Error;
use crate::transport::TransportConfig;
use crate::types::{ErrorResponse, ResourceFilters, ResourceRecord};

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the resource CRUD and search endpoints.
///
/// Stateless request/response wrapper: one call, one HTTP round trip.
/// All sync bookkeeping (optimistic state, reconciliation) lives in
/// `clinisync-core`.
pub struct ResourceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ResourceClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from an API key and transport config.
    ///
    /// Injects `X-API-KEY` as a default header on every request.
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

    // ── Resource endpoints ───────────────────────────────────────────

    /// List resources of one type, filtered by tenant scope and
    /// field-equality filters.
    pub async fn list(
        &self,
        resource_type: &str,
        filters: &ResourceFilters,
    ) -> Result<Vec<ResourceRecord>, Error> {
        self.get_with_params(&format!("resources/{resource_type}"), &filters.to_query())
            .await
    }

    /// Fetch a single resource by server id.
    pub async fn get_resource(
        &self,
        resource_type: &str,
        id: &str,
    ) -> Result<ResourceRecord, Error> {
        self.get(&format!("resources/{resource_type}/{id}")).await
    }

    /// Create a resource. The server assigns the id and timestamps.
    pub async fn create(
        &self,
        resource_type: &str,
        record: &ResourceRecord,
    ) -> Result<ResourceRecord, Error> {
        self.post(&format!("resources/{resource_type}"), record)
            .await
    }

    /// Overwrite a resource by server id.
    pub async fn update(
        &self,
        resource_type: &str,
        id: &str,
        record: &ResourceRecord,
    ) -> Result<ResourceRecord, Error> {
        self.put(&format!("resources/{resource_type}/{id}"), record)
            .await
    }

    /// Delete a resource by server id.
    pub async fn delete(&self, resource_type: &str, id: &str) -> Result<(), Error> {
        self.delete_path(&format!("resources/{resource_type}/{id}"))
            .await
    }

    /// Free-text search within one resource type.
    pub async fn search(
        &self,
        resource_type: &str,
        query: &str,
        filters: &ResourceFilters,
    ) -> Result<Vec<ResourceRecord>, Error> {
        let mut params = filters.to_query();
        params.push(("q".to_owned(), query.to_owned()));
        self.get_with_params(&format!("resources/{resource_type}/search"), &params)
            .await
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await?;
        handle_response(resp).await
    }

    async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.http.get(url).query(params).send().await?;
        handle_response(resp).await
    }

    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).json(body).send().await?;
        handle_response(resp).await
    }

    async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.http.put(url).json(body).send().await?;
        handle_response(resp).await
    }

    async fn delete_path(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.http.delete(url).send().await?;
        handle_empty(resp).await
    }

    /// Join a relative path (e.g. `"resources/settings"`) onto the base URL.
    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }
}

// ── Shared response handling ─────────────────────────────────────────

/// Build the base URL with the `/api/v1/` prefix.
pub(crate) fn normalize_base_url(raw: &str) -> Result<Url, Error> {
    let mut url = Url::parse(raw)?;
    let path = url.path().trim_end_matches('/').to_owned();
    if path.ends_with("/api/v1") {
        url.set_path(&format!("{path}/"));
    } else {
        url.set_path(&format!("{path}/api/v1/"));
    }
    Ok(url)
}

/// Decode a JSON body, mapping non-2xx statuses to the API error envelope.
pub(crate) async fn handle_response<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(error_from_body(status, &body));
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}

/// Like [`handle_response`] for endpoints that return no body.
pub(crate) async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await?;
    Err(error_from_body(status, &body))
}

fn error_from_body(status: reqwest::StatusCode, body: &str) -> Error {
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Error::InvalidApiKey;
    }
    let envelope: ErrorResponse = serde_json::from_str(body).unwrap_or(ErrorResponse {
        message: None,
        code: None,
    });
    Error::Api {
        message: envelope
            .message
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_owned()),
        code: envelope.code,
        status: status.as_u16(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_api_prefix() {
        let url = normalize_base_url("https://clinic.example.com").unwrap();
        assert_eq!(url.as_str(), "https://clinic.example.com/api/v1/");
    }

    #[test]
    fn base_url_with_existing_prefix_is_untouched() {
        let url = normalize_base_url("https://clinic.example.com/api/v1/").unwrap();
        assert_eq!(url.as_str(), "https://clinic.example.com/api/v1/");
    }
}
