// ── Sync configuration ──

use std::path::PathBuf;

use secrecy::SecretString;
use url::Url;

use clinisync_api::TransportConfig;

use crate::model::TenantScope;

/// Configuration for one [`SyncHub`](crate::SyncHub).
///
/// Constructed once at process start; the hub and every store it owns
/// are scoped to this tenant for their whole lifetime.
#[derive(Clone)]
pub struct SyncConfig {
    /// Base URL of the remote API.
    pub base_url: Url,

    /// API key, injected as `X-API-KEY` on every request.
    pub api_key: SecretString,

    /// Tenant scope applied to every read and write.
    pub scope: TenantScope,

    /// Directory holding the persistent local cache files.
    pub cache_dir: PathBuf,

    /// Transport settings shared by the resource and draft clients.
    pub transport: TransportConfig,
}

impl SyncConfig {
    pub fn new(
        base_url: Url,
        api_key: SecretString,
        scope: TenantScope,
        cache_dir: PathBuf,
    ) -> Self {
        Self {
            base_url,
            api_key,
            scope,
            cache_dir,
            transport: TransportConfig::default(),
        }
    }
}

impl std::fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"<redacted>")
            .field("scope", &self.scope)
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}
