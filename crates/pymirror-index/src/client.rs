use std::sync::Arc;
use std::time::Duration;

use pymirror_fetch::{HttpClient, MirrorRegistry};
use tokio::time::timeout;

use crate::error::{IndexError, Result};
use crate::release::PackageMetadata;

/// Default time allowed for one metadata request.
pub const DEFAULT_METADATA_TIMEOUT: Duration = Duration::from_secs(60);

/// Retrieves package metadata, falling back across mirrors.
pub struct MetadataClient<C: HttpClient> {
    client:   C,
    registry: Arc<MirrorRegistry>,
    timeout:  Duration,
    headers:  Vec<(String, String)>,
}

impl<C: HttpClient> MetadataClient<C> {
    pub fn new(client: C, registry: Arc<MirrorRegistry>) -> Self {
        Self {
            client,
            registry,
            timeout: DEFAULT_METADATA_TIMEOUT,
            headers: vec![("Accept".to_string(), "application/json".to_string())],
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch and parse metadata for `package` (extras are ignored).
    ///
    /// Mirrors are tried in registry order, each with its own timeout. HTTP
    /// errors and malformed documents move on to the next mirror.
    pub async fn fetch(&self, package: &str) -> Result<PackageMetadata> {
        let mut cursor = self.registry.cursor();

        loop {
            let mirror = cursor.current();
            let url = mirror.metadata_url(package);
            tracing::debug!(package, url = %url, "fetching metadata");

            let attempt = match timeout(self.timeout, self.client.get(&url, &self.headers)).await {
                Err(_) => Err(format!("timed out after {:?}", self.timeout)),
                Ok(Err(e)) => Err(e.to_string()),
                Ok(Ok(body)) => PackageMetadata::from_json(package, &body).map_err(|e| e.to_string()),
            };

            let last_error = match attempt {
                Ok(metadata) => return Ok(metadata),
                Err(e) => e,
            };
            tracing::warn!(package, mirror = mirror.base(), error = %last_error, "metadata request failed");

            if !cursor.advance() {
                tracing::error!(package, error = %last_error, "all mirrors failed");
                return Err(IndexError::MetadataUnavailable {
                    package: package.to_string(),
                    last_error,
                });
            }
        }
    }
}
