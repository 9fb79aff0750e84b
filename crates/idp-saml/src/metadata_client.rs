//! Retrieval of service provider metadata.

use async_trait::async_trait;
use tracing::debug;

use crate::error::{SamlError, SamlResult};
use crate::types::Metadata;

/// Fetches and parses a metadata document.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Retrieves the metadata published at `url`.
    ///
    /// Transport failures are reported as [`SamlError::MetadataTransport`]
    /// and unparseable documents as [`SamlError::MetadataParse`].
    async fn fetch(&self, url: &str) -> SamlResult<Metadata>;
}

/// Fetches metadata over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpMetadataFetcher {
    client: reqwest::Client,
}

impl HttpMetadataFetcher {
    /// Creates a fetcher with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fetcher using the given client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn transport(url: &str, err: impl std::fmt::Display) -> SamlError {
    SamlError::MetadataTransport {
        url: url.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl MetadataFetcher for HttpMetadataFetcher {
    async fn fetch(&self, url: &str) -> SamlResult<Metadata> {
        debug!(url, "fetching metadata");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| transport(url, e))?;
        let body = response.text().await.map_err(|e| transport(url, e))?;
        Metadata::from_xml(&body).map_err(|e| SamlError::MetadataParse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
