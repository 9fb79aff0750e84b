//! Request context for a single issuance.

use crate::error::SamlResult;
use crate::types::{AuthnRequest, IndexedEndpoint, Metadata};

/// An authentication request together with what the transport layer learned
/// while receiving it.
#[derive(Debug, Clone, Default)]
pub struct IdpAuthnRequest {
    /// The parsed request.
    pub request: AuthnRequest,
    /// Address of the user agent.
    pub address: Option<String>,
    /// Opaque relay state, returned to the service provider unchanged.
    pub relay_state: Option<String>,
    /// Metadata of the requesting service provider, when already known.
    pub service_provider_metadata: Option<Metadata>,
    /// Consumer endpoint chosen by the caller.
    pub acs_endpoint: Option<IndexedEndpoint>,
}

impl IdpAuthnRequest {
    /// Wraps a parsed request.
    #[must_use]
    pub fn new(request: AuthnRequest) -> Self {
        Self {
            request,
            ..Self::default()
        }
    }

    /// Parses a request document.
    pub fn from_xml(xml: &str) -> SamlResult<Self> {
        Ok(Self::new(AuthnRequest::from_xml(xml)?))
    }

    /// Sets the user agent address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Sets the relay state.
    #[must_use]
    pub fn with_relay_state(mut self, relay_state: impl Into<String>) -> Self {
        self.relay_state = Some(relay_state.into());
        self
    }

    /// Attaches service provider metadata.
    #[must_use]
    pub fn with_service_provider_metadata(mut self, metadata: Metadata) -> Self {
        self.service_provider_metadata = Some(metadata);
        self
    }

    /// Sets the consumer endpoint explicitly.
    #[must_use]
    pub fn with_acs_endpoint(mut self, endpoint: IndexedEndpoint) -> Self {
        self.acs_endpoint = Some(endpoint);
        self
    }

    /// Returns the URL the service provider metadata is published at.
    ///
    /// The request issuer wins; the entity id of attached metadata is used
    /// when the issuer is empty.
    #[must_use]
    pub fn sp_metadata_url(&self) -> Option<&str> {
        Some(self.request.issuer.as_str())
            .filter(|issuer| !issuer.is_empty())
            .or_else(|| {
                self.service_provider_metadata
                    .as_ref()
                    .map(|md| md.entity_id.as_str())
                    .filter(|id| !id.is_empty())
            })
    }
}
