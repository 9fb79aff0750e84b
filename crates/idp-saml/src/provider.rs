//! The identity provider.
//!
//! [`IdentityProvider`] owns the configuration and every collaborator the
//! issuance pipeline needs: the security engine, the metadata fetcher, the
//! clock and the identifier generator. Each collaborator can be replaced
//! after construction.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use idp_core::Config;
use idp_xmlsec::{BlockEncryption, ExceptionPolicy, KeyTransport, SecurityEngine, Xmlsec1};
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info};

use crate::clock::{Clock, IdGenerator, SystemClock, UuidIdGenerator};
use crate::error::{SamlError, SamlResult};
use crate::issue::{AssertionBuilder, IdpAuthnRequest, ResponseAssembler};
use crate::keys::{decode_certificate, der_to_pem, KeyFile, KeySource, CERTIFICATE_LABEL};
use crate::metadata_client::{HttpMetadataFetcher, MetadataFetcher};
use crate::types::{
    bindings, key_use, name_id_formats, saml2_protocol, Endpoint, IdpSsoDescriptor, KeyDescriptor,
    Metadata, Response, Session,
};

/// A SAML identity provider.
pub struct IdentityProvider {
    config: Config,
    engine: Arc<dyn SecurityEngine>,
    fetcher: Arc<dyn MetadataFetcher>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    policy: ExceptionPolicy,
    static_sp_metadata: Option<Metadata>,
    sp_metadata_cache: RwLock<HashMap<String, CachedMetadata>>,
    certificate: OnceCell<Vec<u8>>,
}

/// A fetched metadata document and the instant it stops being reused.
#[derive(Debug, Clone)]
struct CachedMetadata {
    metadata: Metadata,
    expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for IdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityProvider")
            .field("entity_id", &self.config.identity_provider.entity_id)
            .field("metadata_url", &self.config.identity_provider.metadata_url)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl IdentityProvider {
    /// Creates a provider using `xmlsec1`, HTTP metadata retrieval, the
    /// system clock and random identifiers.
    ///
    /// Fails when the configuration names no key or certificate, or when the
    /// inline service provider metadata does not parse.
    pub fn new(config: Config) -> SamlResult<Self> {
        config.validate()?;
        let static_sp_metadata = config
            .service_provider
            .metadata_xml
            .as_deref()
            .map(Metadata::from_xml)
            .transpose()?;
        Ok(Self {
            engine: Arc::new(Xmlsec1::from_config(&config.xmlsec)),
            fetcher: Arc::new(HttpMetadataFetcher::new()),
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidIdGenerator),
            policy: ExceptionPolicy::new(config.security),
            static_sp_metadata,
            sp_metadata_cache: RwLock::new(HashMap::new()),
            certificate: OnceCell::new(),
            config,
        })
    }

    /// Replaces the security engine.
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn SecurityEngine>) -> Self {
        self.engine = engine;
        self
    }

    /// Replaces the metadata fetcher.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the identifier generator.
    #[must_use]
    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Pins the service provider metadata used for every request.
    #[must_use]
    pub fn with_sp_metadata(mut self, metadata: Metadata) -> Self {
        self.static_sp_metadata = Some(metadata);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the security engine.
    #[must_use]
    pub fn engine(&self) -> &dyn SecurityEngine {
        self.engine.as_ref()
    }

    /// Returns the exception policy built from the configured waivers.
    #[must_use]
    pub fn policy(&self) -> &ExceptionPolicy {
        &self.policy
    }

    /// Returns the clock.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Returns the identifier generator.
    #[must_use]
    pub fn id_generator(&self) -> &dyn IdGenerator {
        self.ids.as_ref()
    }

    fn temp_dir(&self) -> Option<&Path> {
        self.config.xmlsec.temp_dir.as_deref()
    }

    /// Returns a file holding the private key.
    pub fn private_key_file(&self) -> SamlResult<KeyFile> {
        let idp = &self.config.identity_provider;
        KeySource::from_parts(idp.key_file.as_deref(), idp.private_key_pem.as_deref())
            .ok_or_else(|| SamlError::MissingKey("missing idp private key".to_string()))?
            .materialize(self.temp_dir())
    }

    /// Returns a file holding the certificate.
    pub fn certificate_file(&self) -> SamlResult<KeyFile> {
        let idp = &self.config.identity_provider;
        KeySource::from_parts(idp.cert_file.as_deref(), idp.certificate_pem.as_deref())
            .ok_or_else(|| SamlError::MissingCertificate("missing idp public key".to_string()))?
            .materialize(self.temp_dir())
    }

    /// Returns the DER certificate, reading it on first use.
    pub async fn certificate(&self) -> SamlResult<&[u8]> {
        let der = self
            .certificate
            .get_or_try_init(|| async { self.certificate_file()?.read_certificate().await })
            .await?;
        Ok(der.as_slice())
    }

    /// Generates the identity provider metadata.
    pub async fn metadata(&self) -> SamlResult<Metadata> {
        let certificate = STANDARD.encode(self.certificate().await?);
        let validity = chrono::Duration::from_std(self.config.issuance.metadata_validity())
            .map_err(|_| SamlError::TimeRange("metadata validity"))?;
        let valid_until = self
            .clock
            .now()
            .checked_add_signed(validity)
            .ok_or(SamlError::TimeRange("metadata validity"))?;
        let idp = &self.config.identity_provider;

        Ok(Metadata {
            entity_id: idp.metadata_url.clone(),
            valid_until: Some(valid_until),
            idp_sso_descriptor: Some(IdpSsoDescriptor {
                protocol_support_enumeration: saml2_protocol(),
                key_descriptors: vec![
                    KeyDescriptor {
                        key_use: Some(key_use::SIGNING.to_string()),
                        certificate: certificate.clone(),
                        encryption_methods: Vec::new(),
                    },
                    KeyDescriptor {
                        key_use: Some(key_use::ENCRYPTION.to_string()),
                        certificate,
                        encryption_methods: BlockEncryption::ALL
                            .iter()
                            .map(|block| block.uri().to_string())
                            .chain(std::iter::once(KeyTransport::RsaOaepMgf1p.uri().to_string()))
                            .collect(),
                    },
                ],
                name_id_formats: vec![name_id_formats::TRANSIENT.to_string()],
                single_sign_on_services: vec![
                    Endpoint {
                        binding: bindings::HTTP_REDIRECT.to_string(),
                        location: idp.sso_url.clone(),
                    },
                    Endpoint {
                        binding: bindings::HTTP_POST.to_string(),
                        location: idp.sso_url.clone(),
                    },
                ],
            }),
            sp_sso_descriptor: None,
        })
    }

    /// Resolves the service provider metadata for a request.
    ///
    /// Pinned metadata wins, then metadata attached to the request. Otherwise
    /// the document is fetched from the request issuer, or from the
    /// configured URL when the request has no issuer.
    ///
    /// Fetched documents are reused until the configured TTL or their own
    /// `validUntil`, whichever comes first. At most
    /// `metadata_cache_capacity` documents are kept; the one closest to
    /// expiry is evicted to make room.
    pub async fn sp_metadata(&self, request: &IdpAuthnRequest) -> SamlResult<Metadata> {
        if let Some(metadata) = &self.static_sp_metadata {
            return Ok(metadata.clone());
        }
        if let Some(metadata) = &request.service_provider_metadata {
            return Ok(metadata.clone());
        }
        let url = request
            .sp_metadata_url()
            .or(self.config.service_provider.metadata_url.as_deref())
            .ok_or_else(|| SamlError::MissingMetadata("missing sp metadata url".to_string()))?;

        let now = self.clock.now();
        if let Some(cached) = self.sp_metadata_cache.read().await.get(url) {
            if cached.expires_at > now {
                return Ok(cached.metadata.clone());
            }
        }
        let metadata = self.fetcher.fetch(url).await?;
        self.cache_sp_metadata(url, &metadata, now).await;
        Ok(metadata)
    }

    async fn cache_sp_metadata(&self, url: &str, metadata: &Metadata, now: DateTime<Utc>) {
        let sp = &self.config.service_provider;
        let capacity = sp.metadata_cache_capacity;
        let ttl_end = chrono::Duration::from_std(sp.metadata_cache_ttl())
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let expires_at = metadata.valid_until.map_or(ttl_end, |until| until.min(ttl_end));
        if capacity == 0 || expires_at <= now {
            debug!(url, "not caching service provider metadata");
            return;
        }

        let mut cache = self.sp_metadata_cache.write().await;
        cache.retain(|_, cached| cached.expires_at > now);
        if !cache.contains_key(url) && cache.len() >= capacity {
            let oldest = cache
                .iter()
                .min_by_key(|(_, cached)| cached.expires_at)
                .map(|(key, _)| key.clone());
            if let Some(oldest) = oldest {
                debug!(url = %oldest, "evicting service provider metadata");
                cache.remove(&oldest);
            }
        }
        debug!(url, entity_id = %metadata.entity_id, %expires_at, "cached service provider metadata");
        cache.insert(
            url.to_string(),
            CachedMetadata {
                metadata: metadata.clone(),
                expires_at,
            },
        );
    }

    /// Writes the service provider encryption certificate to a temporary
    /// PEM file.
    pub async fn sp_certificate_file(&self, request: &IdpAuthnRequest) -> SamlResult<KeyFile> {
        let metadata = self.sp_metadata(request).await?;
        let descriptor = metadata
            .sp_sso_descriptor
            .as_ref()
            .ok_or_else(|| SamlError::MissingMetadata("missing sp sso descriptor".to_string()))?;
        let certificate = descriptor
            .encryption_certificate()
            .ok_or_else(|| SamlError::MissingCertificate("missing sp cert".to_string()))?;
        let pem = der_to_pem(&decode_certificate(certificate)?, CERTIFICATE_LABEL);
        KeyFile::temporary(pem.as_bytes(), self.temp_dir())
    }

    /// Returns an assertion builder sharing this provider's clock and
    /// identifiers.
    #[must_use]
    pub fn assertion_builder(&self) -> AssertionBuilder {
        AssertionBuilder::new(Arc::clone(&self.clock), Arc::clone(&self.ids))
            .with_lifetime(self.config.issuance.assertion_lifetime())
            .with_default_acs_url(self.config.service_provider.acs_url.clone())
    }

    /// Issues a response carrying a signed and encrypted assertion.
    pub async fn issue(&self, request: &IdpAuthnRequest, session: &Session) -> SamlResult<Response> {
        let idp_metadata = self.metadata().await?;
        let assertion = self.assertion_builder().build(
            session,
            request,
            &idp_metadata,
            request.service_provider_metadata.as_ref(),
        )?;
        let assembler = ResponseAssembler::new(self);
        let payload = assembler.marshal_assertion(&assertion, request).await?;
        let response = assembler.make_response(&assertion, &request.request, payload)?;
        info!(
            response_id = %response.id,
            assertion_id = %assertion.id,
            in_response_to = %response.in_response_to,
            "issued response"
        );
        Ok(response)
    }
}
