//! Assertion construction.

use std::sync::Arc;
use std::time::Duration;

use idp_core::config::DEFAULT_ASSERTION_LIFETIME_SECS;
use idp_xmlsec::SignatureTemplate;
use tracing::debug;

use super::attributes::build_attributes;
use super::request::IdpAuthnRequest;
use crate::clock::{Clock, IdGenerator};
use crate::error::{SamlError, SamlResult};
use crate::types::{
    Assertion, AttributeStatement, AuthnStatement, Conditions, Issuer, Metadata, NameId, Session,
    SpSsoDescriptor, Subject, SubjectConfirmation, SubjectConfirmationData,
    AC_PASSWORD_PROTECTED_TRANSPORT,
};

/// Picks where the assertion may be presented.
///
/// An explicit endpoint wins, then the first POST consumer endpoint in the
/// service provider metadata, then the URL declared in the request. Returns
/// an empty string when none applies.
///
/// A step that yields no URL or an empty one falls through to the next, so
/// an explicit endpoint with an empty location is ignored and metadata
/// without a POST endpoint defers to the requested URL.
#[must_use]
pub fn resolve_recipient(
    explicit: Option<&str>,
    service_provider: Option<&SpSsoDescriptor>,
    requested: Option<&str>,
) -> String {
    explicit
        .filter(|url| !url.is_empty())
        .or_else(|| {
            service_provider
                .and_then(SpSsoDescriptor::first_post_endpoint)
                .map(|acs| acs.location.as_str())
                .filter(|url| !url.is_empty())
        })
        .or_else(|| requested.filter(|url| !url.is_empty()))
        .unwrap_or_default()
        .to_string()
}

/// Builds assertions from sessions.
#[derive(Clone)]
pub struct AssertionBuilder {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    lifetime: Duration,
    default_acs_url: Option<String>,
}

impl std::fmt::Debug for AssertionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssertionBuilder")
            .field("lifetime", &self.lifetime)
            .field("default_acs_url", &self.default_acs_url)
            .finish_non_exhaustive()
    }
}

impl AssertionBuilder {
    /// Creates a builder issuing assertions valid for the default lifetime.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            clock,
            ids,
            lifetime: Duration::from_secs(DEFAULT_ASSERTION_LIFETIME_SECS),
            default_acs_url: None,
        }
    }

    /// Sets how long issued assertions stay valid.
    #[must_use]
    pub const fn with_lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Sets the consumer URL used when the request names no endpoint.
    #[must_use]
    pub fn with_default_acs_url(mut self, url: Option<String>) -> Self {
        self.default_acs_url = url.filter(|url| !url.is_empty());
        self
    }

    /// Builds the assertion answering `request` for `session`.
    ///
    /// The issuer and signing certificate come from `idp_metadata`. The
    /// audience restriction and SP name qualifier are only set when
    /// `sp_metadata` is given.
    pub fn build(
        &self,
        session: &Session,
        request: &IdpAuthnRequest,
        idp_metadata: &Metadata,
        sp_metadata: Option<&Metadata>,
    ) -> SamlResult<Assertion> {
        let now = self.clock.now();
        let lifetime =
            chrono::Duration::from_std(self.lifetime).map_err(|_| SamlError::TimeRange("assertion lifetime"))?;
        let not_on_or_after = now
            .checked_add_signed(lifetime)
            .ok_or(SamlError::TimeRange("assertion expiry"))?;

        let id = self.ids.new_id();
        let mut signature = SignatureTemplate::new(id.clone());
        if let Some(certificate) = idp_metadata.idp_signing_certificate() {
            signature = signature.with_certificate(certificate);
        }

        let explicit = request
            .acs_endpoint
            .as_ref()
            .map(|acs| acs.location.as_str())
            .or(self.default_acs_url.as_deref());
        let recipient = resolve_recipient(
            explicit,
            sp_metadata.and_then(|md| md.sp_sso_descriptor.as_ref()),
            request.request.assertion_consumer_service_url.as_deref(),
        );

        let mut name_id = NameId::transient(session.name_id.clone()).with_name_qualifier(idp_metadata.entity_id.clone());
        if let Some(sp) = sp_metadata {
            name_id = name_id.with_sp_name_qualifier(sp.entity_id.clone());
        }

        let mut assertion = Assertion::new(id, now, Issuer::entity(idp_metadata.entity_id.clone()));
        assertion.signature = Some(signature);
        assertion.subject = Some(Subject {
            name_id: Some(name_id),
            subject_confirmation: Some(SubjectConfirmation::bearer(SubjectConfirmationData {
                address: request.address.clone(),
                in_response_to: request.request.id.clone(),
                not_on_or_after,
                recipient,
            })),
        });
        assertion.conditions = Some(Conditions {
            not_before: now,
            not_on_or_after,
            audience: sp_metadata.map(|md| md.entity_id.clone()),
        });
        assertion.authn_statement = Some(AuthnStatement {
            authn_instant: session.create_time,
            session_index: session.index.clone(),
            subject_locality: request.address.clone(),
            authn_context_class_ref: AC_PASSWORD_PROTECTED_TRANSPORT.to_string(),
        });
        let attributes = build_attributes(session);
        if !attributes.is_empty() {
            assertion.attribute_statement = Some(AttributeStatement { attributes });
        }

        debug!(
            assertion_id = %assertion.id,
            in_response_to = %request.request.id,
            "built assertion"
        );
        Ok(assertion)
    }
}
