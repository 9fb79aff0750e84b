//! Signing, encryption and wrapping of assertions into responses.

use idp_xmlsec::{EncryptedDataTemplate, Operation, ValidationOptions};
use tracing::debug;

use super::request::IdpAuthnRequest;
use crate::error::{SamlError, SamlResult};
use crate::provider::IdentityProvider;
use crate::types::{
    default_version, Assertion, AuthnRequest, EncryptedAssertionPayload, Issuer, Response, Status,
    XML_DECLARATION,
};

/// Turns built assertions into responses for one identity provider.
#[derive(Debug, Clone, Copy)]
pub struct ResponseAssembler<'a> {
    provider: &'a IdentityProvider,
    template: EncryptedDataTemplate,
}

impl<'a> ResponseAssembler<'a> {
    /// Creates an assembler encrypting with AES-128-CBC under RSA-OAEP.
    #[must_use]
    pub fn new(provider: &'a IdentityProvider) -> Self {
        Self {
            provider,
            template: EncryptedDataTemplate::default(),
        }
    }

    /// Sets the encryption template.
    #[must_use]
    pub const fn with_template(mut self, template: EncryptedDataTemplate) -> Self {
        self.template = template;
        self
    }

    /// Signs and then encrypts the assertion for the requesting service
    /// provider.
    ///
    /// Each engine stage goes through the provider's exception policy, so a
    /// waived trust failure continues with the engine's partial output.
    pub async fn marshal_assertion(
        &self,
        assertion: &Assertion,
        request: &IdpAuthnRequest,
    ) -> SamlResult<EncryptedAssertionPayload> {
        assertion.ensure_complete()?;
        let xml = assertion.to_xml()?;
        let engine = self.provider.engine();
        let policy = self.provider.policy();

        let key = self.provider.private_key_file()?;
        let signed = engine
            .sign(xml.as_bytes(), key.path(), &ValidationOptions::id_attr_hack())
            .await;
        let signed = policy.gate(Operation::Sign, signed)?;
        drop(key);
        debug!(assertion_id = %assertion.id, bytes = signed.len(), "signed assertion");

        let certificate = self.provider.sp_certificate_file(request).await?;
        let encrypted = engine.encrypt(&self.template, &signed, certificate.path()).await;
        let encrypted = policy.gate(Operation::Encrypt, encrypted)?;
        debug!(assertion_id = %assertion.id, bytes = encrypted.len(), "encrypted assertion");

        let text = String::from_utf8(encrypted)
            .map_err(|e| SamlError::XmlParse(format!("engine output is not UTF-8: {e}")))?;
        Ok(EncryptedAssertionPayload::new(strip_declaration(&text).to_string()))
    }

    /// Wraps an encrypted assertion in a response to `request`.
    ///
    /// The destination is the recipient resolved into the assertion; an
    /// empty recipient fails with [`SamlError::MissingDestination`].
    pub fn make_response(
        &self,
        assertion: &Assertion,
        request: &AuthnRequest,
        payload: EncryptedAssertionPayload,
    ) -> SamlResult<Response> {
        let destination = assertion
            .recipient()
            .filter(|recipient| !recipient.is_empty())
            .ok_or(SamlError::MissingDestination)?;
        Ok(Response {
            id: self.provider.id_generator().new_id(),
            in_response_to: request.id.clone(),
            issue_instant: self.provider.clock().now(),
            version: default_version(),
            destination: destination.to_string(),
            issuer: Issuer::entity(self.provider.config().identity_provider.metadata_url.clone()),
            status: Status::success(),
            encrypted_assertion: payload,
        })
    }
}

/// Removes a leading XML declaration and surrounding whitespace.
fn strip_declaration(xml: &str) -> &str {
    let trimmed = xml.trim();
    trimmed.strip_prefix(XML_DECLARATION).unwrap_or(trimmed).trim()
}
