//! SAML Response types.

use chrono::{DateTime, Utc};

use super::constants::{status_codes, SAMLP_NS, SAML_NS, SAML_VERSION};
use super::name_id::Issuer;
use crate::error::SamlResult;
use crate::xml::{format_instant, XmlWriter};

/// A signed and encrypted assertion, ready to embed in a response.
///
/// Only produced by [`ResponseAssembler::marshal_assertion`](crate::issue::ResponseAssembler::marshal_assertion),
/// so holding one proves the assertion went through both engine stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedAssertionPayload(String);

impl EncryptedAssertionPayload {
    pub(crate) fn new(xml: String) -> Self {
        Self(xml)
    }

    /// Returns the encrypted element markup.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the payload, returning its markup.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Response status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    /// Top-level status code URI.
    pub code: String,
    /// Optional human-readable message.
    pub message: Option<String>,
}

impl Status {
    /// The success status.
    #[must_use]
    pub fn success() -> Self {
        Self {
            code: status_codes::SUCCESS.to_string(),
            message: None,
        }
    }

    /// Returns whether this is the success status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.code == status_codes::SUCCESS
    }

    fn write_xml(&self, w: &mut XmlWriter) -> SamlResult<()> {
        w.start("samlp:Status", &[])?;
        w.empty("samlp:StatusCode", &[("Value", self.code.as_str())])?;
        if let Some(message) = &self.message {
            w.text_element("samlp:StatusMessage", &[], message)?;
        }
        w.end("samlp:Status")
    }
}

/// A protocol response carrying an encrypted assertion.
#[derive(Debug, Clone)]
pub struct Response {
    /// Unique identifier.
    pub id: String,
    /// Identifier of the request being answered.
    pub in_response_to: String,
    /// When the response was issued.
    pub issue_instant: DateTime<Utc>,
    /// Always "2.0".
    pub version: String,
    /// Where the response is delivered. Never empty.
    pub destination: String,
    /// The issuing identity provider.
    pub issuer: Issuer,
    /// Response status.
    pub status: Status,
    /// The encrypted assertion.
    pub encrypted_assertion: EncryptedAssertionPayload,
}

impl Response {
    /// Serializes the response.
    pub fn to_xml(&self) -> SamlResult<String> {
        let issue_instant = format_instant(&self.issue_instant);
        let mut w = XmlWriter::new();
        w.start(
            "samlp:Response",
            &[
                ("xmlns:samlp", SAMLP_NS),
                ("xmlns:saml", SAML_NS),
                ("ID", self.id.as_str()),
                ("InResponseTo", self.in_response_to.as_str()),
                ("Version", self.version.as_str()),
                ("IssueInstant", issue_instant.as_str()),
                ("Destination", self.destination.as_str()),
            ],
        )?;
        self.issuer.write_xml(&mut w)?;
        self.status.write_xml(&mut w)?;
        w.start("saml:EncryptedAssertion", &[])?;
        w.raw(self.encrypted_assertion.as_str());
        w.end("saml:EncryptedAssertion")?;
        w.end("samlp:Response")?;
        w.into_string()
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::success()
    }
}

pub(crate) fn default_version() -> String {
    SAML_VERSION.to_string()
}
