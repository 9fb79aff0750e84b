//! SAML issuance error types.
//!
//! Security engine failures keep their [`XmlSecError`] classification.
//! Structural faults (missing destination, key, certificate or metadata) are
//! separate variants and never go through the waiver policy.

use idp_xmlsec::XmlSecError;
use thiserror::Error;

use crate::types::status_codes;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML issuance errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// The security engine failed or reported a security exception.
    #[error(transparent)]
    Xmlsec(#[from] XmlSecError),

    /// No recipient could be resolved for the response.
    #[error("missing response destination")]
    MissingDestination,

    /// No private key is configured.
    #[error("{0}")]
    MissingKey(String),

    /// A required certificate is absent or unreadable.
    #[error("{0}")]
    MissingCertificate(String),

    /// Service provider metadata could not be located.
    #[error("{0}")]
    MissingMetadata(String),

    /// The assertion lacks a field required before signing.
    #[error("assertion is missing its {0}")]
    IncompleteAssertion(&'static str),

    /// Metadata could not be retrieved.
    #[error("failed to get url {url}: {message}")]
    MetadataTransport {
        /// The metadata URL.
        url: String,
        /// Description of the transport failure.
        message: String,
    },

    /// Metadata was retrieved but could not be parsed.
    #[error("failed to parse metadata from {url}: {message}")]
    MetadataParse {
        /// The metadata URL.
        url: String,
        /// Description of the parse failure.
        message: String,
    },

    /// XML parsing error.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// XML writing error.
    #[error("XML writing error: {0}")]
    XmlWrite(String),

    /// Base64 decoding error.
    #[error("base64 decode error: {0}")]
    Base64Decode(String),

    /// A timestamp fell outside the representable range.
    #[error("time out of range: {0}")]
    TimeRange(&'static str),

    /// Filesystem error while handling key material.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] idp_core::Error),
}

impl SamlError {
    /// Returns the SAML top-level status code for this error.
    #[must_use]
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::MissingDestination | Self::XmlParse(_) | Self::Base64Decode(_) => {
                status_codes::REQUESTER
            }
            _ => status_codes::RESPONDER,
        }
    }

    /// Returns whether this error came from the security engine.
    #[must_use]
    pub const fn is_security_error(&self) -> bool {
        matches!(self, Self::Xmlsec(XmlSecError::Security(_)))
    }
}

impl From<quick_xml::Error> for SamlError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for SamlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<base64::DecodeError> for SamlError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64Decode(err.to_string())
    }
}

impl From<chrono::ParseError> for SamlError {
    fn from(err: chrono::ParseError) -> Self {
        Self::XmlParse(format!("invalid timestamp: {err}"))
    }
}
