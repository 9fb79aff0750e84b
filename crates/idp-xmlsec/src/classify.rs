//! Classification of engine diagnostics.
//!
//! The engine reports failures as free text. The markers below are checked in
//! order and the first match wins, so a diagnostic mentioning both a failed
//! signature and a self-signed certificate is a signature failure.

use std::fmt;

/// Marker for a successful run.
pub const OK_MARKER: &str = "OK";
/// Marker for a failed signature.
pub const SIGNATURE_FAILED_MARKER: &str = "signature failed";
/// Marker for a schema or DTD validity failure.
pub const VALIDITY_ERROR_MARKER: &str = "validity error";
/// Marker for a self-signed certificate.
pub const SELF_SIGNED_MARKER: &str = "msg=self signed certificate";
/// Marker for a certificate issued by an unrecognized authority.
pub const UNKNOWN_ISSUER_MARKER: &str = "msg=unable to get local issuer certificate";

/// Kind of security failure reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SecurityErrorKind {
    /// The signature did not verify.
    SignatureFailure,
    /// The document failed validation.
    ValidityError,
    /// The certificate is self-signed.
    SelfSignedCertificate,
    /// The certificate issuer is not trusted locally.
    UnknownIssuer,
    /// Any other diagnostic.
    Unclassified,
}

impl SecurityErrorKind {
    /// Returns a stable name for logging.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SignatureFailure => "signature_failure",
            Self::ValidityError => "validity_error",
            Self::SelfSignedCertificate => "self_signed_certificate",
            Self::UnknownIssuer => "unknown_issuer",
            Self::Unclassified => "unclassified",
        }
    }

    /// Returns whether this is a certificate trust failure.
    #[must_use]
    pub const fn is_trust_failure(&self) -> bool {
        matches!(self, Self::SelfSignedCertificate | Self::UnknownIssuer)
    }
}

impl fmt::Display for SecurityErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies engine diagnostic text.
///
/// Returns `None` when the text starts with the success marker.
#[must_use]
pub fn classify(diagnostic: &str) -> Option<SecurityErrorKind> {
    if diagnostic.starts_with(OK_MARKER) {
        return None;
    }
    let kind = if diagnostic.contains(SIGNATURE_FAILED_MARKER) {
        SecurityErrorKind::SignatureFailure
    } else if diagnostic.contains(VALIDITY_ERROR_MARKER) {
        SecurityErrorKind::ValidityError
    } else if diagnostic.contains(SELF_SIGNED_MARKER) {
        SecurityErrorKind::SelfSignedCertificate
    } else if diagnostic.contains(UNKNOWN_ISSUER_MARKER) {
        SecurityErrorKind::UnknownIssuer
    } else {
        SecurityErrorKind::Unclassified
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_prefix_is_not_an_error() {
        assert_eq!(classify("OK\nSignedInfo References (ok/all): 1/1"), None);
    }

    #[test]
    fn recognizes_each_marker() {
        assert_eq!(
            classify("func=xmlSecOpenSSLEvpSignatureVerify:error=18:data do not match:signature failed"),
            Some(SecurityErrorKind::SignatureFailure)
        );
        assert_eq!(
            classify("Element Response: validity error : ID attribute not declared"),
            Some(SecurityErrorKind::ValidityError)
        );
        assert_eq!(
            classify("func=xmlSecOpenSSLX509StoreVerify:err=18;msg=self signed certificate"),
            Some(SecurityErrorKind::SelfSignedCertificate)
        );
        assert_eq!(
            classify("err=20;msg=unable to get local issuer certificate"),
            Some(SecurityErrorKind::UnknownIssuer)
        );
        assert_eq!(
            classify("failed to load private key"),
            Some(SecurityErrorKind::Unclassified)
        );
    }

    #[test]
    fn first_marker_wins() {
        let text = "msg=self signed certificate\nsignature failed";
        assert_eq!(classify(text), Some(SecurityErrorKind::SignatureFailure));

        let text = "msg=unable to get local issuer certificate\nvalidity error";
        assert_eq!(classify(text), Some(SecurityErrorKind::ValidityError));

        let text = "msg=unable to get local issuer certificate msg=self signed certificate";
        assert_eq!(classify(text), Some(SecurityErrorKind::SelfSignedCertificate));
    }

    #[test]
    fn ok_must_be_a_prefix() {
        assert_eq!(
            classify("error: not OK"),
            Some(SecurityErrorKind::Unclassified)
        );
        assert_eq!(classify(""), Some(SecurityErrorKind::Unclassified));
    }

    #[test]
    fn trust_failures() {
        assert!(SecurityErrorKind::SelfSignedCertificate.is_trust_failure());
        assert!(SecurityErrorKind::UnknownIssuer.is_trust_failure());
        assert!(!SecurityErrorKind::SignatureFailure.is_trust_failure());
        assert_eq!(SecurityErrorKind::UnknownIssuer.to_string(), "unknown_issuer");
    }
}
