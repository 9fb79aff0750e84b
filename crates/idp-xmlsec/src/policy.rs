//! Waiving of certificate trust failures.
//!
//! Only two failures can ever be waived: a self-signed certificate when
//! [`SecurityOpts::allow_self_signed_cert`] is set, and an unknown issuer when
//! [`SecurityOpts::trust_unknown_authority`] is set. Signature failures,
//! validity errors, unclassified diagnostics and invocation failures always
//! propagate.

use idp_core::SecurityOpts;
use tracing::warn;

use crate::classify::SecurityErrorKind;
use crate::error::{XmlSecError, XmlSecResult};
use crate::options::Operation;

/// Returns whether `err` is waived by `opts`.
#[must_use]
pub fn is_waivable(err: &XmlSecError, opts: &SecurityOpts) -> bool {
    match err.security_kind() {
        Some(SecurityErrorKind::SelfSignedCertificate) => opts.allow_self_signed_cert,
        Some(SecurityErrorKind::UnknownIssuer) => opts.trust_unknown_authority,
        _ => false,
    }
}

/// Gate applied between pipeline stages.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExceptionPolicy {
    opts: SecurityOpts,
}

impl ExceptionPolicy {
    /// Creates a policy from the configured waivers.
    #[must_use]
    pub const fn new(opts: SecurityOpts) -> Self {
        Self { opts }
    }

    /// Returns the configured waivers.
    #[must_use]
    pub const fn opts(&self) -> &SecurityOpts {
        &self.opts
    }

    /// Returns whether `err` is a security exception that must stop the
    /// pipeline.
    #[must_use]
    pub fn is_security_exception(&self, err: &XmlSecError) -> bool {
        !is_waivable(err, &self.opts)
    }

    /// Passes a stage result through the policy.
    ///
    /// A waived failure is logged and replaced by the partial output the
    /// engine produced before failing.
    pub fn gate(&self, operation: Operation, result: XmlSecResult<Vec<u8>>) -> XmlSecResult<Vec<u8>> {
        match result {
            Ok(output) => Ok(output),
            Err(err) if is_waivable(&err, &self.opts) => {
                warn!(
                    operation = %operation,
                    kind = ?err.security_kind(),
                    error = %err,
                    "waiving certificate trust failure"
                );
                match err {
                    XmlSecError::Security(security) => Ok(security.into_output()),
                    other => Err(other),
                }
            }
            Err(err) => Err(err),
        }
    }
}
