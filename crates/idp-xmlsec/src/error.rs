//! Error types for security engine invocations.
//!
//! Failures fall in two families. Classified [`SecurityError`]s are derived
//! from the engine's diagnostic stream and may be waived by policy. Everything
//! else (process start, pipes, exit without diagnostics, deadline) is an
//! invocation failure and always propagates.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::classify::SecurityErrorKind;

/// Result type for security engine operations.
pub type XmlSecResult<T> = Result<T, XmlSecError>;

/// Security engine errors.
#[derive(Debug, Error)]
pub enum XmlSecError {
    /// The engine reported a security failure on its diagnostic stream.
    #[error(transparent)]
    Security(#[from] SecurityError),

    /// The engine process could not be started.
    #[error("failed to start {program}: {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying error.
        #[source]
        source: io::Error,
    },

    /// Writing to or reading from the engine failed.
    #[error("xmlsec io error: {0}")]
    Io(#[from] io::Error),

    /// The engine failed without writing any diagnostics.
    #[error("xmlsec failed with {0}")]
    ExitStatus(ExitStatus),

    /// The engine did not finish before the configured deadline.
    #[error("xmlsec did not finish within {0:?}")]
    Timeout(Duration),

    /// A standard stream of the child was not captured.
    #[error("xmlsec {0} pipe unavailable")]
    MissingPipe(&'static str),
}

impl XmlSecError {
    /// Returns the classified kind if this is a security failure.
    #[must_use]
    pub fn security_kind(&self) -> Option<SecurityErrorKind> {
        match self {
            Self::Security(err) => Some(err.kind()),
            _ => None,
        }
    }
}

/// A security failure reported by the engine.
///
/// Carries whatever the engine wrote to its output stream before failing, so
/// that a waived failure can continue with those bytes.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SecurityError {
    kind: SecurityErrorKind,
    message: String,
    output: Vec<u8>,
}

impl SecurityError {
    /// Creates a security error from the engine's diagnostic text.
    #[must_use]
    pub fn new(kind: SecurityErrorKind, diagnostic: &str, output: Vec<u8>) -> Self {
        Self {
            kind,
            message: format!("xmlsec: {}", diagnostic.trim()),
            output,
        }
    }

    /// Returns the classified kind.
    #[must_use]
    pub const fn kind(&self) -> SecurityErrorKind {
        self.kind
    }

    /// Returns the error message (`xmlsec: <diagnostic>`).
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the partial output produced before the failure.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Consumes the error, returning the partial output.
    #[must_use]
    pub fn into_output(self) -> Vec<u8> {
        self.output
    }
}
