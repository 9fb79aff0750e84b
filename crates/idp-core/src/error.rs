//! Error handling for the identity provider core.
//!
//! Error messages name the offending setting but never echo key material.

use thiserror::Error;

/// Result type alias using the core error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An environment variable was present but could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv {
        /// Name of the environment variable.
        name: String,
        /// The raw value that failed to parse.
        value: String,
    },
}

impl Error {
    /// Returns whether this error comes from the process environment.
    #[must_use]
    pub const fn is_env_error(&self) -> bool {
        matches!(self, Self::InvalidEnv { .. })
    }
}
