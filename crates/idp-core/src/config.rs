//! Configuration management for the identity provider.
//!
//! Configuration can be built in code, deserialized with serde, or loaded
//! from `IDP_*` environment variables (a `.env` file is honoured).

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default assertion lifetime in seconds.
pub const DEFAULT_ASSERTION_LIFETIME_SECS: u64 = 90;

/// Default validity of generated IdP metadata in seconds (two days).
pub const DEFAULT_METADATA_VALID_SECS: u64 = 2 * 24 * 60 * 60;

/// Default lifetime of a cached service provider metadata document in seconds.
pub const DEFAULT_SP_METADATA_CACHE_TTL_SECS: u64 = 60 * 60;

/// Default number of service provider metadata documents kept in memory.
pub const DEFAULT_SP_METADATA_CACHE_CAPACITY: usize = 64;

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Identity provider identity and key material.
    pub identity_provider: IdentityProviderConfig,
    /// Security check waivers.
    pub security: SecurityOpts,
    /// Service provider settings.
    pub service_provider: ServiceProviderConfig,
    /// External security engine settings.
    pub xmlsec: XmlSecConfig,
    /// Assertion issuance settings.
    pub issuance: IssuanceConfig,
}

/// Identity provider configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityProviderConfig {
    /// Identifier of the IdP entity (must be a URI).
    pub entity_id: String,
    /// URL where the IdP metadata is published. Used as the issuer value.
    pub metadata_url: String,
    /// Single sign-on service URL.
    pub sso_url: String,
    /// Filesystem location of the private key.
    pub key_file: Option<PathBuf>,
    /// Filesystem location of the certificate.
    pub cert_file: Option<PathBuf>,
    /// Inline PEM private key, used when `key_file` is not set.
    #[serde(skip_serializing)]
    pub private_key_pem: Option<String>,
    /// Inline PEM certificate, used when `cert_file` is not set.
    pub certificate_pem: Option<String>,
}

/// Waivers for certificate trust failures reported by the security engine.
///
/// Both waivers default to `false`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityOpts {
    /// Accept self-signed certificates.
    pub allow_self_signed_cert: bool,
    /// Trust certificates issued by an unrecognized authority.
    pub trust_unknown_authority: bool,
}

/// Service provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceProviderConfig {
    /// URL of the service provider metadata document.
    pub metadata_url: Option<String>,
    /// Explicit assertion consumer service URL.
    pub acs_url: Option<String>,
    /// Inline service provider metadata XML.
    pub metadata_xml: Option<String>,
    /// Seconds a fetched metadata document is reused. A document's own
    /// `validUntil` shortens this.
    pub metadata_cache_ttl_secs: u64,
    /// Maximum number of fetched metadata documents kept. Zero disables
    /// caching.
    pub metadata_cache_capacity: usize,
}

impl Default for ServiceProviderConfig {
    fn default() -> Self {
        Self {
            metadata_url: None,
            acs_url: None,
            metadata_xml: None,
            metadata_cache_ttl_secs: DEFAULT_SP_METADATA_CACHE_TTL_SECS,
            metadata_cache_capacity: DEFAULT_SP_METADATA_CACHE_CAPACITY,
        }
    }
}

impl ServiceProviderConfig {
    /// Returns how long a fetched metadata document is reused.
    #[must_use]
    pub const fn metadata_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.metadata_cache_ttl_secs)
    }
}

/// External security engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlSecConfig {
    /// Engine executable.
    pub binary: PathBuf,
    /// Arguments placed before the engine arguments (for wrappers).
    pub launcher_args: Vec<String>,
    /// Deadline for a single invocation. `None` waits indefinitely.
    pub timeout_secs: Option<u64>,
    /// Directory for temporary template files.
    pub temp_dir: Option<PathBuf>,
}

impl Default for XmlSecConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("xmlsec1"),
            launcher_args: Vec::new(),
            timeout_secs: None,
            temp_dir: None,
        }
    }
}

impl XmlSecConfig {
    /// Returns the invocation deadline, if any.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Assertion issuance configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IssuanceConfig {
    /// How long an issued assertion stays valid, in seconds.
    pub assertion_lifetime_secs: u64,
    /// How long generated IdP metadata stays valid, in seconds.
    pub metadata_valid_secs: u64,
}

impl Default for IssuanceConfig {
    fn default() -> Self {
        Self {
            assertion_lifetime_secs: DEFAULT_ASSERTION_LIFETIME_SECS,
            metadata_valid_secs: DEFAULT_METADATA_VALID_SECS,
        }
    }
}

impl IssuanceConfig {
    /// Returns the assertion lifetime.
    #[must_use]
    pub const fn assertion_lifetime(&self) -> Duration {
        Duration::from_secs(self.assertion_lifetime_secs)
    }

    /// Returns the metadata validity window.
    #[must_use]
    pub const fn metadata_validity(&self) -> Duration {
        Duration::from_secs(self.metadata_valid_secs)
    }
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let identity_provider = IdentityProviderConfig {
            entity_id: var("IDP_ENTITY_ID").unwrap_or_default(),
            metadata_url: var("IDP_METADATA_URL").unwrap_or_default(),
            sso_url: var("IDP_SSO_URL").unwrap_or_default(),
            key_file: var("IDP_KEY_FILE").map(PathBuf::from),
            cert_file: var("IDP_CERT_FILE").map(PathBuf::from),
            private_key_pem: var("IDP_PRIVATE_KEY_PEM"),
            certificate_pem: var("IDP_CERTIFICATE_PEM"),
        };

        let security = SecurityOpts {
            allow_self_signed_cert: parse_bool("IDP_ALLOW_SELF_SIGNED_CERT", var("IDP_ALLOW_SELF_SIGNED_CERT"))?
                .unwrap_or(false),
            trust_unknown_authority: parse_bool("IDP_TRUST_UNKNOWN_AUTHORITY", var("IDP_TRUST_UNKNOWN_AUTHORITY"))?
                .unwrap_or(false),
        };

        let service_provider = ServiceProviderConfig {
            metadata_url: var("IDP_SP_METADATA_URL"),
            acs_url: var("IDP_SP_ACS_URL"),
            metadata_xml: var("IDP_SP_METADATA_XML"),
            metadata_cache_ttl_secs: parse_u64(
                "IDP_SP_METADATA_CACHE_TTL_SECS",
                var("IDP_SP_METADATA_CACHE_TTL_SECS"),
            )?
            .unwrap_or(defaults.service_provider.metadata_cache_ttl_secs),
            metadata_cache_capacity: parse_u64(
                "IDP_SP_METADATA_CACHE_CAPACITY",
                var("IDP_SP_METADATA_CACHE_CAPACITY"),
            )?
            .map_or(defaults.service_provider.metadata_cache_capacity, |n| {
                usize::try_from(n).unwrap_or(usize::MAX)
            }),
        };

        let xmlsec = XmlSecConfig {
            binary: var("IDP_XMLSEC_BINARY")
                .map(PathBuf::from)
                .unwrap_or(defaults.xmlsec.binary),
            launcher_args: var("IDP_XMLSEC_LAUNCHER")
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or_default(),
            timeout_secs: parse_u64("IDP_XMLSEC_TIMEOUT_SECS", var("IDP_XMLSEC_TIMEOUT_SECS"))?,
            temp_dir: var("IDP_XMLSEC_TEMP_DIR").map(PathBuf::from),
        };

        let issuance = IssuanceConfig {
            assertion_lifetime_secs: parse_u64(
                "IDP_ASSERTION_LIFETIME_SECS",
                var("IDP_ASSERTION_LIFETIME_SECS"),
            )?
            .unwrap_or(defaults.issuance.assertion_lifetime_secs),
            metadata_valid_secs: parse_u64("IDP_METADATA_VALID_SECS", var("IDP_METADATA_VALID_SECS"))?
                .unwrap_or(defaults.issuance.metadata_valid_secs),
        };

        let config = Self {
            identity_provider,
            security,
            service_provider,
            xmlsec,
            issuance,
        };
        tracing::debug!(
            entity_id = %config.identity_provider.entity_id,
            xmlsec = %config.xmlsec.binary.display(),
            "loaded identity provider configuration"
        );
        Ok(config)
    }

    /// Checks that the configuration names a private key and a certificate.
    pub fn validate(&self) -> Result<()> {
        let idp = &self.identity_provider;
        if idp.key_file.is_none() && idp.private_key_pem.is_none() {
            return Err(Error::Config("missing idp private key".to_string()));
        }
        if idp.cert_file.is_none() && idp.certificate_pem.is_none() {
            return Err(Error::Config("missing idp public key".to_string()));
        }
        if self.issuance.assertion_lifetime_secs == 0 {
            return Err(Error::Config("assertion lifetime must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_bool(name: &str, value: Option<String>) -> Result<Option<bool>> {
    let Some(value) = value else {
        return Ok(None);
    };
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(Some(true)),
        "0" | "false" | "no" | "off" => Ok(Some(false)),
        _ => Err(Error::InvalidEnv {
            name: name.to_string(),
            value,
        }),
    }
}

fn parse_u64(name: &str, value: Option<String>) -> Result<Option<u64>> {
    value
        .map(|v| {
            v.trim().parse().map_err(|_| Error::InvalidEnv {
                name: name.to_string(),
                value: v,
            })
        })
        .transpose()
}
