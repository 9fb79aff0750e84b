//! SAML 2.0 assertion issuance for the identity provider.
//!
//! This crate turns an authenticated session and the request that started it
//! into a protocol response carrying a signed, encrypted assertion:
//!
//! - **Assertion building** - Subject, conditions, authentication and attribute statements
//! - **Response assembly** - Sign, encrypt and wrap through the `xmlsec1` engine
//! - **Metadata** - IdP metadata generation, SP metadata parsing and retrieval
//! - **Key material** - Configured key files or inline PEM in scoped temporary files
//!
//! # Architecture
//!
//! - [`types`] - SAML data model and constants
//! - [`issue`] - [`AssertionBuilder`] and [`ResponseAssembler`]
//! - [`provider`] - [`IdentityProvider`], which owns configuration and collaborators
//! - [`metadata_client`] - Service provider metadata retrieval
//! - [`keys`] - Key and certificate files handed to the engine
//! - [`clock`] - Injectable time and identifier sources
//! - [`error`] - Error types for issuance
//!
//! # Example
//!
//! ```rust,ignore
//! use idp_core::Config;
//! use idp_saml::{IdentityProvider, IdpAuthnRequest};
//!
//! let idp = IdentityProvider::new(Config::from_env()?)?;
//! let request = IdpAuthnRequest::from_xml(&request_xml)?.with_address(peer);
//! let response = idp.issue(&request, &session).await?;
//! let xml = response.to_xml()?;
//! ```
//!
//! # SAML Specifications
//!
//! - [SAML 2.0 Core](https://docs.oasis-open.org/security/saml/v2.0/saml-core-2.0-os.pdf)
//! - [SAML 2.0 Metadata](https://docs.oasis-open.org/security/saml/v2.0/saml-metadata-2.0-os.pdf)
//! - [XML Encryption](https://www.w3.org/TR/xmlenc-core1/)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod error;
pub mod issue;
pub mod keys;
pub mod metadata_client;
pub mod provider;
pub mod types;
mod xml;

pub use clock::{Clock, FixedClock, IdGenerator, SequentialIdGenerator, SystemClock, UuidIdGenerator};
pub use error::{SamlError, SamlResult};
pub use issue::{AssertionBuilder, IdpAuthnRequest, ResponseAssembler};
pub use metadata_client::{HttpMetadataFetcher, MetadataFetcher};
pub use provider::IdentityProvider;
pub use types::*;
