//! # idp-core
//!
//! Configuration and error handling shared by the identity provider crates.
//!
//! This crate provides the configuration model consumed by the security
//! gateway (`idp-xmlsec`) and the issuance pipeline (`idp-saml`).

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod config;
pub mod error;

pub use config::{
    Config, IdentityProviderConfig, IssuanceConfig, SecurityOpts, ServiceProviderConfig,
    XmlSecConfig,
};
pub use error::{Error, Result};
