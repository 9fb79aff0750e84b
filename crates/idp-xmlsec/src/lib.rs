//! Security operations for SAML documents through the `xmlsec1` engine.
//!
//! This crate never parses or validates signatures itself. Every operation
//! pipes the document through an external engine process and turns the
//! engine's diagnostic output into a typed error:
//!
//! - [`engine`] - The [`SecurityEngine`] capability and its [`Xmlsec1`] subprocess implementation
//! - [`classify`] - Mapping of diagnostic text onto [`SecurityErrorKind`]
//! - [`policy`] - Waiving of trust failures according to [`SecurityOpts`]
//! - [`template`] - XML-DSig and XML-Enc templates completed by the engine
//! - [`options`] - Per-invocation options and engine argument construction
//!
//! # Example
//!
//! ```rust,ignore
//! use idp_xmlsec::{ExceptionPolicy, SecurityEngine, ValidationOptions, Xmlsec1};
//!
//! let engine = Xmlsec1::new();
//! let signed = engine
//!     .sign(xml.as_bytes(), key_path, &ValidationOptions::id_attr_hack())
//!     .await;
//! let signed = ExceptionPolicy::new(opts).gate(Operation::Sign, signed)?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod algorithms;
pub mod classify;
pub mod engine;
pub mod error;
pub mod options;
pub mod policy;
pub mod template;

pub use algorithms::{BlockEncryption, CanonicalizationAlgorithm, KeyTransport, SignatureAlgorithm};
pub use classify::{classify, SecurityErrorKind};
pub use engine::{SecurityEngine, Xmlsec1};
pub use error::{SecurityError, XmlSecError, XmlSecResult};
pub use idp_core::SecurityOpts;
pub use options::{Invocation, Operation, ValidationOptions};
pub use policy::{is_waivable, ExceptionPolicy};
pub use template::{EncryptedDataTemplate, SignatureTemplate};
