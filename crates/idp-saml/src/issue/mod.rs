//! The issuance pipeline.
//!
//! [`AssertionBuilder`] maps a session and its request onto an [`Assertion`],
//! and [`ResponseAssembler`] signs, encrypts and wraps it:
//!
//! ```text
//! Session + IdpAuthnRequest -> Assertion -> sign -> encrypt -> Response
//! ```
//!
//! [`Assertion`]: crate::types::Assertion

mod assembler;
pub mod attributes;
mod builder;
mod request;

pub use assembler::ResponseAssembler;
pub use attributes::build_attributes;
pub use builder::{resolve_recipient, AssertionBuilder};
pub use request::IdpAuthnRequest;
