//! SAML data model consumed and produced by the issuance pipeline.

mod assertion;
mod authn_request;
pub mod constants;
mod metadata;
mod name_id;
mod response;
mod session;

pub use assertion::{
    Assertion, Attribute, AttributeStatement, AttributeValue, AuthnStatement, Conditions, Subject,
    SubjectConfirmation, SubjectConfirmationData,
};
pub use authn_request::AuthnRequest;
pub use constants::*;
pub use metadata::{Endpoint, IdpSsoDescriptor, IndexedEndpoint, KeyDescriptor, Metadata, SpSsoDescriptor};
pub use name_id::{Issuer, NameId};
pub use response::{EncryptedAssertionPayload, Response, Status};
pub use session::Session;

pub(crate) use metadata::saml2_protocol;
pub(crate) use response::default_version;
