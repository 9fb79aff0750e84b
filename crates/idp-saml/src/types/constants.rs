//! SAML 2.0 constants and URIs.

/// SAML 2.0 assertion namespace.
pub const SAML_NS: &str = "urn:oasis:names:tc:SAML:2.0:assertion";

/// SAML 2.0 protocol namespace.
pub const SAMLP_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";

/// SAML 2.0 metadata namespace.
pub const MD_NS: &str = "urn:oasis:names:tc:SAML:2.0:metadata";

/// XML Schema instance namespace.
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// XML Schema namespace.
pub const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// SAML protocol version.
pub const SAML_VERSION: &str = "2.0";

/// `xsi:type` of every attribute value issued.
pub const XS_STRING: &str = "xs:string";

/// XML declaration emitted by the engine and stripped from its output.
pub const XML_DECLARATION: &str = r#"<?xml version="1.0"?>"#;

/// Binding URIs.
pub mod bindings {
    /// HTTP-POST binding.
    pub const HTTP_POST: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST";
    /// HTTP-Redirect binding.
    pub const HTTP_REDIRECT: &str = "urn:oasis:names:tc:SAML:2.0:bindings:HTTP-Redirect";
}

/// Name identifier format URIs.
pub mod name_id_formats {
    /// Transient identifier.
    pub const TRANSIENT: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:transient";
    /// Entity identifier, used for issuers.
    pub const ENTITY: &str = "urn:oasis:names:tc:SAML:2.0:nameid-format:entity";
}

/// Attribute name format URIs.
pub mod attrname_formats {
    /// URI-named attributes.
    pub const URI: &str = "urn:oasis:names:tc:SAML:2.0:attrname-format:uri";
}

/// Status code URIs.
pub mod status_codes {
    /// The request succeeded.
    pub const SUCCESS: &str = "urn:oasis:names:tc:SAML:2.0:status:Success";
    /// The request could not be performed due to an error on the requester's side.
    pub const REQUESTER: &str = "urn:oasis:names:tc:SAML:2.0:status:Requester";
    /// The request could not be performed due to an error on the responder's side.
    pub const RESPONDER: &str = "urn:oasis:names:tc:SAML:2.0:status:Responder";
}

/// Subject confirmation method for bearer assertions.
pub const CM_BEARER: &str = "urn:oasis:names:tc:SAML:2.0:cm:bearer";

/// Authentication context class for password over a protected transport.
pub const AC_PASSWORD_PROTECTED_TRANSPORT: &str =
    "urn:oasis:names:tc:SAML:2.0:ac:classes:PasswordProtectedTransport";

/// Key descriptor `use` values.
pub mod key_use {
    /// Signing key.
    pub const SIGNING: &str = "signing";
    /// Encryption key.
    pub const ENCRYPTION: &str = "encryption";
}
