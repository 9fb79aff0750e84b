//! Algorithm identifiers used in signature and encryption templates.
//!
//! The engine reads algorithm choices from the template it completes, so
//! these enums only ever produce URIs. No cryptography happens in-process.

/// XML-DSig namespace.
pub const XMLDSIG_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// XML-Enc namespace.
pub const XMLENC_NS: &str = "http://www.w3.org/2001/04/xmlenc#";

/// Enveloped signature transform.
pub const ENVELOPED_SIGNATURE: &str = "http://www.w3.org/2000/09/xmldsig#enveloped-signature";

/// Signature algorithm URIs.
pub mod signature_uris {
    /// RSA with SHA-256.
    pub const RSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256";
    /// RSA with SHA-384.
    pub const RSA_SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384";
    /// RSA with SHA-512.
    pub const RSA_SHA512: &str = "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512";
    /// ECDSA with SHA-256.
    pub const ECDSA_SHA256: &str = "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256";
}

/// Digest algorithm URIs.
pub mod digest_uris {
    /// SHA-256.
    pub const SHA256: &str = "http://www.w3.org/2001/04/xmlenc#sha256";
    /// SHA-384.
    pub const SHA384: &str = "http://www.w3.org/2001/04/xmldsig-more#sha384";
    /// SHA-512.
    pub const SHA512: &str = "http://www.w3.org/2001/04/xmlenc#sha512";
}

/// Encryption algorithm URIs.
pub mod encryption_uris {
    /// AES-128 in CBC mode.
    pub const AES128_CBC: &str = "http://www.w3.org/2001/04/xmlenc#aes128-cbc";
    /// AES-192 in CBC mode.
    pub const AES192_CBC: &str = "http://www.w3.org/2001/04/xmlenc#aes192-cbc";
    /// AES-256 in CBC mode.
    pub const AES256_CBC: &str = "http://www.w3.org/2001/04/xmlenc#aes256-cbc";
    /// RSA-OAEP key transport with MGF1.
    pub const RSA_OAEP_MGF1P: &str = "http://www.w3.org/2001/04/xmlenc#rsa-oaep-mgf1p";
}

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256.
    #[default]
    RsaSha256,
    /// RSA with SHA-384.
    RsaSha384,
    /// RSA with SHA-512.
    RsaSha512,
    /// ECDSA with SHA-256.
    EcdsaSha256,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_uris::RSA_SHA256,
            Self::RsaSha384 => signature_uris::RSA_SHA384,
            Self::RsaSha512 => signature_uris::RSA_SHA512,
            Self::EcdsaSha256 => signature_uris::ECDSA_SHA256,
        }
    }

    /// Returns the matching digest algorithm URI.
    #[must_use]
    pub const fn digest_uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 | Self::EcdsaSha256 => digest_uris::SHA256,
            Self::RsaSha384 => digest_uris::SHA384,
            Self::RsaSha512 => digest_uris::SHA512,
        }
    }
}

/// Canonicalization algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CanonicalizationAlgorithm {
    /// Exclusive C14N without comments.
    #[default]
    ExclusiveC14N,
    /// Inclusive C14N without comments.
    C14N,
}

impl CanonicalizationAlgorithm {
    /// Returns the URI for this canonicalization algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::ExclusiveC14N => "http://www.w3.org/2001/10/xml-exc-c14n#",
            Self::C14N => "http://www.w3.org/TR/2001/REC-xml-c14n-20010315",
        }
    }
}

/// Symmetric cipher for the encrypted payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockEncryption {
    /// AES-128-CBC.
    #[default]
    Aes128Cbc,
    /// AES-192-CBC.
    Aes192Cbc,
    /// AES-256-CBC.
    Aes256Cbc,
}

impl BlockEncryption {
    /// All ciphers advertised in IdP metadata.
    pub const ALL: [Self; 3] = [Self::Aes128Cbc, Self::Aes192Cbc, Self::Aes256Cbc];

    /// Returns the XML-Enc URI.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::Aes128Cbc => encryption_uris::AES128_CBC,
            Self::Aes192Cbc => encryption_uris::AES192_CBC,
            Self::Aes256Cbc => encryption_uris::AES256_CBC,
        }
    }

    /// Returns the engine's session key specification for this cipher.
    #[must_use]
    pub const fn session_key(&self) -> &'static str {
        match self {
            Self::Aes128Cbc => "aes-128-cbc",
            Self::Aes192Cbc => "aes-192-cbc",
            Self::Aes256Cbc => "aes-256-cbc",
        }
    }
}

/// Key transport algorithm wrapping the session key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyTransport {
    /// RSA-OAEP with MGF1.
    #[default]
    RsaOaepMgf1p,
}

impl KeyTransport {
    /// Returns the XML-Enc URI.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaOaepMgf1p => encryption_uris::RSA_OAEP_MGF1P,
        }
    }
}
