//! Templates completed by the engine.
//!
//! A signature template is embedded in the document before signing and the
//! engine fills in its digest and signature values. An encryption template is
//! written to a file and the engine fills in its cipher values with the
//! document read from standard input.

use quick_xml::escape::escape;

use crate::algorithms::{
    BlockEncryption, CanonicalizationAlgorithm, KeyTransport, SignatureAlgorithm, ENVELOPED_SIGNATURE,
    XMLDSIG_NS, XMLENC_NS,
};

/// Type URI of an encrypted XML element.
pub const ENCRYPTED_ELEMENT_TYPE: &str = "http://www.w3.org/2001/04/xmlenc#Element";

/// An enveloped `<ds:Signature>` template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTemplate {
    reference_id: String,
    algorithm: SignatureAlgorithm,
    canonicalization: CanonicalizationAlgorithm,
    certificate: Option<String>,
}

impl SignatureTemplate {
    /// Creates a template referencing the element with the given `ID`.
    #[must_use]
    pub fn new(reference_id: impl Into<String>) -> Self {
        Self {
            reference_id: reference_id.into(),
            algorithm: SignatureAlgorithm::default(),
            canonicalization: CanonicalizationAlgorithm::default(),
            certificate: None,
        }
    }

    /// Sets the signature algorithm.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Sets the canonicalization algorithm.
    #[must_use]
    pub const fn with_canonicalization(mut self, canonicalization: CanonicalizationAlgorithm) -> Self {
        self.canonicalization = canonicalization;
        self
    }

    /// Embeds a certificate in `KeyInfo`, given as PEM or bare base64.
    #[must_use]
    pub fn with_certificate(mut self, certificate: &str) -> Self {
        let body = pem_body(certificate);
        self.certificate = (!body.is_empty()).then_some(body);
        self
    }

    /// Returns the referenced element `ID`.
    #[must_use]
    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    /// Returns the embedded certificate as base64 DER.
    #[must_use]
    pub fn certificate(&self) -> Option<&str> {
        self.certificate.as_deref()
    }

    /// Serializes the template with empty digest and signature values.
    #[must_use]
    pub fn to_xml(&self) -> String {
        let mut xml = format!(
            r##"<ds:Signature xmlns:ds="{ns}"><ds:SignedInfo><ds:CanonicalizationMethod Algorithm="{c14n}"/><ds:SignatureMethod Algorithm="{sig}"/><ds:Reference URI="#{reference}"><ds:Transforms><ds:Transform Algorithm="{enveloped}"/><ds:Transform Algorithm="{c14n}"/></ds:Transforms><ds:DigestMethod Algorithm="{digest}"/><ds:DigestValue></ds:DigestValue></ds:Reference></ds:SignedInfo><ds:SignatureValue></ds:SignatureValue>"##,
            ns = XMLDSIG_NS,
            c14n = self.canonicalization.uri(),
            sig = self.algorithm.uri(),
            reference = escape(&self.reference_id),
            enveloped = ENVELOPED_SIGNATURE,
            digest = self.algorithm.digest_uri(),
        );
        if let Some(cert) = &self.certificate {
            xml.push_str(&format!(
                "<ds:KeyInfo><ds:X509Data><ds:X509Certificate>{cert}</ds:X509Certificate></ds:X509Data></ds:KeyInfo>"
            ));
        }
        xml.push_str("</ds:Signature>");
        xml
    }
}

/// An `<xenc:EncryptedData>` template with a transported session key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncryptedDataTemplate {
    block: BlockEncryption,
    key_transport: KeyTransport,
}

impl EncryptedDataTemplate {
    /// Creates a template for the given cipher and key transport.
    #[must_use]
    pub const fn new(block: BlockEncryption, key_transport: KeyTransport) -> Self {
        Self {
            block,
            key_transport,
        }
    }

    /// Returns the payload cipher.
    #[must_use]
    pub const fn block(&self) -> BlockEncryption {
        self.block
    }

    /// Returns the key transport algorithm.
    #[must_use]
    pub const fn key_transport(&self) -> KeyTransport {
        self.key_transport
    }

    /// Returns the engine's session key specification.
    #[must_use]
    pub const fn session_key(&self) -> &'static str {
        self.block.session_key()
    }

    /// Serializes the template with empty cipher values.
    #[must_use]
    pub fn to_xml(&self) -> String {
        format!(
            r#"<xenc:EncryptedData xmlns:xenc="{xenc}" Type="{ty}"><xenc:EncryptionMethod Algorithm="{block}"/><ds:KeyInfo xmlns:ds="{ds}"><xenc:EncryptedKey><xenc:EncryptionMethod Algorithm="{transport}"/><xenc:CipherData><xenc:CipherValue></xenc:CipherValue></xenc:CipherData></xenc:EncryptedKey></ds:KeyInfo><xenc:CipherData><xenc:CipherValue></xenc:CipherValue></xenc:CipherData></xenc:EncryptedData>"#,
            xenc = XMLENC_NS,
            ty = ENCRYPTED_ELEMENT_TYPE,
            block = self.block.uri(),
            ds = XMLDSIG_NS,
            transport = self.key_transport.uri(),
        )
    }
}

/// Strips PEM armour and whitespace, leaving the base64 body.
#[must_use]
pub fn pem_body(pem: &str) -> String {
    pem.lines()
        .filter(|line| !line.trim_start().starts_with("-----"))
        .flat_map(|line| line.chars().filter(|c| !c.is_whitespace()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIB\nAQAB\n-----END CERTIFICATE-----\n";

    #[test]
    fn signature_template_references_element() {
        let xml = SignatureTemplate::new("id-abc").with_certificate(PEM).to_xml();
        assert!(xml.starts_with(r#"<ds:Signature xmlns:ds="http://www.w3.org/2000/09/xmldsig#">"#));
        assert!(xml.contains(r##"<ds:Reference URI="#id-abc">"##));
        assert!(xml.contains("<ds:DigestValue></ds:DigestValue>"));
        assert!(xml.contains("<ds:SignatureValue></ds:SignatureValue>"));
        assert!(xml.contains("<ds:X509Certificate>MIIBAQAB</ds:X509Certificate>"));
        assert!(xml.contains("rsa-sha256"));
        assert!(xml.ends_with("</ds:Signature>"));
    }

    #[test]
    fn signature_template_uses_chosen_algorithms() {
        let xml = SignatureTemplate::new("id-abc")
            .with_algorithm(SignatureAlgorithm::RsaSha512)
            .with_canonicalization(CanonicalizationAlgorithm::C14N)
            .to_xml();
        assert!(xml.contains(r#"<ds:SignatureMethod Algorithm="http://www.w3.org/2001/04/xmldsig-more#rsa-sha512"/>"#));
        assert!(xml.contains(r#"<ds:DigestMethod Algorithm="http://www.w3.org/2001/04/xmlenc#sha512"/>"#));
        assert_eq!(
            xml.matches(r#"Algorithm="http://www.w3.org/TR/2001/REC-xml-c14n-20010315""#).count(),
            2
        );
        assert!(!xml.contains("xml-exc-c14n"));

        let xml = SignatureTemplate::new("id-abc")
            .with_algorithm(SignatureAlgorithm::EcdsaSha256)
            .to_xml();
        assert!(xml.contains("ecdsa-sha256"));
        assert!(xml.contains(r#"Algorithm="http://www.w3.org/2001/10/xml-exc-c14n#""#));
    }

    #[test]
    fn signature_template_without_certificate_has_no_key_info() {
        let template = SignatureTemplate::new("x").with_certificate("");
        assert_eq!(template.certificate(), None);
        assert!(!template.to_xml().contains("KeyInfo"));
    }

    #[test]
    fn signature_template_escapes_reference() {
        let xml = SignatureTemplate::new(r#"a"b"#).to_xml();
        assert!(xml.contains(r##"URI="#a&quot;b""##));
    }

    #[test]
    fn encrypted_data_template_names_algorithms() {
        let template = EncryptedDataTemplate::default();
        let xml = template.to_xml();
        assert!(xml.contains(r#"Type="http://www.w3.org/2001/04/xmlenc#Element""#));
        assert!(xml.contains(r#"Algorithm="http://www.w3.org/2001/04/xmlenc#aes128-cbc""#));
        assert!(xml.contains(r#"Algorithm="http://www.w3.org/2001/04/xmlenc#rsa-oaep-mgf1p""#));
        assert_eq!(template.session_key(), "aes-128-cbc");
    }

    #[test]
    fn pem_body_strips_armour() {
        assert_eq!(pem_body(PEM), "MIIBAQAB");
        assert_eq!(pem_body("  MIIB AQAB\n"), "MIIBAQAB");
    }
}
