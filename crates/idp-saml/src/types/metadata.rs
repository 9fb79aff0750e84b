//! SAML metadata documents.
//!
//! Covers the subset of `md:EntityDescriptor` the issuance pipeline reads and
//! writes: SSO descriptors, key descriptors with their encryption methods,
//! name identifier formats and endpoints.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::constants::{bindings, key_use, MD_NS, SAMLP_NS};
use crate::error::{SamlError, SamlResult};
use crate::xml::{attribute, format_instant, parse_instant, XmlWriter};

const DS_NS: &str = "http://www.w3.org/2000/09/xmldsig#";

/// An entity descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Entity identifier.
    pub entity_id: String,
    /// End of the document's validity.
    pub valid_until: Option<DateTime<Utc>>,
    /// Identity provider role.
    pub idp_sso_descriptor: Option<IdpSsoDescriptor>,
    /// Service provider role.
    pub sp_sso_descriptor: Option<SpSsoDescriptor>,
}

/// Identity provider SSO descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdpSsoDescriptor {
    /// Supported protocol namespaces.
    pub protocol_support_enumeration: String,
    /// Signing and encryption keys.
    pub key_descriptors: Vec<KeyDescriptor>,
    /// Supported name identifier formats.
    pub name_id_formats: Vec<String>,
    /// Single sign-on endpoints.
    pub single_sign_on_services: Vec<Endpoint>,
}

/// Service provider SSO descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpSsoDescriptor {
    /// Supported protocol namespaces.
    pub protocol_support_enumeration: String,
    /// Signing and encryption keys.
    pub key_descriptors: Vec<KeyDescriptor>,
    /// Supported name identifier formats.
    pub name_id_formats: Vec<String>,
    /// Assertion consumer endpoints, in document order.
    pub assertion_consumer_services: Vec<IndexedEndpoint>,
}

impl SpSsoDescriptor {
    /// Returns the first consumer endpoint using the POST binding.
    #[must_use]
    pub fn first_post_endpoint(&self) -> Option<&IndexedEndpoint> {
        self.assertion_consumer_services
            .iter()
            .find(|acs| acs.binding == bindings::HTTP_POST)
    }

    /// Returns the certificate to encrypt for.
    ///
    /// Prefers a key marked for encryption, then any key carrying a
    /// certificate.
    #[must_use]
    pub fn encryption_certificate(&self) -> Option<&str> {
        self.key_descriptors
            .iter()
            .find(|kd| kd.key_use.as_deref() == Some(key_use::ENCRYPTION))
            .map(|kd| kd.certificate.as_str())
            .filter(|cert| !cert.is_empty())
            .or_else(|| {
                self.key_descriptors
                    .iter()
                    .map(|kd| kd.certificate.as_str())
                    .find(|cert| !cert.is_empty())
            })
    }
}

/// A key descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDescriptor {
    /// `signing`, `encryption`, or unspecified.
    pub key_use: Option<String>,
    /// Base64 DER certificate.
    pub certificate: String,
    /// Supported encryption algorithm URIs.
    pub encryption_methods: Vec<String>,
}

/// A protocol endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    /// Binding URI.
    pub binding: String,
    /// Endpoint URL.
    pub location: String,
}

/// An indexed protocol endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexedEndpoint {
    /// Binding URI.
    pub binding: String,
    /// Endpoint URL.
    pub location: String,
    /// Endpoint index.
    pub index: u32,
    /// Whether this is the default endpoint.
    pub is_default: Option<bool>,
}

impl IndexedEndpoint {
    /// Creates an endpoint.
    #[must_use]
    pub fn new(binding: impl Into<String>, location: impl Into<String>, index: u32) -> Self {
        Self {
            binding: binding.into(),
            location: location.into(),
            index,
            is_default: None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    None,
    Idp,
    Sp,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Certificate,
    NameIdFormat,
}

impl Metadata {
    /// Returns the certificate of the first signing key in the IdP role.
    #[must_use]
    pub fn idp_signing_certificate(&self) -> Option<&str> {
        self.idp_sso_descriptor
            .as_ref()?
            .key_descriptors
            .iter()
            .find(|kd| kd.key_use.as_deref() != Some(key_use::ENCRYPTION) && !kd.certificate.is_empty())
            .map(|kd| kd.certificate.as_str())
    }

    /// Parses an entity descriptor.
    ///
    /// The first `EntityDescriptor` in the document is read, so an
    /// `EntitiesDescriptor` wrapper is accepted. Prefixes are ignored.
    pub fn from_xml(xml: &str) -> SamlResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut metadata: Option<Self> = None;
        let mut role = Role::None;
        let mut key: Option<KeyDescriptor> = None;
        let mut target = TextTarget::None;

        loop {
            let event = reader.read_event()?;
            let is_empty = matches!(event, Event::Empty(_));
            match event {
                Event::Start(tag) | Event::Empty(tag) => {
                    let name = tag.local_name();
                    match name.as_ref() {
                        b"EntityDescriptor" => {
                            if metadata.is_some() {
                                break;
                            }
                            metadata = Some(Self {
                                entity_id: attribute(&tag, "entityID")?.unwrap_or_default(),
                                valid_until: attribute(&tag, "validUntil")?
                                    .map(|v| parse_instant(&v))
                                    .transpose()?,
                                ..Self::default()
                            });
                        }
                        b"IDPSSODescriptor" => {
                            role = Role::Idp;
                            if let Some(md) = metadata.as_mut() {
                                md.idp_sso_descriptor = Some(IdpSsoDescriptor {
                                    protocol_support_enumeration: protocols(&tag)?,
                                    ..IdpSsoDescriptor::default()
                                });
                            }
                        }
                        b"SPSSODescriptor" => {
                            role = Role::Sp;
                            if let Some(md) = metadata.as_mut() {
                                md.sp_sso_descriptor = Some(SpSsoDescriptor {
                                    protocol_support_enumeration: protocols(&tag)?,
                                    ..SpSsoDescriptor::default()
                                });
                            }
                        }
                        b"KeyDescriptor" if role != Role::None => {
                            key = Some(KeyDescriptor {
                                key_use: attribute(&tag, "use")?,
                                ..KeyDescriptor::default()
                            });
                            if is_empty {
                                push_key(metadata.as_mut(), role, key.take());
                            }
                        }
                        b"X509Certificate" if key.is_some() && !is_empty => {
                            target = TextTarget::Certificate;
                        }
                        b"EncryptionMethod" => {
                            if let (Some(kd), Some(alg)) = (key.as_mut(), attribute(&tag, "Algorithm")?) {
                                kd.encryption_methods.push(alg);
                            }
                        }
                        b"NameIDFormat" if role != Role::None && !is_empty => {
                            target = TextTarget::NameIdFormat;
                        }
                        b"SingleSignOnService" if role == Role::Idp => {
                            let endpoint = endpoint(&tag)?;
                            if let Some(idp) = metadata.as_mut().and_then(|m| m.idp_sso_descriptor.as_mut()) {
                                idp.single_sign_on_services.push(endpoint);
                            }
                        }
                        b"AssertionConsumerService" if role == Role::Sp => {
                            let endpoint = indexed_endpoint(&tag)?;
                            if let Some(sp) = metadata.as_mut().and_then(|m| m.sp_sso_descriptor.as_mut()) {
                                sp.assertion_consumer_services.push(endpoint);
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(text) => {
                    let value: String = text.unescape()?.split_whitespace().collect::<Vec<_>>().join("");
                    match target {
                        TextTarget::Certificate => {
                            if let Some(kd) = key.as_mut() {
                                kd.certificate.push_str(&value);
                            }
                        }
                        TextTarget::NameIdFormat => push_name_id_format(metadata.as_mut(), role, value),
                        TextTarget::None => {}
                    }
                }
                Event::End(tag) => match tag.local_name().as_ref() {
                    b"X509Certificate" | b"NameIDFormat" => target = TextTarget::None,
                    b"KeyDescriptor" => push_key(metadata.as_mut(), role, key.take()),
                    b"IDPSSODescriptor" | b"SPSSODescriptor" => role = Role::None,
                    b"EntityDescriptor" => break,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }

        metadata.ok_or_else(|| SamlError::XmlParse("no EntityDescriptor element".to_string()))
    }

    /// Serializes the entity descriptor.
    pub fn to_xml(&self) -> SamlResult<String> {
        let valid_until = self.valid_until.as_ref().map(format_instant).unwrap_or_default();
        let mut w = XmlWriter::new();
        w.start(
            "md:EntityDescriptor",
            &[
                ("xmlns:md", MD_NS),
                ("xmlns:ds", DS_NS),
                ("entityID", self.entity_id.as_str()),
                ("validUntil", valid_until.as_str()),
            ],
        )?;
        if let Some(idp) = &self.idp_sso_descriptor {
            w.start(
                "md:IDPSSODescriptor",
                &[("protocolSupportEnumeration", idp.protocol_support_enumeration.as_str())],
            )?;
            write_keys(&mut w, &idp.key_descriptors)?;
            write_name_id_formats(&mut w, &idp.name_id_formats)?;
            for sso in &idp.single_sign_on_services {
                w.empty(
                    "md:SingleSignOnService",
                    &[("Binding", sso.binding.as_str()), ("Location", sso.location.as_str())],
                )?;
            }
            w.end("md:IDPSSODescriptor")?;
        }
        if let Some(sp) = &self.sp_sso_descriptor {
            w.start(
                "md:SPSSODescriptor",
                &[("protocolSupportEnumeration", sp.protocol_support_enumeration.as_str())],
            )?;
            write_keys(&mut w, &sp.key_descriptors)?;
            write_name_id_formats(&mut w, &sp.name_id_formats)?;
            for acs in &sp.assertion_consumer_services {
                let index = acs.index.to_string();
                let is_default = acs.is_default.map(|d| d.to_string()).unwrap_or_default();
                w.empty(
                    "md:AssertionConsumerService",
                    &[
                        ("Binding", acs.binding.as_str()),
                        ("Location", acs.location.as_str()),
                        ("index", index.as_str()),
                        ("isDefault", is_default.as_str()),
                    ],
                )?;
            }
            w.end("md:SPSSODescriptor")?;
        }
        w.end("md:EntityDescriptor")?;
        w.into_string()
    }
}

/// Default protocol support enumeration.
pub(crate) fn saml2_protocol() -> String {
    SAMLP_NS.to_string()
}

fn protocols(tag: &BytesStart<'_>) -> SamlResult<String> {
    Ok(attribute(tag, "protocolSupportEnumeration")?.unwrap_or_default())
}

fn endpoint(tag: &BytesStart<'_>) -> SamlResult<Endpoint> {
    Ok(Endpoint {
        binding: attribute(tag, "Binding")?.unwrap_or_default(),
        location: attribute(tag, "Location")?.unwrap_or_default(),
    })
}

fn indexed_endpoint(tag: &BytesStart<'_>) -> SamlResult<IndexedEndpoint> {
    let index = match attribute(tag, "index")? {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| SamlError::XmlParse(format!("invalid endpoint index {v:?}")))?,
        None => 0,
    };
    Ok(IndexedEndpoint {
        binding: attribute(tag, "Binding")?.unwrap_or_default(),
        location: attribute(tag, "Location")?.unwrap_or_default(),
        index,
        is_default: attribute(tag, "isDefault")?.map(|v| v.trim() == "true" || v.trim() == "1"),
    })
}

fn push_key(metadata: Option<&mut Metadata>, role: Role, key: Option<KeyDescriptor>) {
    let (Some(md), Some(key)) = (metadata, key) else {
        return;
    };
    match role {
        Role::Idp => {
            if let Some(idp) = md.idp_sso_descriptor.as_mut() {
                idp.key_descriptors.push(key);
            }
        }
        Role::Sp => {
            if let Some(sp) = md.sp_sso_descriptor.as_mut() {
                sp.key_descriptors.push(key);
            }
        }
        Role::None => {}
    }
}

fn push_name_id_format(metadata: Option<&mut Metadata>, role: Role, format: String) {
    let Some(md) = metadata else {
        return;
    };
    match role {
        Role::Idp => {
            if let Some(idp) = md.idp_sso_descriptor.as_mut() {
                idp.name_id_formats.push(format);
            }
        }
        Role::Sp => {
            if let Some(sp) = md.sp_sso_descriptor.as_mut() {
                sp.name_id_formats.push(format);
            }
        }
        Role::None => {}
    }
}

fn write_keys(w: &mut XmlWriter, keys: &[KeyDescriptor]) -> SamlResult<()> {
    for key in keys {
        w.start("md:KeyDescriptor", &[("use", key.key_use.as_deref().unwrap_or_default())])?;
        w.start("ds:KeyInfo", &[])?;
        w.start("ds:X509Data", &[])?;
        w.text_element("ds:X509Certificate", &[], &key.certificate)?;
        w.end("ds:X509Data")?;
        w.end("ds:KeyInfo")?;
        for method in &key.encryption_methods {
            w.empty("md:EncryptionMethod", &[("Algorithm", method.as_str())])?;
        }
        w.end("md:KeyDescriptor")?;
    }
    Ok(())
}

fn write_name_id_formats(w: &mut XmlWriter, formats: &[String]) -> SamlResult<()> {
    for format in formats {
        w.text_element("md:NameIDFormat", &[], format)?;
    }
    Ok(())
}
