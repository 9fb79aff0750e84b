//! SAML Assertion types.
//!
//! Assertions contain statements about a subject made by an issuer. They are
//! built once per issuance, serialized for signing, and never touched again
//! after encryption starts.

use chrono::{DateTime, Utc};
use idp_xmlsec::SignatureTemplate;

use super::constants::{CM_BEARER, SAML_NS, SAML_VERSION, XSI_NS, XS_NS};
use super::name_id::{Issuer, NameId};
use crate::error::{SamlError, SamlResult};
use crate::xml::{format_instant, XmlWriter};

/// SAML Assertion.
#[derive(Debug, Clone)]
pub struct Assertion {
    /// Unique identifier, referenced by the signature.
    pub id: String,
    /// When the assertion was issued.
    pub issue_instant: DateTime<Utc>,
    /// Always "2.0".
    pub version: String,
    /// The issuing identity provider.
    pub issuer: Issuer,
    /// Unsigned signature template completed by the engine.
    pub signature: Option<SignatureTemplate>,
    /// The subject of the statements.
    pub subject: Option<Subject>,
    /// Validity conditions.
    pub conditions: Option<Conditions>,
    /// How and when the subject authenticated.
    pub authn_statement: Option<AuthnStatement>,
    /// Attributes about the subject.
    pub attribute_statement: Option<AttributeStatement>,
}

impl Assertion {
    /// Creates an assertion with only identity and issuer set.
    #[must_use]
    pub fn new(id: impl Into<String>, issue_instant: DateTime<Utc>, issuer: Issuer) -> Self {
        Self {
            id: id.into(),
            issue_instant,
            version: SAML_VERSION.to_string(),
            issuer,
            signature: None,
            subject: None,
            conditions: None,
            authn_statement: None,
            attribute_statement: None,
        }
    }

    /// Returns the recipient from the subject confirmation data.
    #[must_use]
    pub fn recipient(&self) -> Option<&str> {
        self.subject
            .as_ref()
            .and_then(|s| s.subject_confirmation.as_ref())
            .map(|c| c.data.recipient.as_str())
    }

    /// Checks that every field required before signing is present.
    pub fn ensure_complete(&self) -> SamlResult<()> {
        if self.issuer.value.is_empty() {
            return Err(SamlError::IncompleteAssertion("issuer"));
        }
        let subject = self
            .subject
            .as_ref()
            .ok_or(SamlError::IncompleteAssertion("subject"))?;
        if subject.name_id.is_none() {
            return Err(SamlError::IncompleteAssertion("name identifier"));
        }
        if subject.subject_confirmation.is_none() {
            return Err(SamlError::IncompleteAssertion("subject confirmation"));
        }
        if self.conditions.is_none() {
            return Err(SamlError::IncompleteAssertion("conditions"));
        }
        if self.authn_statement.is_none() {
            return Err(SamlError::IncompleteAssertion("authentication statement"));
        }
        Ok(())
    }

    /// Serializes the assertion, embedding the signature template after the
    /// issuer.
    pub fn to_xml(&self) -> SamlResult<String> {
        let issue_instant = format_instant(&self.issue_instant);
        let mut w = XmlWriter::new();
        w.start(
            "saml:Assertion",
            &[
                ("xmlns:saml", SAML_NS),
                ("xmlns:xs", XS_NS),
                ("xmlns:xsi", XSI_NS),
                ("ID", self.id.as_str()),
                ("IssueInstant", issue_instant.as_str()),
                ("Version", self.version.as_str()),
            ],
        )?;
        self.issuer.write_xml(&mut w)?;
        if let Some(signature) = &self.signature {
            w.raw(&signature.to_xml());
        }
        if let Some(subject) = &self.subject {
            subject.write_xml(&mut w)?;
        }
        if let Some(conditions) = &self.conditions {
            conditions.write_xml(&mut w)?;
        }
        if let Some(statement) = &self.authn_statement {
            statement.write_xml(&mut w)?;
        }
        if let Some(statement) = &self.attribute_statement {
            statement.write_xml(&mut w)?;
        }
        w.end("saml:Assertion")?;
        w.into_string()
    }
}

/// Subject of an assertion.
#[derive(Debug, Clone)]
pub struct Subject {
    /// The subject's name identifier.
    pub name_id: Option<NameId>,
    /// How the subject may be confirmed.
    pub subject_confirmation: Option<SubjectConfirmation>,
}

impl Subject {
    fn write_xml(&self, w: &mut XmlWriter) -> SamlResult<()> {
        w.start("saml:Subject", &[])?;
        if let Some(name_id) = &self.name_id {
            name_id.write_xml(w)?;
        }
        if let Some(confirmation) = &self.subject_confirmation {
            w.start("saml:SubjectConfirmation", &[("Method", confirmation.method.as_str())])?;
            let data = &confirmation.data;
            let not_on_or_after = format_instant(&data.not_on_or_after);
            w.empty(
                "saml:SubjectConfirmationData",
                &[
                    ("Address", data.address.as_deref().unwrap_or_default()),
                    ("InResponseTo", data.in_response_to.as_str()),
                    ("NotOnOrAfter", not_on_or_after.as_str()),
                    ("Recipient", data.recipient.as_str()),
                ],
            )?;
            w.end("saml:SubjectConfirmation")?;
        }
        w.end("saml:Subject")
    }
}

/// Subject confirmation.
#[derive(Debug, Clone)]
pub struct SubjectConfirmation {
    /// Confirmation method URI.
    pub method: String,
    /// Confirmation data.
    pub data: SubjectConfirmationData,
}

impl SubjectConfirmation {
    /// Creates a bearer confirmation.
    #[must_use]
    pub fn bearer(data: SubjectConfirmationData) -> Self {
        Self {
            method: CM_BEARER.to_string(),
            data,
        }
    }
}

/// Subject confirmation data.
#[derive(Debug, Clone)]
pub struct SubjectConfirmationData {
    /// Address of the user agent.
    pub address: Option<String>,
    /// Identifier of the request being answered.
    pub in_response_to: String,
    /// Time at which the subject can no longer be confirmed.
    pub not_on_or_after: DateTime<Utc>,
    /// Where the assertion may be presented. Empty when unresolved.
    pub recipient: String,
}

/// Validity conditions.
#[derive(Debug, Clone)]
pub struct Conditions {
    /// Start of the validity window.
    pub not_before: DateTime<Utc>,
    /// End of the validity window.
    pub not_on_or_after: DateTime<Utc>,
    /// Audience restriction, set only when the service provider is known.
    pub audience: Option<String>,
}

impl Conditions {
    fn write_xml(&self, w: &mut XmlWriter) -> SamlResult<()> {
        let not_before = format_instant(&self.not_before);
        let not_on_or_after = format_instant(&self.not_on_or_after);
        let attrs = [("NotBefore", not_before.as_str()), ("NotOnOrAfter", not_on_or_after.as_str())];
        match &self.audience {
            Some(audience) => {
                w.start("saml:Conditions", &attrs)?;
                w.start("saml:AudienceRestriction", &[])?;
                w.text_element("saml:Audience", &[], audience)?;
                w.end("saml:AudienceRestriction")?;
                w.end("saml:Conditions")
            }
            None => w.empty("saml:Conditions", &attrs),
        }
    }
}

/// Authentication statement.
#[derive(Debug, Clone)]
pub struct AuthnStatement {
    /// When the subject authenticated.
    pub authn_instant: DateTime<Utc>,
    /// Session index.
    pub session_index: String,
    /// Address of the user agent.
    pub subject_locality: Option<String>,
    /// Authentication context class URI.
    pub authn_context_class_ref: String,
}

impl AuthnStatement {
    fn write_xml(&self, w: &mut XmlWriter) -> SamlResult<()> {
        let authn_instant = format_instant(&self.authn_instant);
        w.start(
            "saml:AuthnStatement",
            &[("AuthnInstant", authn_instant.as_str()), ("SessionIndex", self.session_index.as_str())],
        )?;
        if let Some(address) = &self.subject_locality {
            w.empty("saml:SubjectLocality", &[("Address", address.as_str())])?;
        }
        w.start("saml:AuthnContext", &[])?;
        w.text_element("saml:AuthnContextClassRef", &[], &self.authn_context_class_ref)?;
        w.end("saml:AuthnContext")?;
        w.end("saml:AuthnStatement")
    }
}

/// Attribute statement.
#[derive(Debug, Clone, Default)]
pub struct AttributeStatement {
    /// The attributes, in emission order.
    pub attributes: Vec<Attribute>,
}

impl AttributeStatement {
    fn write_xml(&self, w: &mut XmlWriter) -> SamlResult<()> {
        w.start("saml:AttributeStatement", &[])?;
        for attribute in &self.attributes {
            attribute.write_xml(w)?;
        }
        w.end("saml:AttributeStatement")
    }
}

/// A single attribute with one or more values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Human-readable name.
    pub friendly_name: String,
    /// Formal name.
    pub name: String,
    /// Name format URI, if any.
    pub name_format: Option<String>,
    /// The values.
    pub values: Vec<AttributeValue>,
}

impl Attribute {
    fn write_xml(&self, w: &mut XmlWriter) -> SamlResult<()> {
        w.start(
            "saml:Attribute",
            &[
                ("FriendlyName", self.friendly_name.as_str()),
                ("Name", self.name.as_str()),
                ("NameFormat", self.name_format.as_deref().unwrap_or_default()),
            ],
        )?;
        for value in &self.values {
            w.text_element("saml:AttributeValue", &[("xsi:type", value.xsi_type.as_str())], &value.value)?;
        }
        w.end("saml:Attribute")
    }
}

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeValue {
    /// The `xsi:type` of the value.
    pub xsi_type: String,
    /// The value.
    pub value: String,
}
