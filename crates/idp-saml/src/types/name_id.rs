//! Name identifiers and issuers.

use serde::{Deserialize, Serialize};

use super::constants::name_id_formats;
use crate::error::SamlResult;
use crate::xml::XmlWriter;

/// SAML name identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameId {
    /// The identifier value.
    pub value: String,
    /// The identifier format URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Domain qualifying the name, the IdP entity id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_qualifier: Option<String>,
    /// Service provider qualifying the name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sp_name_qualifier: Option<String>,
}

impl NameId {
    /// Creates a transient name identifier.
    #[must_use]
    pub fn transient(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: Some(name_id_formats::TRANSIENT.to_string()),
            name_qualifier: None,
            sp_name_qualifier: None,
        }
    }

    /// Sets the name qualifier.
    #[must_use]
    pub fn with_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.name_qualifier = Some(qualifier.into());
        self
    }

    /// Sets the SP name qualifier.
    #[must_use]
    pub fn with_sp_name_qualifier(mut self, qualifier: impl Into<String>) -> Self {
        self.sp_name_qualifier = Some(qualifier.into());
        self
    }

    pub(crate) fn write_xml(&self, w: &mut XmlWriter) -> SamlResult<()> {
        w.text_element(
            "saml:NameID",
            &[
                ("Format", self.format.as_deref().unwrap_or_default()),
                ("NameQualifier", self.name_qualifier.as_deref().unwrap_or_default()),
                ("SPNameQualifier", self.sp_name_qualifier.as_deref().unwrap_or_default()),
            ],
            &self.value,
        )
    }
}

/// Issuer of an assertion or response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    /// The issuer entity id.
    pub value: String,
    /// The issuer format URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Issuer {
    /// Creates an issuer with the entity format.
    #[must_use]
    pub fn entity(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: Some(name_id_formats::ENTITY.to_string()),
        }
    }

    pub(crate) fn write_xml(&self, w: &mut XmlWriter) -> SamlResult<()> {
        w.text_element(
            "saml:Issuer",
            &[("Format", self.format.as_deref().unwrap_or_default())],
            &self.value,
        )
    }
}
