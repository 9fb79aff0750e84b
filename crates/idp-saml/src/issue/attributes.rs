//! Mapping of session fields onto SAML attributes.

use crate::types::{attrname_formats, Attribute, AttributeValue, Session, XS_STRING};

/// A single-valued session field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionField {
    /// [`Session::user_name`].
    UserName,
    /// [`Session::user_email`].
    UserEmail,
    /// [`Session::user_surname`].
    Surname,
    /// [`Session::user_given_name`].
    GivenName,
    /// [`Session::user_common_name`].
    CommonName,
    /// [`Session::user_id`].
    UserId,
    /// [`Session::user_fullname`].
    UserFullname,
}

impl SessionField {
    /// Reads the field from a session.
    #[must_use]
    pub fn value(self, session: &Session) -> &str {
        match self {
            Self::UserName => &session.user_name,
            Self::UserEmail => &session.user_email,
            Self::Surname => &session.user_surname,
            Self::GivenName => &session.user_given_name,
            Self::CommonName => &session.user_common_name,
            Self::UserId => &session.user_id,
            Self::UserFullname => &session.user_fullname,
        }
    }
}

/// How one attribute is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDescriptor {
    /// Human-readable name.
    pub friendly_name: &'static str,
    /// Formal name.
    pub name: &'static str,
    /// Name format URI.
    pub name_format: Option<&'static str>,
}

impl AttributeDescriptor {
    const fn uri(friendly_name: &'static str, oid: &'static str) -> Self {
        Self {
            friendly_name,
            name: oid,
            name_format: Some(attrname_formats::URI),
        }
    }

    const fn basic(friendly_name: &'static str, name: &'static str) -> Self {
        Self {
            friendly_name,
            name,
            name_format: None,
        }
    }

    fn attribute<'a>(&self, values: impl IntoIterator<Item = &'a str>) -> Attribute {
        Attribute {
            friendly_name: self.friendly_name.to_string(),
            name: self.name.to_string(),
            name_format: self.name_format.map(str::to_string),
            values: values
                .into_iter()
                .map(|value| AttributeValue {
                    xsi_type: XS_STRING.to_string(),
                    value: value.to_string(),
                })
                .collect(),
        }
    }
}

/// Single-valued attributes, in emission order.
pub const SESSION_ATTRIBUTES: [(SessionField, AttributeDescriptor); 8] = [
    (SessionField::UserName, AttributeDescriptor::uri("uid", "urn:oid:0.9.2342.19200300.100.1.1")),
    (
        SessionField::UserEmail,
        AttributeDescriptor::uri("eduPersonPrincipalName", "urn:oid:1.3.6.1.4.1.5923.1.1.1.6"),
    ),
    (SessionField::Surname, AttributeDescriptor::uri("sn", "urn:oid:2.5.4.4")),
    (SessionField::GivenName, AttributeDescriptor::uri("givenName", "urn:oid:2.5.4.42")),
    (SessionField::CommonName, AttributeDescriptor::uri("cn", "urn:oid:2.5.4.3")),
    (SessionField::UserId, AttributeDescriptor::basic("MASTUsername", "userid")),
    (SessionField::UserEmail, AttributeDescriptor::basic("MASTEmail", "email")),
    (SessionField::UserFullname, AttributeDescriptor::basic("MASTName", "fullname")),
];

/// Group memberships, emitted last as one multi-valued attribute.
pub const GROUP_ATTRIBUTE: AttributeDescriptor =
    AttributeDescriptor::uri("eduPersonAffiliation", "urn:oid:1.3.6.1.4.1.5923.1.1.1.1");

/// Builds the attributes for a session.
///
/// Empty fields produce no attribute at all.
#[must_use]
pub fn build_attributes(session: &Session) -> Vec<Attribute> {
    let mut attributes: Vec<Attribute> = SESSION_ATTRIBUTES
        .iter()
        .filter_map(|(field, descriptor)| {
            let value = field.value(session);
            (!value.is_empty()).then(|| descriptor.attribute([value]))
        })
        .collect();
    if !session.groups.is_empty() {
        attributes.push(GROUP_ATTRIBUTE.attribute(session.groups.iter().map(String::as_str)));
    }
    attributes
}
