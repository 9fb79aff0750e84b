//! Inbound authentication requests.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::{SamlError, SamlResult};
use crate::xml::{attribute, parse_instant};

/// An `<samlp:AuthnRequest>` as received from a service provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthnRequest {
    /// Request identifier.
    pub id: String,
    /// Issuer value, the service provider entity id.
    pub issuer: String,
    /// When the request was issued.
    pub issue_instant: Option<DateTime<Utc>>,
    /// Requested destination.
    pub destination: Option<String>,
    /// Consumer service URL declared in the request.
    pub assertion_consumer_service_url: Option<String>,
    /// Requested protocol binding.
    pub protocol_binding: Option<String>,
    /// Requested name identifier format.
    pub name_id_policy_format: Option<String>,
}

impl AuthnRequest {
    /// Creates a request with the given identifier and issuer.
    #[must_use]
    pub fn new(id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issuer: issuer.into(),
            ..Self::default()
        }
    }

    /// Sets the consumer service URL.
    #[must_use]
    pub fn with_acs_url(mut self, url: impl Into<String>) -> Self {
        self.assertion_consumer_service_url = Some(url.into());
        self
    }

    /// Parses a request document.
    ///
    /// Element prefixes are ignored.
    pub fn from_xml(xml: &str) -> SamlResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.trim_text(true);

        let mut request: Option<Self> = None;
        let mut in_issuer = false;
        loop {
            let event = reader.read_event()?;
            match &event {
                Event::Start(tag) | Event::Empty(tag) => match tag.local_name().as_ref() {
                    b"AuthnRequest" if request.is_none() => {
                        let id = attribute(tag, "ID")?
                            .ok_or_else(|| SamlError::XmlParse("AuthnRequest without ID".to_string()))?;
                        request = Some(Self {
                            id,
                            issuer: String::new(),
                            issue_instant: attribute(tag, "IssueInstant")?
                                .map(|v| parse_instant(&v))
                                .transpose()?,
                            destination: attribute(tag, "Destination")?,
                            assertion_consumer_service_url: attribute(
                                tag,
                                "AssertionConsumerServiceURL",
                            )?,
                            protocol_binding: attribute(tag, "ProtocolBinding")?,
                            name_id_policy_format: None,
                        });
                    }
                    b"Issuer" => in_issuer = matches!(event, Event::Start(_)),
                    b"NameIDPolicy" => {
                        if let Some(request) = request.as_mut() {
                            request.name_id_policy_format = attribute(tag, "Format")?;
                        }
                    }
                    _ => {}
                },
                Event::Text(text) if in_issuer => {
                    if let Some(request) = request.as_mut() {
                        request.issuer = text.unescape()?.trim().to_string();
                    }
                }
                Event::End(tag) if tag.local_name().as_ref() == b"Issuer" => in_issuer = false,
                Event::Eof => break,
                _ => {}
            }
        }

        request.ok_or_else(|| SamlError::XmlParse("no AuthnRequest element".to_string()))
    }
}
