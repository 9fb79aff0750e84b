//! Small helpers over `quick_xml` shared by the SAML types.

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{SamlError, SamlResult};

/// Streaming XML writer.
///
/// Attributes with empty values are not written.
pub(crate) struct XmlWriter {
    writer: Writer<Vec<u8>>,
}

impl XmlWriter {
    pub(crate) fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
        }
    }

    fn tag<'a>(name: &'a str, attrs: &[(&str, &str)]) -> BytesStart<'a> {
        let mut tag = BytesStart::new(name);
        for &(key, value) in attrs {
            if !value.is_empty() {
                tag.push_attribute((key, value));
            }
        }
        tag
    }

    fn write(&mut self, event: Event<'_>) -> SamlResult<()> {
        self.writer
            .write_event(event)
            .map_err(|e| SamlError::XmlWrite(e.to_string()))
    }

    pub(crate) fn start(&mut self, name: &str, attrs: &[(&str, &str)]) -> SamlResult<()> {
        self.write(Event::Start(Self::tag(name, attrs)))
    }

    pub(crate) fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> SamlResult<()> {
        self.write(Event::Empty(Self::tag(name, attrs)))
    }

    pub(crate) fn end(&mut self, name: &str) -> SamlResult<()> {
        self.write(Event::End(BytesEnd::new(name)))
    }

    /// Writes `<name attrs>text</name>` with `text` escaped.
    pub(crate) fn text_element(
        &mut self,
        name: &str,
        attrs: &[(&str, &str)],
        text: &str,
    ) -> SamlResult<()> {
        self.start(name, attrs)?;
        self.write(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    /// Appends pre-serialized markup verbatim.
    pub(crate) fn raw(&mut self, markup: &str) {
        self.writer.get_mut().extend_from_slice(markup.as_bytes());
    }

    pub(crate) fn into_string(self) -> SamlResult<String> {
        String::from_utf8(self.writer.into_inner()).map_err(|e| SamlError::XmlWrite(e.to_string()))
    }
}

/// Returns the unescaped value of the attribute with the given local name.
pub(crate) fn attribute(tag: &BytesStart<'_>, name: &str) -> SamlResult<Option<String>> {
    for attr in tag.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Formats an instant as `xs:dateTime` in UTC.
pub(crate) fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an `xs:dateTime` value.
pub(crate) fn parse_instant(value: &str) -> SamlResult<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value.trim())?.with_timezone(&Utc))
}
