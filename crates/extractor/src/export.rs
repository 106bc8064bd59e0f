//! Readers for exported message collections.
//!
//! Two shapes are understood: the SMS backup XML format, where every
//! message is an `<sms>` element carrying its fields as attributes (child
//! elements are accepted too), and a JSON array of message objects.

use std::fs;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::ExportError;
use crate::extract::{RawMessage, Timestamp};

/// Supported export encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xml,
    Json,
}

impl ExportFormat {
    /// Pick a format from the file extension, falling back to the first
    /// non-blank character of the content.
    pub fn detect(path: &Path, content: &str) -> Result<Self, ExportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("xml") => return Ok(ExportFormat::Xml),
            Some("json") => return Ok(ExportFormat::Json),
            _ => {}
        }

        match content.trim_start().chars().next() {
            Some('<') => Ok(ExportFormat::Xml),
            Some('[') | Some('{') => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Read every message from an export file.
pub fn read_export(path: impl AsRef<Path>) -> Result<Vec<RawMessage>, ExportError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    match ExportFormat::detect(path, &content)? {
        ExportFormat::Xml => parse_xml(&content),
        ExportFormat::Json => parse_json(&content),
    }
}

/// Parse a JSON array of message objects.
pub fn parse_json(content: &str) -> Result<Vec<RawMessage>, ExportError> {
    Ok(serde_json::from_str(content)?)
}

/// Parse an SMS backup XML document.
pub fn parse_xml(content: &str) -> Result<Vec<RawMessage>, ExportError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut messages = Vec::new();
    let mut current: Option<RawMessage> = None;
    let mut field: Option<ChildField> = None;

    loop {
        match reader.read_event()? {
            Event::Empty(e) if e.name().as_ref() == b"sms" => {
                messages.push(message_from_attributes(&e)?);
            }
            Event::Start(e) if e.name().as_ref() == b"sms" => {
                current = Some(message_from_attributes(&e)?);
                field = None;
            }
            Event::Start(e) if current.is_some() => {
                field = ChildField::from_name(e.name().as_ref());
            }
            Event::Text(text) => {
                if let (Some(message), Some(field)) = (current.as_mut(), field) {
                    field.assign(message, text.unescape()?.into_owned());
                }
            }
            Event::CData(data) => {
                if let (Some(message), Some(field)) = (current.as_mut(), field) {
                    let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                    field.assign(message, text);
                }
            }
            Event::End(e) if e.name().as_ref() == b"sms" => {
                messages.extend(current.take());
                field = None;
            }
            Event::End(_) => field = None,
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(messages)
}

#[derive(Debug, Clone, Copy)]
enum ChildField {
    Body,
    Timestamp,
    ReadableDate,
    Address,
    Protocol,
}

impl ChildField {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"body" => Some(ChildField::Body),
            b"date" | b"timestamp" => Some(ChildField::Timestamp),
            b"readable_date" => Some(ChildField::ReadableDate),
            b"address" => Some(ChildField::Address),
            b"protocol" => Some(ChildField::Protocol),
            _ => None,
        }
    }

    fn assign(self, message: &mut RawMessage, value: String) {
        match self {
            ChildField::Body => message.body = Some(value),
            ChildField::Timestamp => message.timestamp = Some(timestamp_from_text(value)),
            ChildField::ReadableDate => message.readable_date = Some(value),
            ChildField::Address => message.address = Some(value),
            ChildField::Protocol => message.protocol = Some(value),
        }
    }
}

fn message_from_attributes(element: &BytesStart<'_>) -> Result<RawMessage, ExportError> {
    let mut message = RawMessage::default();

    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if let Some(field) = ChildField::from_name(attr.key.as_ref()) {
            field.assign(&mut message, attr.unescape_value()?.into_owned());
        }
    }

    Ok(message)
}

fn timestamp_from_text(value: String) -> Timestamp {
    match value.trim().parse::<i64>() {
        Ok(millis) => Timestamp::EpochMillis(millis),
        Err(_) => Timestamp::Text(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_xml_attributes() {
        let xml = r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?>
<smses count="2">
  <sms protocol="0" address="M-Money" date="1715351458724" type="1"
       body="You have received 2000 RWF from Jane Smith (*********013) at 2024-05-10 16:30:51."
       readable_date="10 May 2024 4:30:58 PM" />
  <sms protocol="0" address="M-Money" date="1715351506754" type="1"
       body="Fee &amp; balance &quot;updated&quot;" readable_date="10 May 2024 4:31:46 PM" />
</smses>"#;

        let messages = parse_xml(xml).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0].timestamp,
            Some(Timestamp::EpochMillis(1_715_351_458_724))
        );
        assert_eq!(messages[0].address.as_deref(), Some("M-Money"));
        assert_eq!(messages[0].protocol.as_deref(), Some("0"));
        assert_eq!(
            messages[0].readable_date.as_deref(),
            Some("10 May 2024 4:30:58 PM")
        );
        assert_eq!(
            messages[1].body.as_deref(),
            Some("Fee & balance \"updated\"")
        );
    }

    #[test]
    fn test_parse_xml_child_elements() {
        let xml = "<smses>\
            <sms><body>You have received 10 RWF from Ann at 2024-01-01 08:00:00</body>\
            <date>2024-01-01 08:00:00</date></sms>\
            <sms><body><![CDATA[Your payment of 5 RWF to Bo has been completed]]></body></sms>\
            </smses>";

        let messages = parse_xml(xml).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(
            messages[0].timestamp,
            Some(Timestamp::Text("2024-01-01 08:00:00".to_string()))
        );
        assert_eq!(
            messages[1].body.as_deref(),
            Some("Your payment of 5 RWF to Bo has been completed")
        );
    }

    #[test]
    fn test_parse_xml_missing_body() {
        let messages = parse_xml(r#"<smses><sms date="1" /></smses>"#).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body, None);
    }

    #[test]
    fn test_parse_xml_malformed() {
        let err = parse_xml("<smses><sms body=\"x\"></smss>").unwrap_err();
        assert!(matches!(err, ExportError::Xml(_)));
    }

    #[test]
    fn test_parse_json() {
        let json = r#"[
            {"body": "hello", "date": 1715351458724, "address": "M-Money"},
            {"body": "world", "timestamp": "2024-01-01 08:00:00"},
            {"readable_date": "10 May 2024"}
        ]"#;

        let messages = parse_json(json).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(
            messages[0].timestamp,
            Some(Timestamp::EpochMillis(1_715_351_458_724))
        );
        assert_eq!(
            messages[1].timestamp,
            Some(Timestamp::Text("2024-01-01 08:00:00".to_string()))
        );
        assert_eq!(messages[2].body, None);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            ExportFormat::detect(Path::new("a.XML"), "").unwrap(),
            ExportFormat::Xml
        );
        assert_eq!(
            ExportFormat::detect(Path::new("export"), "  [ ]").unwrap(),
            ExportFormat::Json
        );
        assert_eq!(
            ExportFormat::detect(Path::new("export.txt"), "<smses/>").unwrap(),
            ExportFormat::Xml
        );
        assert!(matches!(
            ExportFormat::detect(Path::new("export.txt"), "body,date"),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_read_export_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("messages.json");
        fs::write(&path, r#"[{"body": "hi"}]"#).unwrap();

        let messages = read_export(&path).unwrap();
        assert_eq!(messages, vec![RawMessage::new("hi")]);
    }

    #[test]
    fn test_read_export_missing_file() {
        let err = read_export("/nonexistent/messages.xml").unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }
}
