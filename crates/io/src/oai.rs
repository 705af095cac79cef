// OAI-PMH ListRecords pages and local snapshots (metadataPrefix=dim)

use std::io::Write;
use std::path::Path;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use scholarlink_recon::model::{DimField, HarvestedRecord};

use crate::error::IoError;

/// `<error code="...">` payload returned instead of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OaiError {
    pub code: String,
    pub message: String,
}

/// One parsed ListRecords response (or a whole snapshot file).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OaiPage {
    pub records: Vec<HarvestedRecord>,
    /// Raw `<record>...</record>` fragments, in document order, for snapshotting.
    pub fragments: Vec<String>,
    /// `None` when the element is absent or empty (last page).
    pub resumption_token: Option<String>,
    pub error: Option<OaiError>,
}

/// Which element's text is currently being collected.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Capture {
    Identifier,
    SetSpec,
    Field,
    Token,
    Error,
}

#[derive(Default)]
struct RecordBuilder {
    identifier: String,
    set_specs: Vec<String>,
    metadata: Option<Vec<DimField>>,
}

impl RecordBuilder {
    fn finish(self) -> HarvestedRecord {
        HarvestedRecord {
            identifier: self.identifier,
            set_specs: self.set_specs,
            metadata: self.metadata,
        }
    }
}

/// Parse an OAI-PMH response body.
///
/// Element names are matched by local name, so `dim:field` and `field`
/// are treated alike and undeclared prefixes in snapshots are tolerated.
pub fn parse_page(xml: &str) -> Result<OaiPage, IoError> {
    let mut reader = Reader::from_str(xml);

    let mut page = OaiPage::default();
    let mut buf = Vec::new();
    let mut current: Option<RecordBuilder> = None;
    let mut record_start = 0usize;
    let mut in_header = false;
    let mut capture: Option<Capture> = None;
    let mut text = String::new();
    let mut field: Option<DimField> = None;
    let mut error_code: Option<String> = None;

    loop {
        let offset = reader.buffer_position() as usize;
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"record" => {
                    record_start = offset;
                    current = Some(RecordBuilder::default());
                }
                b"header" if current.is_some() => in_header = true,
                b"identifier" if in_header => start_capture(&mut capture, &mut text, Capture::Identifier),
                b"setSpec" if in_header => start_capture(&mut capture, &mut text, Capture::SetSpec),
                b"metadata" => {
                    if let Some(rec) = current.as_mut() {
                        rec.metadata.get_or_insert_with(Vec::new);
                    }
                }
                b"field" if current.is_some() => {
                    field = Some(dim_field(e)?);
                    start_capture(&mut capture, &mut text, Capture::Field);
                }
                b"resumptionToken" => start_capture(&mut capture, &mut text, Capture::Token),
                b"error" => {
                    error_code = Some(attribute(e, b"code")?.unwrap_or_default());
                    start_capture(&mut capture, &mut text, Capture::Error);
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"field" => {
                    if let Some(rec) = current.as_mut() {
                        let f = dim_field(e)?;
                        rec.metadata.get_or_insert_with(Vec::new).push(f);
                    }
                }
                b"error" => {
                    page.error = Some(OaiError {
                        code: attribute(e, b"code")?.unwrap_or_default(),
                        message: String::new(),
                    });
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if capture.is_some() => {
                let chunk = e.decode().map_err(|err| IoError::Xml(err.to_string()))?;
                text.push_str(&chunk);
            }
            Ok(Event::CData(ref e)) if capture.is_some() => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::GeneralRef(ref e)) if capture.is_some() => {
                match e.resolve_char_ref() {
                    Ok(Some(ch)) => text.push(ch),
                    _ => {
                        let name = e.decode().map_err(|err| IoError::Xml(err.to_string()))?;
                        match resolve_predefined_entity(&name) {
                            Some(value) => text.push_str(value),
                            None => {
                                return Err(IoError::Xml(format!("unknown entity '&{name};'")))
                            }
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"record" => {
                    if let Some(rec) = current.take() {
                        let end = reader.buffer_position() as usize;
                        page.fragments.push(xml[record_start..end].trim().to_string());
                        page.records.push(rec.finish());
                    }
                    in_header = false;
                }
                b"header" => in_header = false,
                b"identifier" if capture == Some(Capture::Identifier) => {
                    if let Some(rec) = current.as_mut() {
                        rec.identifier = take_text(&mut capture, &mut text);
                    }
                }
                b"setSpec" if capture == Some(Capture::SetSpec) => {
                    let spec = take_text(&mut capture, &mut text);
                    if let Some(rec) = current.as_mut() {
                        if !spec.is_empty() {
                            rec.set_specs.push(spec);
                        }
                    }
                }
                b"field" if capture == Some(Capture::Field) => {
                    let value = take_text(&mut capture, &mut text);
                    if let (Some(mut f), Some(rec)) = (field.take(), current.as_mut()) {
                        f.text = (!value.is_empty()).then_some(value);
                        rec.metadata.get_or_insert_with(Vec::new).push(f);
                    }
                }
                b"resumptionToken" if capture == Some(Capture::Token) => {
                    let token = take_text(&mut capture, &mut text);
                    page.resumption_token = (!token.is_empty()).then_some(token);
                }
                b"error" if capture == Some(Capture::Error) => {
                    page.error = Some(OaiError {
                        code: error_code.take().unwrap_or_default(),
                        message: take_text(&mut capture, &mut text),
                    });
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(IoError::Xml(format!(
                    "at byte {}: {}",
                    reader.error_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    if current.is_some() {
        return Err(IoError::Xml("unterminated <record> element".to_string()));
    }

    Ok(page)
}

/// Parse a snapshot written by [`write_snapshot`] (or any ListRecords body).
pub fn parse_snapshot(xml: &str) -> Result<Vec<HarvestedRecord>, IoError> {
    Ok(parse_page(xml)?.records)
}

pub fn read_snapshot(path: &Path) -> Result<Vec<HarvestedRecord>, IoError> {
    let xml = std::fs::read_to_string(path)?;
    parse_snapshot(&xml)
}

/// Wrap record fragments in a minimal OAI-PMH envelope.
pub fn write_snapshot<W: Write>(mut out: W, fragments: &[String]) -> Result<(), IoError> {
    out.write_all(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?><OAI-PMH><ListRecords>")?;
    for fragment in fragments {
        out.write_all(b"\n")?;
        out.write_all(fragment.as_bytes())?;
    }
    out.write_all(b"\n</ListRecords></OAI-PMH>\n")?;
    out.flush()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn start_capture(capture: &mut Option<Capture>, text: &mut String, target: Capture) {
    *capture = Some(target);
    text.clear();
}

fn take_text(capture: &mut Option<Capture>, text: &mut String) -> String {
    *capture = None;
    let value = text.trim().to_string();
    text.clear();
    value
}

fn dim_field(e: &BytesStart<'_>) -> Result<DimField, IoError> {
    let element = attribute(e, b"element")?
        .ok_or_else(|| IoError::Xml("dim:field without element attribute".to_string()))?;
    Ok(DimField {
        element,
        qualifier: attribute(e, b"qualifier")?,
        text: None,
    })
}

fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, IoError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| IoError::Xml(err.to_string()))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|err| IoError::Xml(err.to_string()))?;
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}
