// ISO 2709 (MARC 21) catalog reader and handle -> bib id join

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use scholarlink_recon::model::{DimField, HarvestedRecord};

use crate::error::IoError;

const LEADER_LEN: usize = 24;
const DIRECTORY_ENTRY_LEN: usize = 12;
const FIELD_TERMINATOR: u8 = 0x1E;
const RECORD_TERMINATOR: u8 = 0x1D;
const SUBFIELD_DELIMITER: u8 = 0x1F;

/// The two things the join needs from a bibliographic record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Control field 001.
    pub bib_id: String,
    /// First `856 $u`, if any.
    pub url: Option<String>,
}

pub fn read_catalog(path: &Path) -> Result<Vec<CatalogEntry>, IoError> {
    let bytes = std::fs::read(path)?;
    parse_marc(&bytes)
}

/// Parse a file of concatenated ISO 2709 records.
///
/// Records without an 001 control field are skipped. Any structural error
/// (bad leader, directory out of bounds, missing terminator) fails the
/// whole file.
pub fn parse_marc(data: &[u8]) -> Result<Vec<CatalogEntry>, IoError> {
    let mut entries = Vec::new();
    let mut offset = 0;
    let mut n = 0;

    while offset < data.len() {
        if data[offset].is_ascii_whitespace() {
            offset += 1;
            continue;
        }
        n += 1;
        let rest = &data[offset..];
        if rest.len() < LEADER_LEN {
            return Err(marc_err(n, "truncated leader"));
        }
        let record_len = ascii_number(&rest[0..5]).ok_or_else(|| marc_err(n, "bad record length"))?;
        if record_len < LEADER_LEN + 1 || record_len > rest.len() {
            return Err(marc_err(n, "record length out of bounds"));
        }
        let raw = &rest[..record_len];
        if raw[record_len - 1] != RECORD_TERMINATOR {
            return Err(marc_err(n, "missing record terminator"));
        }

        match parse_record(raw).map_err(|msg| marc_err(n, &msg))? {
            Some(entry) => entries.push(entry),
            None => debug!(record = n, "MARC record without 001 skipped"),
        }
        offset += record_len;
    }

    Ok(entries)
}

fn parse_record(raw: &[u8]) -> Result<Option<CatalogEntry>, String> {
    let base = ascii_number(&raw[12..17]).ok_or("bad base address of data")?;
    if base <= LEADER_LEN || base > raw.len() {
        return Err("base address out of bounds".to_string());
    }
    if raw[base - 1] != FIELD_TERMINATOR {
        return Err("directory not terminated".to_string());
    }
    let directory = &raw[LEADER_LEN..base - 1];
    if directory.len() % DIRECTORY_ENTRY_LEN != 0 {
        return Err("directory length is not a multiple of 12".to_string());
    }

    let mut bib_id = None;
    let mut url = None;
    for entry in directory.chunks(DIRECTORY_ENTRY_LEN) {
        let tag = &entry[0..3];
        let len = ascii_number(&entry[3..7]).ok_or("bad field length")?;
        let start = ascii_number(&entry[7..12]).ok_or("bad field offset")?;
        let begin = base + start;
        let end = begin + len;
        if end > raw.len() {
            return Err(format!(
                "field {} out of bounds",
                String::from_utf8_lossy(tag)
            ));
        }
        let mut field = &raw[begin..end];
        if let Some((&FIELD_TERMINATOR, body)) = field.split_last() {
            field = body;
        }

        match tag {
            b"001" if bib_id.is_none() => {
                let value = String::from_utf8_lossy(field).trim().to_string();
                if !value.is_empty() {
                    bib_id = Some(value);
                }
            }
            b"856" if url.is_none() => url = subfield(field, b'u'),
            _ => {}
        }
    }

    Ok(bib_id.map(|bib_id| CatalogEntry { bib_id, url }))
}

/// First occurrence of subfield `code` in a data field (indicators included).
fn subfield(field: &[u8], code: u8) -> Option<String> {
    field
        .split(|&b| b == SUBFIELD_DELIMITER)
        .skip(1)
        .find(|sf| sf.first() == Some(&code))
        .map(|sf| String::from_utf8_lossy(&sf[1..]).to_string())
}

fn ascii_number(bytes: &[u8]) -> Option<usize> {
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}

fn marc_err(n: usize, msg: &str) -> IoError {
    IoError::Marc(format!("record {n}: {msg}"))
}

// ---------------------------------------------------------------------------
// Join
// ---------------------------------------------------------------------------

/// Append an `identifier.bibID` field to every record whose handle
/// (`identifier.uri`) equals a catalog URL after trimming.
///
/// Exact comparison only. When several catalog records share a URL the
/// last one wins. Returns the number of records that gained a bib id.
pub fn attach_catalog_ids(records: &mut [HarvestedRecord], catalog: &[CatalogEntry]) -> usize {
    let by_url: HashMap<&str, &str> = catalog
        .iter()
        .filter_map(|e| e.url.as_deref().map(|u| (u.trim(), e.bib_id.as_str())))
        .collect();

    let mut attached = 0;
    for record in records.iter_mut() {
        let Some(fields) = record.metadata.as_mut() else {
            continue;
        };
        let handle = fields
            .iter()
            .rev()
            .find(|f| f.is("identifier", "uri"))
            .and_then(|f| f.text.as_deref());
        let Some(bib_id) = handle.and_then(|h| by_url.get(h.trim()).copied()) else {
            continue;
        };
        fields.push(DimField::new("identifier", Some("bibID"), Some(bib_id)));
        attached += 1;
    }

    info!(catalog = catalog.len(), attached, "catalog ids attached");
    attached
}
