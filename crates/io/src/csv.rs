// Person-view and record-view CSV tables

use std::fs::File;
use std::io::Write;
use std::path::Path;

use scholarlink_recon::model::{PersonMatchRow, RecordMatchRow};

use crate::error::IoError;

pub const PERSON_HEADER: [&str; 7] = [
    "uri",
    "label",
    "EChandle",
    "element_qualifier",
    "EClabel",
    "subjects",
    "bibID",
];

pub const RECORD_HEADER: [&str; 8] = [
    "handle",
    "set",
    "oaiID",
    "subjects",
    "element",
    "qualifier",
    "personURI",
    "bibID",
];

/// Separator for list-valued cells (subjects, set memberships).
pub const LIST_SEPARATOR: &str = "; ";

pub fn write_person_matches<W: Write>(out: W, rows: &[PersonMatchRow]) -> Result<(), IoError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(PERSON_HEADER)?;
    for row in rows {
        wtr.write_record([
            row.person_id.as_str(),
            row.person_label.as_str(),
            row.handle.as_str(),
            row.qualifier.qualifier(),
            row.record_label.as_str(),
            join_list(&row.subjects).as_str(),
            row.bib_id.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_record_matches<W: Write>(out: W, rows: &[RecordMatchRow]) -> Result<(), IoError> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(RECORD_HEADER)?;
    for row in rows {
        wtr.write_record([
            row.handle.as_str(),
            join_list(&row.set_specs).as_str(),
            row.header_id.as_str(),
            join_list(&row.subjects).as_str(),
            row.element.as_str(),
            row.qualifier.qualifier(),
            row.person_id.as_str(),
            row.bib_id.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_person_matches(path: &Path, rows: &[PersonMatchRow]) -> Result<(), IoError> {
    write_person_matches(File::create(path)?, rows)
}

pub fn export_record_matches(path: &Path, rows: &[RecordMatchRow]) -> Result<(), IoError> {
    write_record_matches(File::create(path)?, rows)
}

fn join_list(items: &[String]) -> String {
    items.join(LIST_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholarlink_recon::model::Role;

    fn person_row() -> PersonMatchRow {
        PersonMatchRow {
            person_id: "http://vivo.example.edu/individual/u1".into(),
            person_label: "Smith, John A.".into(),
            handle: "https://hdl.handle.net/1813/1001".into(),
            qualifier: Role::CommitteeMember,
            record_label: "Smith, John A.".into(),
            subjects: vec!["Hydrology".into(), "Soil science".into()],
            bib_id: Some("4567890".into()),
        }
    }

    fn record_row() -> RecordMatchRow {
        RecordMatchRow {
            handle: "https://hdl.handle.net/1813/1001".into(),
            set_specs: vec!["com_1813_47".into(), "col_1813_48".into()],
            header_id: "oai:repo:1813/1001".into(),
            subjects: vec![],
            element: "contributor".into(),
            qualifier: Role::Advisor,
            person_id: "http://vivo.example.edu/individual/u1".into(),
            bib_id: None,
        }
    }

    #[test]
    fn person_table_layout() {
        let mut out = Vec::new();
        write_person_matches(&mut out, &[person_row()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "uri,label,EChandle,element_qualifier,EClabel,subjects,bibID");
        assert_eq!(
            lines[1],
            "http://vivo.example.edu/individual/u1,\"Smith, John A.\",https://hdl.handle.net/1813/1001,committeeMember,\"Smith, John A.\",Hydrology; Soil science,4567890"
        );
    }

    #[test]
    fn record_table_layout_with_missing_bib_id() {
        let mut out = Vec::new();
        write_record_matches(&mut out, &[record_row()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "handle,set,oaiID,subjects,element,qualifier,personURI,bibID");
        assert_eq!(
            lines[1],
            "https://hdl.handle.net/1813/1001,com_1813_47; col_1813_48,oai:repo:1813/1001,,contributor,advisor,http://vivo.example.edu/individual/u1,"
        );
    }

    #[test]
    fn empty_relation_writes_header_only() {
        let mut out = Vec::new();
        write_record_matches(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }

    #[test]
    fn export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        export_person_matches(&path, &[person_row(), person_row()]).unwrap();
        let mut rdr = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][3], "committeeMember");
    }
}
