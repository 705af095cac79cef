// Name index, run result and candidate backup as JSON

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use scholarlink_recon::model::{DepositRecord, NameIndex, ReconResult};

use crate::error::IoError;

/// Load a name index persisted as `{ "person id": "label", ... }`.
/// Object order becomes index order.
pub fn read_name_index(path: &Path) -> Result<NameIndex, IoError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

pub fn write_name_index(path: &Path, index: &NameIndex) -> Result<(), IoError> {
    write_pretty(path, index)
}

pub fn write_result(path: &Path, result: &ReconResult) -> Result<(), IoError> {
    write_pretty(path, result)
}

/// Backup of the filtered candidate set, one object per record.
pub fn write_candidates(path: &Path, records: &[DepositRecord]) -> Result<(), IoError> {
    write_pretty(path, records)
}

fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), IoError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
