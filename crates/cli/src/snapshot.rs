//! Local OAI snapshot: freshness gate and atomic rewrite.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::info;

use crate::exit_codes::EXIT_IO;
use crate::CliError;

pub const SNAPSHOT_FILE: &str = "records.xml";

/// True when the snapshot is missing, unreadable, or last modified more
/// than `staleness` before `now`.
pub fn needs_refresh(path: &Path, staleness: Duration, now: SystemTime) -> bool {
    let modified = match fs::metadata(path).and_then(|m| m.modified()) {
        Ok(t) => t,
        Err(_) => return true,
    };
    // A timestamp in the future counts as fresh.
    let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
    let stale = age > staleness;
    info!(
        path = %path.display(),
        age_days = age.as_secs() / 86_400,
        stale,
        "snapshot age"
    );
    stale
}

/// Write the OAI envelope to a sibling temp file, then rename it over
/// `path`, so an interrupted harvest never leaves a truncated snapshot.
pub fn write(path: &Path, fragments: &[String]) -> Result<(), CliError> {
    let tmp = path.with_extension("xml.partial");
    let file = File::create(&tmp).map_err(|e| io_err(&tmp, e))?;
    scholarlink_io::oai::write_snapshot(BufWriter::new(file), fragments).map_err(|e| CliError {
        code: EXIT_IO,
        message: format!("cannot write {}: {e}", tmp.display()),
        hint: None,
    })?;
    fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    info!(path = %path.display(), records = fragments.len(), "snapshot written");
    Ok(())
}

fn io_err(path: &Path, e: std::io::Error) -> CliError {
    CliError {
        code: EXIT_IO,
        message: format!("cannot write {}: {e}", path.display()),
        hint: None,
    }
}
