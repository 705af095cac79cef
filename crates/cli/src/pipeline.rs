//! One reconciliation run: name index, records, optional catalog join,
//! matching, and the output files under the data directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{info, warn};

use scholarlink_io::{catalog, csv, json, oai, IoError};
use scholarlink_recon::{run_candidates, select_candidates, HarvestedRecord, NameIndex, ReconResult};

use crate::config::AppConfig;
use crate::harvest::{harvest_names, harvest_records, FetchClient};
use crate::snapshot::{self, SNAPSHOT_FILE};
use crate::CliError;

pub const NAMES_FILE: &str = "names.json";
pub const CANDIDATES_FILE: &str = "candidates.json";
pub const PERSON_MATCHES_FILE: &str = "person_matches.csv";
pub const RECORD_MATCHES_FILE: &str = "record_matches.csv";

/// Where the person names come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameSource {
    /// One department URI.
    Uri(String),
    /// A file of department URIs, one per line.
    UriFile(PathBuf),
    /// A name index saved by an earlier run.
    Saved(PathBuf),
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub source: NameSource,
    pub data_dir: PathBuf,
    pub catalog: Option<PathBuf>,
    pub refresh: bool,
    pub workers: usize,
    pub json: Option<PathBuf>,
    pub quiet: bool,
}

pub fn run(opts: &RunOptions, config: &AppConfig) -> Result<ReconResult, CliError> {
    fs::create_dir_all(&opts.data_dir).map_err(|e| {
        CliError::io(format!("cannot create data dir {}: {e}", opts.data_dir.display()))
    })?;

    let index = load_names(opts, config)?;
    if index.is_empty() {
        warn!("name index is empty; nothing can match");
    }

    let mut records = load_records(opts, config)?;

    if let Some(path) = &opts.catalog {
        let entries = catalog::read_catalog(path).map_err(|e| read_failure(path, e))?;
        catalog::attach_catalog_ids(&mut records, &entries);
    }

    let candidates = select_candidates(&records, &config.matching);
    let backup = opts.data_dir.join(CANDIDATES_FILE);
    json::write_candidates(&backup, &candidates.records).map_err(|e| write_failure(&backup, e))?;

    let result = run_candidates(&config.matching, &index, candidates, opts.workers);

    let people_csv = opts.data_dir.join(PERSON_MATCHES_FILE);
    csv::export_person_matches(&people_csv, &result.person_matches)
        .map_err(|e| write_failure(&people_csv, e))?;
    wrote(opts, &people_csv);

    let records_csv = opts.data_dir.join(RECORD_MATCHES_FILE);
    csv::export_record_matches(&records_csv, &result.record_matches)
        .map_err(|e| write_failure(&records_csv, e))?;
    wrote(opts, &records_csv);

    if let Some(path) = &opts.json {
        json::write_result(path, &result).map_err(|e| write_failure(path, e))?;
        wrote(opts, path);
    }

    Ok(result)
}

/// Human summary on stderr.
pub fn print_summary(result: &ReconResult) {
    let s = &result.summary;
    eprintln!(
        "reconciled {} candidate records against {} people: {} person matches, {} record matches",
        s.candidates, s.people, s.person_matches, s.record_matches,
    );
    eprintln!(
        "records: {} seen, {} without recognized roles, {} skipped as malformed; \
         contributor fields: {} empty, {} unmatched",
        s.records_seen, s.non_candidates, s.skipped, s.skipped_fields, s.unmatched_fields,
    );
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

fn load_names(opts: &RunOptions, config: &AppConfig) -> Result<NameIndex, CliError> {
    let departments = match &opts.source {
        NameSource::Saved(path) => {
            let index = json::read_name_index(path).map_err(|e| read_failure(path, e))?;
            info!(path = %path.display(), people = index.len(), "loaded saved name index");
            return Ok(index);
        }
        NameSource::Uri(uri) => vec![uri.clone()],
        NameSource::UriFile(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| CliError::io(format!("cannot read {}: {e}", path.display())))?;
            let uris = parse_uri_list(&text);
            if uris.is_empty() {
                return Err(CliError::args(format!("{} lists no URIs", path.display()))
                    .with_hint("put one department URI per line"));
            }
            uris
        }
    };

    let client = FetchClient::new("person graph", &config.harvest)?;
    let harvest = harvest_names(&client, &departments)?;

    let saved = opts.data_dir.join(NAMES_FILE);
    json::write_name_index(&saved, &harvest.index).map_err(|e| write_failure(&saved, e))?;
    wrote(opts, &saved);
    Ok(harvest.index)
}

fn load_records(opts: &RunOptions, config: &AppConfig) -> Result<Vec<HarvestedRecord>, CliError> {
    let path = opts.data_dir.join(SNAPSHOT_FILE);
    let stale = snapshot::needs_refresh(&path, config.harvest.staleness(), SystemTime::now());

    if opts.refresh || stale {
        info!(endpoint = %config.harvest.endpoint, "harvesting repository records");
        let client = FetchClient::new("OAI-PMH", &config.harvest)?;
        let harvest = harvest_records(&client, &config.harvest.endpoint)?;
        snapshot::write(&path, &harvest.fragments)?;
        return Ok(harvest.records);
    }

    info!(path = %path.display(), "using local snapshot");
    oai::read_snapshot(&path).map_err(|e| read_failure(&path, e))
}

/// Non-empty lines that are not `#` comments.
fn parse_uri_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

fn read_failure(path: &Path, e: IoError) -> CliError {
    let message = format!("{}: {e}", path.display());
    if e.is_parse() {
        CliError::parse(message)
    } else {
        CliError::io(message)
    }
}

fn write_failure(path: &Path, e: IoError) -> CliError {
    CliError::io(format!("cannot write {}: {e}", path.display()))
}

fn wrote(opts: &RunOptions, path: &Path) {
    if !opts.quiet {
        eprintln!("wrote {}", path.display());
    }
}
