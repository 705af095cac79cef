// scholarlink - reconcile a person graph against repository deposit records

mod config;
mod exit_codes;
mod harvest;
mod pipeline;
mod snapshot;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use config::AppConfig;
use exit_codes::{EXIT_IO, EXIT_PARSE, EXIT_SUCCESS, EXIT_USAGE};
use pipeline::{NameSource, RunOptions};

#[derive(Parser)]
#[command(name = "scholarlink")]
#[command(about = "Match people in a research graph to contributors of repository deposits")]
#[command(long_version = long_version())]
#[command(version)]
#[command(after_help = "\
Examples:
  scholarlink --uri https://vivo.example.edu/individual/dept-physics
  scholarlink --file departments.txt --data-dir runs/2024 --workers 4
  scholarlink --names data/names.json --catalog catalog.mrc --json result.json
  scholarlink --names data/names.json --refresh --quiet

Outputs (in --data-dir):
  names.json            person id -> label index (when harvested)
  records.xml           OAI-PMH snapshot, reused until stale
  candidates.json       records with at least one recognized contributor role
  person_matches.csv    one row per matched person and field
  record_matches.csv    one row per matched record and person")]
struct Cli {
    /// Department URI to collect people from
    #[arg(long, short = 'u', value_name = "URI", conflicts_with = "file")]
    uri: Option<String>,

    /// File of department URIs, one per line
    #[arg(long, short = 'f', value_name = "FILE")]
    file: Option<PathBuf>,

    /// Reuse a saved name index instead of crawling the graph
    #[arg(long, value_name = "FILE", conflicts_with_all = ["uri", "file"])]
    names: Option<PathBuf>,

    /// Directory for snapshots and output tables
    #[arg(long, value_name = "DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Config file (default: ./scholarlink.toml if present)
    #[arg(long, value_name = "FILE", env = "SCHOLARLINK_CONFIG")]
    config: Option<PathBuf>,

    /// Binary MARC catalog export used to attach bibIDs
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Re-harvest records even if the snapshot is fresh
    #[arg(long)]
    refresh: bool,

    /// Threads used for matching
    #[arg(long, value_name = "N", default_value_t = 1)]
    workers: usize,

    /// Also write the full result (rows, summary, diagnostics) as JSON
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Only warnings and errors on stderr
    #[arg(long, short = 'q')]
    quiet: bool,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nengine:  scholarlink-recon ", env!("CARGO_PKG_VERSION"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = cmd_reconcile(cli);

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn cmd_reconcile(cli: Cli) -> Result<(), CliError> {
    let source = match (cli.uri, cli.file, cli.names) {
        (Some(uri), _, _) => NameSource::Uri(uri),
        (_, Some(file), _) => NameSource::UriFile(file),
        (_, _, Some(names)) => NameSource::Saved(names),
        (None, None, None) => {
            eprintln!("{}", Cli::command().render_usage());
            return Err(CliError::args("no people source given")
                .with_hint("pass --uri, --file or --names; see scholarlink --help"));
        }
    };
    if cli.workers == 0 {
        return Err(CliError::args("--workers must be at least 1"));
    }

    init_tracing(cli.quiet);

    let config = AppConfig::load(cli.config.as_deref())?;
    let opts = RunOptions {
        source,
        data_dir: cli.data_dir,
        catalog: cli.catalog,
        refresh: cli.refresh,
        workers: cli.workers,
        json: cli.json,
        quiet: cli.quiet,
    };

    let result = pipeline::run(&opts, &config)?;
    if !cli.quiet {
        pipeline::print_summary(&result);
    }
    Ok(())
}

/// `RUST_LOG` wins; otherwise `info`, or `warn` with `--quiet`.
fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self { code: EXIT_PARSE, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
