//! `scholarlink.toml` - matching policy plus harvester settings.
//!
//! ```toml
//! [match]
//! acceptance_threshold = 90
//! roles = ["chair", "committeeMember", "coChair", "advisor"]
//!
//! [match.scoring]
//! initial_penalty = 10
//!
//! [harvest]
//! endpoint = "https://ecommons.cornell.edu/dspace-oai/request"
//! staleness_days = 90
//! max_retries = 3
//! backoff_secs = 60
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use scholarlink_recon::ReconConfig;

use crate::exit_codes::{EXIT_IO, EXIT_USAGE};
use crate::CliError;

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "scholarlink.toml";

pub const DEFAULT_ENDPOINT: &str = "https://ecommons.cornell.edu/dspace-oai/request";
pub const DEFAULT_STALENESS_DAYS: u64 = 90;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_SECS: u64 = 60;
pub const DEFAULT_MAX_THROTTLE_WAITS: u32 = 20;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(rename = "match", default)]
    pub matching: ReconConfig,
    #[serde(default)]
    pub harvest: HarvestConfig,
}

/// OAI-PMH endpoint, snapshot freshness and the shared retry policy.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarvestConfig {
    pub endpoint: String,
    /// Snapshot older than this is re-harvested.
    pub staleness_days: u64,
    /// Recoveries from transient failures (network, 429, 5xx other than
    /// 503) allowed per fetch session.
    pub max_retries: u32,
    /// Fixed sleep before each recovery.
    pub backoff_secs: u64,
    /// Upper bound on consecutive 503 + Retry-After waits for one request.
    pub max_throttle_waits: u32,
    pub timeout_secs: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            staleness_days: DEFAULT_STALENESS_DAYS,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_secs: DEFAULT_BACKOFF_SECS,
            max_throttle_waits: DEFAULT_MAX_THROTTLE_WAITS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl HarvestConfig {
    pub fn staleness(&self) -> Duration {
        Duration::from_secs(self.staleness_days * 24 * 60 * 60)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.endpoint.starts_with("http://") || self.endpoint.starts_with("https://")) {
            return Err(format!(
                "harvest.endpoint must be an http(s) URL, got \"{}\"",
                self.endpoint
            ));
        }
        if self.timeout_secs == 0 {
            return Err("harvest.timeout_secs must be positive".into());
        }
        Ok(())
    }
}

impl AppConfig {
    pub fn from_toml(input: &str) -> Result<Self, CliError> {
        let config: AppConfig = toml::from_str(input).map_err(|e| CliError {
            code: EXIT_USAGE,
            message: format!("config parse error: {e}"),
            hint: None,
        })?;
        config.matching.validate().map_err(|e| CliError {
            code: EXIT_USAGE,
            message: e.to_string(),
            hint: None,
        })?;
        config.harvest.validate().map_err(|msg| CliError {
            code: EXIT_USAGE,
            message: format!("config validation error: {msg}"),
            hint: None,
        })?;
        Ok(config)
    }

    /// Explicit path (flag or `SCHOLARLINK_CONFIG`), else `./scholarlink.toml`
    /// if present, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let path: PathBuf = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let implicit = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !implicit.is_file() {
                    return Ok(AppConfig::default());
                }
                implicit
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|e| CliError {
            code: EXIT_IO,
            message: format!("cannot read config {}: {e}", path.display()),
            hint: None,
        })?;
        Self::from_toml(&text).map_err(|e| e.with_hint(format!("in {}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scholarlink_recon::Role;

    #[test]
    fn empty_document_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.matching.acceptance_threshold, 90);
        assert_eq!(config.harvest.max_retries, 3);
        assert_eq!(config.harvest.backoff_secs, 60);
        assert_eq!(config.harvest.staleness(), Duration::from_secs(90 * 86_400));
    }

    #[test]
    fn sections_override_defaults() {
        let config = AppConfig::from_toml(
            r#"
[match]
acceptance_threshold = 85
roles = ["advisor"]

[match.scoring]
initial_penalty = 20

[harvest]
endpoint = "http://localhost:8080/oai/request"
backoff_secs = 0
"#,
        )
        .unwrap();
        assert_eq!(config.matching.acceptance_threshold, 85);
        assert_eq!(config.matching.roles, vec![Role::Advisor]);
        assert_eq!(config.matching.scoring.initial_penalty, 20);
        assert_eq!(config.matching.scoring.edit_notable_floor, 85);
        assert_eq!(config.harvest.endpoint, "http://localhost:8080/oai/request");
        assert_eq!(config.harvest.backoff_secs, 0);
        assert_eq!(config.harvest.staleness_days, 90);
    }

    #[test]
    fn invalid_match_section_is_a_usage_error() {
        let err = AppConfig::from_toml("[match]\nacceptance_threshold = 150\n").unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.message.contains("acceptance_threshold"));
    }

    #[test]
    fn unknown_role_is_a_parse_error() {
        let err = AppConfig::from_toml("[match]\nroles = [\"dean\"]\n").unwrap_err();
        assert_eq!(err.code, EXIT_USAGE);
        assert!(err.message.contains("config parse error"));
    }

    #[test]
    fn non_http_endpoint_rejected() {
        let err = AppConfig::from_toml("[harvest]\nendpoint = \"ftp://x\"\n").unwrap_err();
        assert!(err.message.contains("harvest.endpoint"));
    }

    #[test]
    fn unknown_section_rejected() {
        assert!(AppConfig::from_toml("[output]\nformat = \"xlsx\"\n").is_err());
    }

    #[test]
    fn missing_explicit_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert_eq!(err.code, EXIT_IO);
    }
}
