use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::model::Role;

pub const DEFAULT_ACCEPTANCE_THRESHOLD: u8 = 90;
pub const DEFAULT_INITIAL_PENALTY: u8 = 10;
pub const DEFAULT_EDIT_NOTABLE_FLOOR: u8 = 85;
pub const DEFAULT_OVERLAP_NOTABLE_FLOOR: u8 = 80;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Matching policy. Every field has a default, so an empty document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconConfig {
    /// A pair is accepted only when its score is strictly greater than this.
    #[serde(default = "default_acceptance_threshold")]
    pub acceptance_threshold: u8,
    /// Contributor qualifiers that make a record a candidate.
    #[serde(default = "default_roles")]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

impl Default for ReconConfig {
    fn default() -> Self {
        Self {
            acceptance_threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
            roles: default_roles(),
            scoring: ScoringConfig::default(),
        }
    }
}

fn default_acceptance_threshold() -> u8 {
    DEFAULT_ACCEPTANCE_THRESHOLD
}

fn default_roles() -> Vec<Role> {
    Role::ALL.to_vec()
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Scorer knobs.
///
/// The notable floors only decide which comparisons get a diagnostic line;
/// they never affect acceptance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_initial_penalty")]
    pub initial_penalty: u8,
    #[serde(default = "default_edit_notable_floor")]
    pub edit_notable_floor: u8,
    #[serde(default = "default_overlap_notable_floor")]
    pub overlap_notable_floor: u8,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            initial_penalty: DEFAULT_INITIAL_PENALTY,
            edit_notable_floor: DEFAULT_EDIT_NOTABLE_FLOOR,
            overlap_notable_floor: DEFAULT_OVERLAP_NOTABLE_FLOOR,
        }
    }
}

fn default_initial_penalty() -> u8 {
    DEFAULT_INITIAL_PENALTY
}

fn default_edit_notable_floor() -> u8 {
    DEFAULT_EDIT_NOTABLE_FLOOR
}

fn default_overlap_notable_floor() -> u8 {
    DEFAULT_OVERLAP_NOTABLE_FLOOR
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ReconConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: ReconConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        let percentages = [
            ("acceptance_threshold", self.acceptance_threshold),
            ("scoring.initial_penalty", self.scoring.initial_penalty),
            ("scoring.edit_notable_floor", self.scoring.edit_notable_floor),
            ("scoring.overlap_notable_floor", self.scoring.overlap_notable_floor),
        ];
        for (name, value) in percentages {
            if value > 100 {
                return Err(ReconError::ConfigValidation(format!(
                    "{name} must be between 0 and 100, got {value}"
                )));
            }
        }

        if self.roles.is_empty() {
            return Err(ReconError::ConfigValidation(
                "at least one contributor role is required".into(),
            ));
        }

        for (i, role) in self.roles.iter().enumerate() {
            if self.roles[..i].contains(role) {
                return Err(ReconError::ConfigValidation(format!(
                    "role '{role}' listed more than once"
                )));
            }
        }

        Ok(())
    }

    /// Strict `>`: a score equal to the threshold is rejected.
    pub fn accepts(&self, score: u8) -> bool {
        score > self.acceptance_threshold
    }

    pub fn recognizes(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
