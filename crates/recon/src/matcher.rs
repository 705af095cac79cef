use serde::Serialize;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::names::initials_collide;
use crate::similarity::{edit_ratio, overlap_ratio};

/// Per-measure scores for one comparison, after any penalty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScoreBreakdown {
    pub edit: u8,
    pub overlap: u8,
    pub penalized: bool,
    pub score: u8,
}

/// Name-pair confidence in 0..=100.
///
/// Takes the better of the edit ratio and the letter-pair overlap. When both
/// names are `"Surname, First X."` with the same surname and first name but a
/// different initial, both measures lose `initial_penalty` points first, so
/// "Smith, John A." and "Smith, John B." stay apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer {
    config: ScoringConfig,
}

impl Scorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, a: &str, b: &str) -> u8 {
        self.breakdown(a, b).score
    }

    pub fn breakdown(&self, a: &str, b: &str) -> ScoreBreakdown {
        let mut edit = edit_ratio(a, b);
        let mut overlap = overlap_ratio(a, b);

        let penalized = initials_collide(a, b);
        if penalized {
            let penalty = self.config.initial_penalty;
            edit = edit.saturating_sub(penalty);
            overlap = overlap.saturating_sub(penalty);
            debug!(a, b, edit, overlap, penalty, "middle initial mismatch");
        }

        if edit > self.config.edit_notable_floor || overlap > self.config.overlap_notable_floor {
            debug!(a, b, edit, overlap, "notable comparison");
        }

        ScoreBreakdown {
            edit,
            overlap,
            penalized,
            score: edit.max(overlap),
        }
    }
}

/// Score with the default scoring config.
pub fn score(a: &str, b: &str) -> u8 {
    Scorer::default().score(a, b)
}
