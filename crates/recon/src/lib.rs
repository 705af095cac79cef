//! `scholarlink-recon` - person-graph ↔ deposit-record name reconciliation.
//!
//! Pure engine crate: receives a name index and parsed records, returns the
//! two match relations. No CLI or IO dependencies.

pub mod candidates;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod matcher;
pub mod model;
pub mod names;
pub mod similarity;

pub use candidates::{select_candidates, CandidateSet};
pub use config::{ReconConfig, ScoringConfig};
pub use engine::{reconcile, reconcile_sharded, run, run_candidates};
pub use error::ReconError;
pub use matcher::{score, Scorer};
pub use model::{
    ContributorField, DepositRecord, Diagnostic, DimField, HarvestedRecord, NameIndex, PersonMatchRow,
    ReconResult, RecordMatchRow, Relations, Role, SkipReason, SkippedField, SkippedRecord,
};
