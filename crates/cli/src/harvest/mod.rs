//! Upstream sources: OAI-PMH records and the person graph.

pub mod common;
pub mod graph;
pub mod oai;

pub use common::{FetchClient, FetchSession};
pub use graph::harvest_names;
pub use oai::harvest_records;
