//! `scholarlink-io` - file formats around the reconciliation engine.
//!
//! Readers for OAI-PMH `dim` pages and snapshots, N-Triples person graphs
//! and ISO 2709 catalogs; writers for the CSV tables and JSON outputs.

pub mod catalog;
pub mod csv;
pub mod error;
pub mod json;
pub mod ntriples;
pub mod oai;

pub use error::IoError;
