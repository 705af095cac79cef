use std::collections::{BTreeMap, HashSet};

use crate::candidates::CandidateSet;
use crate::model::{NameIndex, ReconSummary, Relations};

/// Compute summary statistics for one run.
pub fn compute_summary(
    index: &NameIndex,
    candidates: &CandidateSet,
    relations: &Relations,
) -> ReconSummary {
    let mut role_counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut people = HashSet::new();
    for row in &relations.person_matches {
        *role_counts.entry(row.qualifier.to_string()).or_insert(0) += 1;
        people.insert(row.person_id.as_str());
    }

    let matched_records: HashSet<&str> = relations
        .record_matches
        .iter()
        .map(|r| r.header_id.as_str())
        .collect();

    ReconSummary {
        people: index.len(),
        records_seen: candidates.seen(),
        candidates: candidates.records.len(),
        non_candidates: candidates.non_candidates,
        skipped: candidates.skipped.len(),
        skipped_fields: candidates.skipped_fields.len(),
        fields_compared: relations.fields_compared,
        comparisons: relations.comparisons,
        unmatched_fields: relations.unmatched_fields,
        person_matches: relations.person_matches.len(),
        record_matches: relations.record_matches.len(),
        matched_people: people.len(),
        matched_records: matched_records.len(),
        role_counts,
    }
}
