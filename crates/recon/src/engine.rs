use std::collections::HashSet;
use std::hash::Hash;
use std::thread;

use tracing::{debug, info};

use crate::candidates::{select_candidates, CandidateSet};
use crate::config::ReconConfig;
use crate::error::ReconError;
use crate::evidence::compute_summary;
use crate::matcher::Scorer;
use crate::model::{
    DepositRecord, Diagnostic, HarvestedRecord, NameIndex, PersonMatchRow, ReconMeta, ReconResult,
    RecordMatchRow, Relations,
};

const CONTRIBUTOR_ELEMENT: &str = "contributor";

/// Filter harvested records, reconcile them against the name index, and
/// summarize. Malformed records and empty contributor fields end up in
/// `diagnostics`, never in the rows.
pub fn run(
    config: &ReconConfig,
    index: &NameIndex,
    harvested: &[HarvestedRecord],
) -> Result<ReconResult, ReconError> {
    config.validate()?;
    let candidates = select_candidates(harvested, config);
    Ok(run_candidates(config, index, candidates, 1))
}

/// Second half of [`run`] for callers that already hold the filtered
/// candidate set. `config` is assumed valid.
pub fn run_candidates(
    config: &ReconConfig,
    index: &NameIndex,
    candidates: CandidateSet,
    workers: usize,
) -> ReconResult {
    info!(
        seen = candidates.seen(),
        candidates = candidates.records.len(),
        skipped = candidates.skipped.len(),
        skipped_fields = candidates.skipped_fields.len(),
        people = index.len(),
        workers,
        "reconciling"
    );

    let relations = reconcile_sharded(config, index, &candidates.records, workers);
    let summary = compute_summary(index, &candidates, &relations);
    let diagnostics = candidates
        .skipped
        .into_iter()
        .map(Diagnostic::SkippedRecord)
        .chain(candidates.skipped_fields.into_iter().map(Diagnostic::SkippedField))
        .collect();

    ReconResult {
        meta: ReconMeta {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            acceptance_threshold: config.acceptance_threshold,
            roles: config.roles.clone(),
        },
        summary,
        person_matches: relations.person_matches,
        record_matches: relations.record_matches,
        diagnostics,
    }
}

/// Compare every recognized contributor field against every person.
///
/// Full cross product: O(records x fields x people) with no blocking, fine
/// for a few hundred records and people but it does not scale past that.
/// Rows come out in encounter order (record, then field, then index order),
/// every pair above threshold is kept, and a row equal to one already
/// emitted is dropped.
pub fn reconcile(config: &ReconConfig, index: &NameIndex, records: &[DepositRecord]) -> Relations {
    let mut acc = Accumulator::default();
    let scorer = Scorer::new(config.scoring);
    for record in records {
        acc.match_record(config, &scorer, index, record);
    }
    acc.finish()
}

/// [`reconcile`] with the record loop split over `workers` scoped threads.
///
/// Each shard fills its own buffers; shards are concatenated in record
/// order and deduplicated again, so the output equals the sequential one.
pub fn reconcile_sharded(
    config: &ReconConfig,
    index: &NameIndex,
    records: &[DepositRecord],
    workers: usize,
) -> Relations {
    if workers <= 1 || records.len() <= 1 {
        return reconcile(config, index, records);
    }

    let chunk_size = records.len().div_ceil(workers);
    let shards: Vec<Relations> = thread::scope(|scope| {
        let handles: Vec<_> = records
            .chunks(chunk_size)
            .map(|chunk| scope.spawn(move || reconcile(config, index, chunk)))
            .collect();
        handles
            .into_iter()
            .map(|h| match h.join() {
                Ok(relations) => relations,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    });

    let mut persons = UniqueRows::default();
    let mut recs = UniqueRows::default();
    let mut merged = Relations::default();
    for shard in shards {
        merged.fields_compared += shard.fields_compared;
        merged.unmatched_fields += shard.unmatched_fields;
        merged.comparisons += shard.comparisons;
        for row in shard.person_matches {
            persons.push(row);
        }
        for row in shard.record_matches {
            recs.push(row);
        }
    }
    merged.person_matches = persons.into_vec();
    merged.record_matches = recs.into_vec();
    merged
}

// ---------------------------------------------------------------------------
// Accumulation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Accumulator {
    persons: UniqueRows<PersonMatchRow>,
    records: UniqueRows<RecordMatchRow>,
    fields_compared: usize,
    unmatched_fields: usize,
    comparisons: usize,
}

impl Accumulator {
    fn match_record(
        &mut self,
        config: &ReconConfig,
        scorer: &Scorer,
        index: &NameIndex,
        record: &DepositRecord,
    ) {
        for field in &record.contributors {
            if !config.recognizes(field.role) {
                continue;
            }
            self.fields_compared += 1;

            let mut matched = false;
            for person in index.iter() {
                self.comparisons += 1;
                let score = scorer.score(&person.label, &field.text);
                if !config.accepts(score) {
                    continue;
                }
                matched = true;
                debug!(
                    person = %person.id,
                    handle = %record.handle,
                    role = %field.role,
                    score,
                    "accepted match"
                );

                self.persons.push(PersonMatchRow {
                    person_id: person.id.clone(),
                    person_label: person.label.clone(),
                    handle: record.handle.clone(),
                    qualifier: field.role,
                    record_label: field.text.clone(),
                    subjects: record.subjects.clone(),
                    bib_id: record.bib_id.clone(),
                });
                self.records.push(RecordMatchRow {
                    handle: record.handle.clone(),
                    set_specs: record.set_specs.clone(),
                    header_id: record.header_id.clone(),
                    subjects: record.subjects.clone(),
                    element: CONTRIBUTOR_ELEMENT.to_string(),
                    qualifier: field.role,
                    person_id: person.id.clone(),
                    bib_id: record.bib_id.clone(),
                });
            }

            if !matched {
                self.unmatched_fields += 1;
            }
        }
    }

    fn finish(self) -> Relations {
        Relations {
            person_matches: self.persons.into_vec(),
            record_matches: self.records.into_vec(),
            fields_compared: self.fields_compared,
            unmatched_fields: self.unmatched_fields,
            comparisons: self.comparisons,
        }
    }
}

/// Append-only rows with full-tuple duplicate suppression, in insertion order.
struct UniqueRows<T> {
    rows: Vec<T>,
    seen: HashSet<T>,
}

impl<T> Default for UniqueRows<T> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> UniqueRows<T> {
    fn push(&mut self, row: T) -> bool {
        if self.seen.contains(&row) {
            return false;
        }
        self.seen.insert(row.clone());
        self.rows.push(row);
        true
    }

    fn into_vec(self) -> Vec<T> {
        self.rows
    }
}
