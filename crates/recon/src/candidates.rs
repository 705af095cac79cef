use tracing::warn;

use crate::config::ReconConfig;
use crate::model::{
    ContributorField, DepositRecord, HarvestedRecord, Role, SkipReason, SkippedField,
    SkippedRecord,
};

/// Records retained for matching, plus what happened to the rest.
#[derive(Debug, Clone, Default)]
pub struct CandidateSet {
    pub records: Vec<DepositRecord>,
    pub skipped: Vec<SkippedRecord>,
    /// Recognized contributor fields without text, dropped from otherwise
    /// usable records.
    pub skipped_fields: Vec<SkippedField>,
    /// Well-formed records without a recognized contributor field.
    pub non_candidates: usize,
}

impl CandidateSet {
    pub fn seen(&self) -> usize {
        self.records.len() + self.skipped.len() + self.non_candidates
    }
}

/// Outcome of [`adapt_record`] for a record that is not malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapted {
    /// `None` when no recognized contributor field has text.
    pub deposit: Option<DepositRecord>,
    /// Recognized contributor fields left out for having no text.
    pub empty_fields: Vec<String>,
}

/// Single filtering pass over harvested records, in source order.
///
/// A record is kept iff one of its fields is `contributor.<role>` with text
/// for a configured role. Records without metadata or handle are logged and
/// reported in `skipped`; a contributor field without text only drops that
/// field. Nothing here aborts the pass.
pub fn select_candidates(records: &[HarvestedRecord], config: &ReconConfig) -> CandidateSet {
    let mut set = CandidateSet::default();

    for record in records {
        match adapt_record(record, config) {
            Ok(adapted) => {
                for field in adapted.empty_fields {
                    warn!(record = %record.identifier, %field, "skipping contributor field without text");
                    set.skipped_fields.push(SkippedField {
                        record_id: record.identifier.clone(),
                        field,
                    });
                }
                match adapted.deposit {
                    Some(deposit) => set.records.push(deposit),
                    None => set.non_candidates += 1,
                }
            }
            Err(reason) => {
                warn!(record = %record.identifier, %reason, "skipping malformed record");
                set.skipped.push(SkippedRecord {
                    record_id: record.identifier.clone(),
                    reason,
                });
            }
        }
    }

    set
}

/// Turn one harvested record into a [`DepositRecord`].
///
/// Handle and catalog id follow last-one-wins when repeated. Fails only for
/// a missing metadata block, or a missing handle on a record that has a
/// usable contributor field.
pub fn adapt_record(record: &HarvestedRecord, config: &ReconConfig) -> Result<Adapted, SkipReason> {
    let fields = record.metadata.as_ref().ok_or(SkipReason::MissingMetadata)?;

    let mut handle = None;
    let mut bib_id = None;
    let mut subjects = Vec::new();
    let mut contributors = Vec::new();
    let mut empty_fields = Vec::new();

    for field in fields {
        if field.is("identifier", "uri") {
            if let Some(text) = &field.text {
                handle = Some(text.clone());
            }
        } else if field.is("identifier", "bibID") {
            if let Some(text) = &field.text {
                bib_id = Some(text.clone());
            }
        } else if field.element == "subject" {
            if let Some(text) = &field.text {
                subjects.push(text.clone());
            }
        } else if field.element == "contributor" {
            let Some(role) = field.qualifier.as_deref().and_then(Role::from_qualifier) else {
                continue;
            };
            if !config.recognizes(role) {
                continue;
            }
            match &field.text {
                Some(text) => contributors.push(ContributorField { role, text: text.clone() }),
                None => empty_fields.push(format!("contributor.{role}")),
            }
        }
    }

    if contributors.is_empty() {
        return Ok(Adapted { deposit: None, empty_fields });
    }

    let handle = handle.ok_or_else(|| SkipReason::MissingField("identifier.uri".into()))?;

    Ok(Adapted {
        deposit: Some(DepositRecord {
            handle,
            header_id: record.identifier.clone(),
            set_specs: record.set_specs.clone(),
            subjects,
            bib_id,
            contributors,
        }),
        empty_fields,
    })
}
