use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// People
// ---------------------------------------------------------------------------

/// One person from the person graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub id: String,
    pub label: String,
}

/// Person id -> display label, in source order.
///
/// Built once per run and only read during matching. Iteration order is the
/// order in which ids were first inserted, so repeated runs over the same
/// source visit people in the same order. Re-inserting an id replaces its
/// label but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameIndex {
    people: Vec<Person>,
    positions: HashMap<String, usize>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or relabel a person. Returns `true` if the id was new.
    pub fn insert(&mut self, id: impl Into<String>, label: impl Into<String>) -> bool {
        let id = id.into();
        let label = label.into();
        if let Some(&pos) = self.positions.get(&id) {
            self.people[pos].label = label;
            return false;
        }
        self.positions.insert(id.clone(), self.people.len());
        self.people.push(Person { id, label });
        true
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.positions
            .get(id)
            .map(|&pos| self.people[pos].label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.people.iter()
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }
}

impl<I: Into<String>, L: Into<String>> FromIterator<(I, L)> for NameIndex {
    fn from_iter<T: IntoIterator<Item = (I, L)>>(iter: T) -> Self {
        let mut index = NameIndex::new();
        for (id, label) in iter {
            index.insert(id, label);
        }
        index
    }
}

impl Serialize for NameIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.people.iter().map(|p| (&p.id, &p.label)))
    }
}

impl<'de> Deserialize<'de> for NameIndex {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IndexVisitor;

        impl<'de> Visitor<'de> for IndexVisitor {
            type Value = NameIndex;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping person ids to labels")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<NameIndex, A::Error> {
                let mut index = NameIndex::new();
                while let Some((id, label)) = map.next_entry::<String, String>()? {
                    index.insert(id, label);
                }
                Ok(index)
            }
        }

        deserializer.deserialize_map(IndexVisitor)
    }
}

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

/// Contributor relationships recognized on deposit records.
///
/// Serialized with the repository's qualifier spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    Chair,
    CommitteeMember,
    CoChair,
    Advisor,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Chair, Role::CommitteeMember, Role::CoChair, Role::Advisor];

    pub fn qualifier(&self) -> &'static str {
        match self {
            Self::Chair => "chair",
            Self::CommitteeMember => "committeeMember",
            Self::CoChair => "coChair",
            Self::Advisor => "advisor",
        }
    }

    pub fn from_qualifier(qualifier: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.qualifier() == qualifier)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.qualifier())
    }
}

// ---------------------------------------------------------------------------
// Harvested records (parser boundary)
// ---------------------------------------------------------------------------

/// One `dim:field` triple. Qualifier and text may be absent in the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimField {
    pub element: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl DimField {
    pub fn new(element: &str, qualifier: Option<&str>, text: Option<&str>) -> Self {
        Self {
            element: element.to_string(),
            qualifier: qualifier.map(str::to_string),
            text: text.map(str::to_string),
        }
    }

    pub fn is(&self, element: &str, qualifier: &str) -> bool {
        self.element == element && self.qualifier.as_deref() == Some(qualifier)
    }
}

/// A repository record as it comes out of the snapshot parser.
///
/// `metadata` is `None` when the record carries no metadata block at all
/// (deleted records, truncated harvests).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestedRecord {
    pub identifier: String,
    #[serde(default)]
    pub set_specs: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Vec<DimField>>,
}

// ---------------------------------------------------------------------------
// Candidate records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorField {
    pub role: Role,
    pub text: String,
}

/// A deposit record that passed role filtering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositRecord {
    pub handle: String,
    pub header_id: String,
    pub set_specs: Vec<String>,
    pub subjects: Vec<String>,
    pub bib_id: Option<String>,
    pub contributors: Vec<ContributorField>,
}

/// Why a record was left out of matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No metadata block / field list.
    MissingMetadata,
    /// A field the engine needs is absent (named as `element.qualifier`).
    MissingField(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingMetadata => write!(f, "missing metadata"),
            Self::MissingField(name) => write!(f, "missing field {name}"),
        }
    }
}

impl Serialize for SkipReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub record_id: String,
    pub reason: SkipReason,
}

/// A recognized contributor field left out of matching; the rest of its
/// record is still matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedField {
    pub record_id: String,
    /// `element.qualifier`, e.g. `contributor.chair`.
    pub field: String,
}

/// One entry of [`ReconResult::diagnostics`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    SkippedRecord(SkippedRecord),
    SkippedField(SkippedField),
}

impl Diagnostic {
    pub fn record_id(&self) -> &str {
        match self {
            Self::SkippedRecord(r) => &r.record_id,
            Self::SkippedField(f) => &f.record_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Match relations
// ---------------------------------------------------------------------------

/// Person-view row: `[uri, label, EChandle, element_qualifier, EClabel, subjects, bibID]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PersonMatchRow {
    pub person_id: String,
    pub person_label: String,
    pub handle: String,
    pub qualifier: Role,
    pub record_label: String,
    pub subjects: Vec<String>,
    pub bib_id: Option<String>,
}

/// Record-view row: `[handle, set, oaiID, subjects, element, qualifier, personURI, bibID]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecordMatchRow {
    pub handle: String,
    pub set_specs: Vec<String>,
    pub header_id: String,
    pub subjects: Vec<String>,
    pub element: String,
    pub qualifier: Role,
    pub person_id: String,
    pub bib_id: Option<String>,
}

/// The two co-indexed output relations plus loop counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations {
    pub person_matches: Vec<PersonMatchRow>,
    pub record_matches: Vec<RecordMatchRow>,
    /// Contributor fields that went through the people loop.
    pub fields_compared: usize,
    /// Contributor fields with no person above threshold.
    pub unmatched_fields: usize,
    /// Scorer invocations.
    pub comparisons: usize,
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ReconSummary {
    pub people: usize,
    pub records_seen: usize,
    pub candidates: usize,
    pub non_candidates: usize,
    pub skipped: usize,
    pub skipped_fields: usize,
    pub fields_compared: usize,
    pub comparisons: usize,
    pub unmatched_fields: usize,
    pub person_matches: usize,
    pub record_matches: usize,
    pub matched_people: usize,
    pub matched_records: usize,
    pub role_counts: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconMeta {
    pub engine_version: String,
    pub run_at: String,
    pub acceptance_threshold: u8,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReconResult {
    pub meta: ReconMeta,
    pub summary: ReconSummary,
    pub person_matches: Vec<PersonMatchRow>,
    pub record_matches: Vec<RecordMatchRow>,
    pub diagnostics: Vec<Diagnostic>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_index_keeps_first_position_on_relabel() {
        let mut index = NameIndex::new();
        assert!(index.insert("u1", "Smith, John"));
        assert!(index.insert("u2", "Jones, Mary"));
        assert!(!index.insert("u1", "Smith, John A."));

        let ids: Vec<&str> = index.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["u1", "u2"]);
        assert_eq!(index.get("u1"), Some("Smith, John A."));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn name_index_json_preserves_order() {
        let json = r#"{"z": "Zed, Zoe", "a": "Able, Ann", "m": "Moe, Max"}"#;
        let index: NameIndex = serde_json::from_str(json).unwrap();
        let ids: Vec<&str> = index.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);

        let back = serde_json::to_string(&index).unwrap();
        assert_eq!(back, r#"{"z":"Zed, Zoe","a":"Able, Ann","m":"Moe, Max"}"#);
    }

    #[test]
    fn role_qualifier_round_trip() {
        for role in Role::ALL {
            assert_eq!(Role::from_qualifier(role.qualifier()), Some(role));
        }
        assert_eq!(Role::from_qualifier("author"), None);
        assert_eq!(Role::from_qualifier("Advisor"), None);
        assert_eq!(
            serde_json::to_string(&Role::CommitteeMember).unwrap(),
            "\"committeeMember\""
        );
    }

    #[test]
    fn skip_reason_display() {
        assert_eq!(SkipReason::MissingMetadata.to_string(), "missing metadata");
        assert_eq!(
            SkipReason::MissingField("identifier.uri".into()).to_string(),
            "missing field identifier.uri"
        );
    }
}
