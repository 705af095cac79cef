// N-Triples reader and person-graph flattening

use tracing::warn;

use scholarlink_recon::model::NameIndex;

use crate::error::IoError;

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const SKOS_PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
pub const FOAF_PERSON: &str = "http://xmlns.com/foaf/0.1/Person";
pub const VIVO_RELATED_BY: &str = "http://vivoweb.org/ontology/core#relatedBy";
pub const HR_POSITION_IN_UNIT: &str = "http://vivo.cornell.edu/ns/hr/0.9/hr.owl#positionInUnit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal {
        value: String,
        lang: Option<String>,
        datatype: Option<String>,
    },
}

impl Term {
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(iri) => Some(iri),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Term::Literal { value, .. } => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub subject: Term,
    pub predicate: String,
    pub object: Term,
}

/// Parse an N-Triples document. Blank lines and `#` comments are skipped.
pub fn parse_ntriples(input: &str) -> Result<Vec<Triple>, IoError> {
    let mut triples = Vec::new();
    for (n, line) in input.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let triple = parse_line(trimmed).map_err(|message| IoError::NTriples {
            line: n + 1,
            message,
        })?;
        triples.push(triple);
    }
    Ok(triples)
}

// ---------------------------------------------------------------------------
// Graph queries
// ---------------------------------------------------------------------------

/// Distinct IRI objects of `predicate`, in first-seen order.
pub fn objects_of(triples: &[Triple], predicate: &str) -> Vec<String> {
    distinct(
        triples
            .iter()
            .filter(|t| t.predicate == predicate)
            .filter_map(|t| t.object.as_iri()),
    )
}

/// Distinct IRI subjects of `predicate`, in first-seen order.
pub fn subjects_of(triples: &[Triple], predicate: &str) -> Vec<String> {
    distinct(
        triples
            .iter()
            .filter(|t| t.predicate == predicate)
            .filter_map(|t| t.subject.as_iri()),
    )
}

fn distinct<'a>(iris: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for iri in iris {
        if !out.iter().any(|u| u == iri) {
            out.push(iri.to_string());
        }
    }
    out
}

/// Add every `foaf:Person` subject to `index`, labelled by its first
/// `skos:prefLabel`, else its first `rdfs:label`.
///
/// Returns the number of people added or relabelled. People without any
/// label are skipped with a warning.
pub fn collect_people(triples: &[Triple], index: &mut NameIndex) -> usize {
    let mut people: Vec<&str> = Vec::new();
    for t in triples {
        if t.predicate == RDF_TYPE && t.object.as_iri() == Some(FOAF_PERSON) {
            if let Some(id) = t.subject.as_iri() {
                if !people.contains(&id) {
                    people.push(id);
                }
            }
        }
    }

    let mut added = 0;
    for id in people {
        match label_of(triples, id) {
            Some(label) => {
                index.insert(id, label);
                added += 1;
            }
            None => warn!(person = id, "person has no label; skipped"),
        }
    }
    added
}

fn label_of<'a>(triples: &'a [Triple], id: &str) -> Option<&'a str> {
    let first = |predicate: &str| {
        triples
            .iter()
            .filter(|t| t.predicate == predicate && t.subject.as_iri() == Some(id))
            .find_map(|t| t.object.as_literal())
    };
    first(SKOS_PREF_LABEL).or_else(|| first(RDFS_LABEL))
}

// ---------------------------------------------------------------------------
// Line parser
// ---------------------------------------------------------------------------

struct Cursor<'a> {
    rest: &'a str,
}

impl Cursor<'_> {
    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t']);
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn expect(&mut self, c: char) -> Result<(), String> {
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                Ok(())
            }
            None => Err(format!("expected '{c}' at '{}'", preview(self.rest))),
        }
    }

    fn iri(&mut self) -> Result<String, String> {
        self.expect('<')?;
        let end = self
            .rest
            .find('>')
            .ok_or_else(|| "unterminated IRI".to_string())?;
        let raw = &self.rest[..end];
        self.rest = &self.rest[end + 1..];
        if raw.contains([' ', '<', '"']) {
            return Err(format!("invalid IRI <{raw}>"));
        }
        unescape(raw)
    }

    fn blank(&mut self) -> Result<String, String> {
        let rest = self
            .rest
            .strip_prefix("_:")
            .ok_or_else(|| "expected blank node".to_string())?;
        let end = rest
            .find(|c: char| c.is_whitespace())
            .unwrap_or(rest.len());
        if end == 0 {
            return Err("empty blank node label".to_string());
        }
        self.rest = &rest[end..];
        Ok(rest[..end].to_string())
    }

    fn literal(&mut self) -> Result<Term, String> {
        self.expect('"')?;
        let mut end = None;
        let mut escaped = false;
        for (i, c) in self.rest.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    end = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let end = end.ok_or_else(|| "unterminated literal".to_string())?;
        let value = unescape(&self.rest[..end])?;
        self.rest = &self.rest[end + 1..];

        let mut lang = None;
        let mut datatype = None;
        if let Some(rest) = self.rest.strip_prefix('@') {
            let end = rest
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                .unwrap_or(rest.len());
            if end == 0 {
                return Err("empty language tag".to_string());
            }
            lang = Some(rest[..end].to_string());
            self.rest = &rest[end..];
        } else if let Some(rest) = self.rest.strip_prefix("^^") {
            self.rest = rest;
            datatype = Some(self.iri()?);
        }
        Ok(Term::Literal {
            value,
            lang,
            datatype,
        })
    }

    fn subject(&mut self) -> Result<Term, String> {
        match self.peek() {
            Some('<') => self.iri().map(Term::Iri),
            Some('_') => self.blank().map(Term::Blank),
            _ => Err(format!("invalid subject at '{}'", preview(self.rest))),
        }
    }

    fn object(&mut self) -> Result<Term, String> {
        match self.peek() {
            Some('<') => self.iri().map(Term::Iri),
            Some('_') => self.blank().map(Term::Blank),
            Some('"') => self.literal(),
            _ => Err(format!("invalid object at '{}'", preview(self.rest))),
        }
    }
}

fn parse_line(line: &str) -> Result<Triple, String> {
    let mut cur = Cursor { rest: line };
    let subject = cur.subject()?;
    cur.skip_ws();
    let predicate = cur.iri()?;
    cur.skip_ws();
    let object = cur.object()?;
    cur.skip_ws();
    cur.expect('.')?;
    cur.skip_ws();
    if !cur.rest.is_empty() && !cur.rest.starts_with('#') {
        return Err(format!("trailing content '{}'", preview(cur.rest)));
    }
    Ok(Triple {
        subject,
        predicate,
        object,
    })
}

fn unescape(raw: &str) -> Result<String, String> {
    if !raw.contains('\\') {
        return Ok(raw.to_string());
    }
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('\\') => out.push('\\'),
            Some('u') => out.push(hex_char(&mut chars, 4)?),
            Some('U') => out.push(hex_char(&mut chars, 8)?),
            Some(other) => return Err(format!("invalid escape '\\{other}'")),
            None => return Err("dangling backslash".to_string()),
        }
    }
    Ok(out)
}

fn hex_char(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<char, String> {
    let hex: String = chars.by_ref().take(digits).collect();
    if hex.len() != digits {
        return Err("truncated unicode escape".to_string());
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid unicode escape '{hex}'"))
}

fn preview(s: &str) -> &str {
    match s.char_indices().nth(20) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}
