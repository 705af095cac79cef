//! Quasi-structured name parsing.

use std::sync::OnceLock;

use regex::Regex;

/// `"Surname, Firstname X."` split into the part before the initial and the
/// initial itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialSplit<'a> {
    /// Surname, comma, first name and the single space before the initial.
    pub surname_first: &'a str,
    pub initial: char,
}

fn middle_initial_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z]+, *[A-Za-z]+ )([A-Za-z])\.*$").expect("static pattern")
    })
}

/// Parse `"Smith, John A."`-shaped names.
///
/// Returns `None` for anything else (full names, two-word given names,
/// hyphenated surnames); callers treat that as "no initial to compare".
pub fn parse_middle_initial(name: &str) -> Option<InitialSplit<'_>> {
    let caps = middle_initial_re().captures(name)?;
    let surname_first = caps.get(1)?.as_str();
    let initial = caps.get(2)?.as_str().chars().next()?;
    Some(InitialSplit {
        surname_first,
        initial,
    })
}

/// True when both names share surname and first name but carry different
/// middle initials.
pub fn initials_collide(a: &str, b: &str) -> bool {
    match (parse_middle_initial(a), parse_middle_initial(b)) {
        (Some(x), Some(y)) => x.surname_first == y.surname_first && x.initial != y.initial,
        _ => false,
    }
}
