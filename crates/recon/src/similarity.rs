//! The two independent string-similarity measures behind the scorer.
//!
//! Both are symmetric and return 100 for identical non-empty input.

/// Levenshtein ratio scaled to 0..=100: `1 - distance / max(len)` over chars.
pub fn edit_ratio(a: &str, b: &str) -> u8 {
    to_percent(strsim::normalized_levenshtein(a, b))
}

/// Letter-pair overlap scaled to 0..=100. See [`strike_a_match`].
pub fn overlap_ratio(a: &str, b: &str) -> u8 {
    to_percent(strike_a_match(a, b))
}

/// Dice coefficient over the adjacent letter pairs of each word.
///
/// Words are split on whitespace and upper-cased, so word order and case do
/// not matter but spelling inside a word does. Each pair of `b` can be
/// matched at most once.
pub fn strike_a_match(a: &str, b: &str) -> f64 {
    let pairs_a = letter_pairs(a);
    let mut pairs_b = letter_pairs(b);

    let union = pairs_a.len() + pairs_b.len();
    if union == 0 {
        // Nothing to compare (single letters, empty strings).
        return if a.to_uppercase() == b.to_uppercase() { 1.0 } else { 0.0 };
    }

    let mut common = 0usize;
    for pair in &pairs_a {
        if let Some(pos) = pairs_b.iter().position(|p| p == pair) {
            pairs_b.swap_remove(pos);
            common += 1;
        }
    }

    (2 * common) as f64 / union as f64
}

fn letter_pairs(s: &str) -> Vec<(char, char)> {
    let mut pairs = Vec::new();
    for word in s.split_whitespace() {
        let chars: Vec<char> = word.to_uppercase().chars().collect();
        pairs.extend(chars.windows(2).map(|w| (w[0], w[1])));
    }
    pairs
}

fn to_percent(ratio: f64) -> u8 {
    (ratio * 100.0).round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edit_ratio_basics() {
        assert_eq!(edit_ratio("Smith, John A.", "Smith, John A."), 100);
        assert_eq!(edit_ratio("", ""), 100);
        assert_eq!(edit_ratio("abc", ""), 0);
        // one substitution in 14 chars
        assert_eq!(edit_ratio("Smith, John A.", "Smith, John B."), 93);
        // one substitution in 10 / 11 chars
        assert_eq!(edit_ratio("abcdefghij", "abcdefghiX"), 90);
        assert_eq!(edit_ratio("abcdefghijk", "abcdefghijX"), 91);
    }

    #[test]
    fn strike_a_match_classic_example() {
        // FRANCE: FR RA AN NC CE, FRENCH: FR RE EN NC CH -> 2*2/10
        assert!((strike_a_match("France", "French") - 0.4).abs() < 1e-9);
    }

    #[test]
    fn strike_a_match_ignores_case_and_word_order() {
        assert_eq!(strike_a_match("John Smith", "SMITH john"), 1.0);
    }

    #[test]
    fn strike_a_match_counts_repeated_pairs_once_each() {
        // AA AA vs AA: one common pair out of three
        assert!((strike_a_match("AAA", "AA") - 2.0 / 3.0).abs() < 1e-9);
        assert!((strike_a_match("AA", "AAA") - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn strike_a_match_without_pairs() {
        assert_eq!(strike_a_match("a", "A"), 1.0);
        assert_eq!(strike_a_match("a", "b"), 0.0);
        assert_eq!(strike_a_match("", ""), 1.0);
    }

    #[test]
    fn overlap_ratio_initial_collision() {
        // 9 pairs each, 8 shared
        assert_eq!(overlap_ratio("Smith, John A.", "Smith, John B."), 89);
        assert_eq!(overlap_ratio("Smith, John A.", "Smith, John A."), 100);
    }

    #[test]
    fn unrelated_names_score_low() {
        assert!(edit_ratio("Smith, John A.", "Jones, Mary B.") < 50);
        assert!(overlap_ratio("Smith, John A.", "Jones, Mary B.") < 50);
    }
}
