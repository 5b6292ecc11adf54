//! Trigram extraction and similarity, following pg_trgm.
//!
//! Text is split into words of alphanumeric characters and lower-cased.
//! Each word is padded with two leading blanks and one trailing blank, and
//! every three-character window is a trigram. Similarity is the number of
//! shared trigrams divided by the number of distinct trigrams in either
//! string.

use std::collections::HashSet;

/// Default `pg_trgm.similarity_threshold`.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

pub type Trigram = [char; 3];

pub fn trigrams(text: &str) -> HashSet<Trigram> {
    let mut set = HashSet::new();
    for word in text.split(|c: char| !c.is_alphanumeric()) {
        if word.is_empty() {
            continue;
        }
        let padded: Vec<char> = "  "
            .chars()
            .chain(word.chars().flat_map(char::to_lowercase))
            .chain(std::iter::once(' '))
            .collect();
        for w in padded.windows(3) {
            set.insert([w[0], w[1], w[2]]);
        }
    }
    set
}

/// Similarity in `[0, 1]`; zero if either side has no trigrams.
pub fn similarity(a: &str, b: &str) -> f64 {
    let ta = trigrams(a);
    let tb = trigrams(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let shared = ta.intersection(&tb).count();
    let union = ta.len() + tb.len() - shared;
    shared as f64 / union as f64
}

/// The `%` operator: similar when the score reaches `threshold`.
pub fn is_similar(a: &str, b: &str, threshold: f64) -> bool {
    similarity(a, b) >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_trigrams() {
        let t = trigrams("cat");
        let expected: HashSet<Trigram> = [
            [' ', ' ', 'c'],
            [' ', 'c', 'a'],
            ['c', 'a', 't'],
            ['a', 't', ' '],
        ]
        .into_iter()
        .collect();
        assert_eq!(t, expected);
    }

    #[test]
    fn test_case_and_punctuation_ignored() {
        assert_eq!(trigrams("SQL!"), trigrams("sql"));
    }

    #[test]
    fn test_identical_strings() {
        assert!((similarity("postgres", "postgres") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(similarity("", "anything"), 0.0);
        assert_eq!(similarity("...", "..."), 0.0);
    }

    #[test]
    fn test_partial_match() {
        // "sql" shares all four of its trigrams with the longer text.
        let text = "Full Text Search in PostgreSQL by SQLAlchemy";
        let score = similarity(text, "SQL");
        assert!(score > 0.05 && score < 0.2, "unexpected score {score}");
    }

    #[test]
    fn test_threshold_operator() {
        assert!(is_similar("word", "word", 1.0));
        assert!(!is_similar("word", "zzz", 0.3));
    }
}
