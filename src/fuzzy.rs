// src/fuzzy.rs
//! Word similarity for reply matching.
//!
//! Similarity is the normalized inverse of the Levenshtein distance between the two
//! lowercased words: `(L - distance) / L` with `L` the longer length in chars.
//! Distance comes from `strsim::levenshtein` (two-row DP, equal to the full matrix).

use strsim::levenshtein;

/// Case-insensitive Levenshtein distance (insert, delete, substitute each cost 1).
pub fn edit_distance(a: &str, b: &str) -> usize {
    levenshtein(&a.to_lowercase(), &b.to_lowercase())
}

/// Similarity in `[0.0, 1.0]`; two empty strings are identical (1.0).
pub fn similarity(a: &str, b: &str) -> f64 {
    // Lengths are taken after lowercasing: some chars expand when lowercased and the
    // distance is measured on the lowercased forms.
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    let dist = levenshtein(&a, &b);
    (longest - dist.min(longest)) as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(edit_distance("cat", "bat"), 1);
        assert_eq!(edit_distance("CAT", "cat"), 0);
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("", ""), 0);
    }

    #[test]
    fn identical_words_are_fully_similar() {
        for s in ["a", "hello", "Hello", "ŽLUŤOUČKÝ", "emoji 🙂"] {
            assert_eq!(similarity(s, s), 1.0, "self-similarity for {s:?}");
        }
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("WORLD", "world"), 1.0);
    }

    #[test]
    fn empty_against_non_empty_is_zero() {
        assert_eq!(similarity("", "abc"), 0.0);
        assert_eq!(similarity("abc", ""), 0.0);
    }

    #[test]
    fn threshold_neighbourhood() {
        // One substitution in four chars -> 0.75, which is NOT above the 0.75 bar.
        assert!((similarity("test", "tent") - 0.75).abs() < 1e-12);
        // One substitution in five chars -> 0.8.
        assert!((similarity("hello", "hallo") - 0.8).abs() < 1e-12);
        // Missing trailing char in six -> 5/6.
        assert!((similarity("thanks", "thank") - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn counts_chars_not_bytes() {
        // "é" is two bytes but one char: a single substitution over four chars.
        assert!((similarity("café", "cafe") - 0.75).abs() < 1e-12);
    }
}
