// tests/fuzzy_bounds.rs
// Seeded random check that similarity stays in [0, 1] and behaves symmetrically.

use rand::{rngs::StdRng, Rng, SeedableRng};
use selenite::fuzzy::{edit_distance, similarity};

const ALPHABET: &[char] = &[
    'a', 'b', 'c', 'A', 'B', 'Z', 'é', 'É', 'ß', 'İ', 'Σ', 'ς', '1', ' ', '!', '🙂',
];

fn random_word(rng: &mut StdRng) -> String {
    let len = rng.random_range(0..10);
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())])
        .collect()
}

#[test]
fn similarity_is_bounded_and_symmetric() {
    let mut rng = StdRng::seed_from_u64(0x5E1E_2017);
    for _ in 0..2_000 {
        let a = random_word(&mut rng);
        let b = random_word(&mut rng);
        let s = similarity(&a, &b);
        assert!(
            (0.0..=1.0).contains(&s),
            "similarity({a:?}, {b:?}) = {s} out of bounds"
        );
        assert_eq!(s, similarity(&b, &a), "asymmetric for {a:?} / {b:?}");
        assert_eq!(edit_distance(&a, &b), edit_distance(&b, &a));
    }
}

#[test]
fn self_similarity_is_one() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let a = random_word(&mut rng);
        assert_eq!(similarity(&a, &a), 1.0, "self-similarity for {a:?}");
    }
}

#[test]
fn ascii_case_never_matters() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..500 {
        let a: String = random_word(&mut rng)
            .chars()
            .filter(char::is_ascii)
            .collect();
        assert_eq!(similarity(&a, &a.to_ascii_uppercase()), 1.0, "case for {a:?}");
        assert_eq!(edit_distance(&a, &a.to_ascii_lowercase()), 0);
    }
}
