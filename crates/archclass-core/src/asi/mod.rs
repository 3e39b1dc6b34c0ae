//! Archetype Similarity Index: weighted hypergeometric bigram scoring.

pub mod scorer;
pub mod trainer;

pub use scorer::find_nearest_archetypes;
pub use trainer::compute_archetype_bigrams;

use std::collections::BTreeMap;

/// Unordered pair of (lowercased) card names, stored with the
/// lexicographically smaller name first.
pub type BigramKey = (String, String);

/// Per-archetype joint-probability weight for one bigram, kept sorted by
/// weight descending for deterministic storage and iteration.
pub type ArchetypeWeights = Vec<(String, f64)>;

/// The full trained bigram table: every bigram observed in the corpus,
/// mapped to its per-archetype weights.
pub type BigramTable = BTreeMap<BigramKey, ArchetypeWeights>;

pub fn bigram_key(a: &str, b: &str) -> BigramKey {
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
