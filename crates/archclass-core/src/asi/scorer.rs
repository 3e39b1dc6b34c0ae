//! Ranks archetypes against a candidate card multiset using the trained
//! bigram table.

use std::collections::{HashMap, HashSet};

use crate::asi::BigramTable;

/// Ranked archetype scores, descending.
pub type NearestArchetypes = Vec<(String, f64)>;

/// Two-pass nearest-archetype scoring.
///
/// `bigrams` only needs to contain the rows relevant to `decklist` (callers
/// fetching from a store should request exactly those); rows for pairs not
/// fully present in `decklist` are ignored if present anyway.
///
/// Card names in `decklist` must already be lowercased, matching the bigram
/// table's key convention; quantities are irrelevant and not accepted here.
pub fn find_nearest_archetypes(bigrams: &BigramTable, decklist: &[String]) -> NearestArchetypes {
    let present: HashSet<&str> = decklist.iter().map(|s| s.as_str()).collect();
    let relevant: Vec<(&(String, String), &Vec<(String, f64)>)> = bigrams
        .iter()
        .filter(|((a, b), _)| present.contains(a.as_str()) && present.contains(b.as_str()))
        .collect();

    if relevant.is_empty() {
        return Vec::new();
    }

    // Pass 1: sum joint probabilities, doubling uniquely-attributed bigrams.
    let mut nearest: HashMap<String, f64> = HashMap::new();
    for (_, joint_probs) in &relevant {
        let weight = if joint_probs.len() == 1 { 2.0 } else { 1.0 };
        for (archetype, joint_prob) in joint_probs.iter() {
            *nearest.entry(archetype.clone()).or_insert(0.0) += weight * joint_prob;
        }
    }

    let max_score = nearest.values().cloned().fold(f64::MIN, f64::max);
    let candidates: HashSet<String> = nearest
        .iter()
        .filter(|(_, w)| **w >= max_score - 2.0)
        .map(|(a, _)| a.clone())
        .collect();

    // Pass 2: candidate separation boost / non-candidate penalty.
    for (_, joint_probs) in &relevant {
        let filtered: Vec<&(String, f64)> = joint_probs
            .iter()
            .filter(|(a, _)| candidates.contains(a))
            .collect();
        let weight = if filtered.len() == 1 { 2.0 } else { 1.0 };
        for (archetype, joint_prob) in joint_probs.iter() {
            if !candidates.contains(archetype) {
                *nearest.entry(archetype.clone()).or_insert(0.0) -= joint_prob;
            } else if filtered.len() < candidates.len() / 3 {
                *nearest.entry(archetype.clone()).or_insert(0.0) += weight * joint_prob;
            }
        }
    }

    // Normalize by the sum, across present bigrams, of each bigram's max weight.
    let normalizer: f64 = relevant
        .iter()
        .map(|(_, joint_probs)| {
            joint_probs
                .iter()
                .map(|(_, w)| *w)
                .fold(f64::MIN, f64::max)
        })
        .sum();

    let mut scored: NearestArchetypes = if normalizer > 0.0 {
        nearest
            .into_iter()
            .map(|(a, w)| (a, (w / normalizer).min(1.0)))
            .collect()
    } else {
        nearest.into_iter().collect()
    };

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asi::BigramTable;

    #[test]
    fn single_unique_bigram_scores_one() {
        let mut bigrams = BigramTable::new();
        bigrams.insert(
            ("a".to_string(), "b".to_string()),
            vec![("X".to_string(), 1.0)],
        );
        let result = find_nearest_archetypes(&bigrams, &["a".to_string(), "b".to_string()]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].0, "X");
        assert!((result[0].1 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn empty_overlap_yields_no_candidates() {
        let mut bigrams = BigramTable::new();
        bigrams.insert(
            ("a".to_string(), "b".to_string()),
            vec![("X".to_string(), 1.0)],
        );
        let result = find_nearest_archetypes(&bigrams, &["c".to_string(), "d".to_string()]);
        assert!(result.is_empty());
    }
}
