//! Builds the archetype bigram table from a normalized corpus.

use std::collections::HashMap;

use crate::asi::{bigram_key, ArchetypeWeights, BigramKey, BigramTable};
use crate::config::AsiParams;
use crate::corpus::DeckEntry;
use crate::hypergeo::hypergeo;

#[derive(Default, Clone, Copy)]
struct Accumulator {
    q1: f64,
    q2: f64,
    total: f64,
    n: f64,
}

/// Accumulates `(q1, q2, total, n)` per bigram per archetype, then reduces
/// each accumulator to a joint-probability weight in `[0, 1]`.
///
/// `entries` is the already-normalized `(deck, label)` corpus. Card names
/// are lowercased here (ASI is case-insensitive; NBAC is not), matching the
/// bigram key convention.
pub fn compute_archetype_bigrams(
    entries: &[(&DeckEntry, String)],
    params: &AsiParams,
) -> BigramTable {
    let mut acc: HashMap<BigramKey, HashMap<String, Accumulator>> = HashMap::new();

    for (deck, label) in entries {
        let mut lc_counts: HashMap<String, u32> = HashMap::new();
        for line in &deck.mainboard {
            *lc_counts.entry(line.name.to_lowercase()).or_insert(0) += line.quantity;
        }
        let total = deck.mainboard_size() as f64;
        let names: Vec<&String> = lc_counts.keys().collect();

        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                let key = bigram_key(names[i], names[j]);
                let q1 = lc_counts[&key.0] as f64;
                let q2 = lc_counts[&key.1] as f64;
                let slot = acc
                    .entry(key)
                    .or_default()
                    .entry(label.clone())
                    .or_insert_with(Accumulator::default);
                slot.q1 += q1;
                slot.q2 += q2;
                slot.total += total;
                slot.n += 1.0;
            }
        }
    }

    let mut table: BigramTable = BigramTable::new();
    for (bigram, by_archetype) in acc {
        let mut weights: ArchetypeWeights = by_archetype
            .into_iter()
            .map(|(archetype, a)| (archetype, bigram_weight(&a, params)))
            .collect();
        weights.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        table.insert(bigram, weights);
    }
    table
}

fn bigram_weight(a: &Accumulator, params: &AsiParams) -> f64 {
    let n_draws = params.opener_size;
    let nn = a.total / a.n;
    let k1 = a.q1 / a.n;
    let k2 = a.q2 / a.n;

    let p_a = hypergeo(k1, nn, 1.0, n_draws);
    let p_b = hypergeo(k2, nn, 1.0, n_draws);
    let p_ab = 1.0 - ((1.0 - p_a) + (1.0 - p_b) - hypergeo(nn - k1 - k2, nn, 1.0, n_draws));

    let k_max = 4.0_f64.max((k1 + k2) / 2.0);
    let p_max = 1.0 - (1.0 - hypergeo(k_max, nn, 1.0, n_draws)).powi(2);

    if p_max <= 0.0 {
        return 0.0;
    }
    (p_ab / p_max).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CardLine;

    fn deck(id: &str, cards: &[(&str, u32)]) -> DeckEntry {
        DeckEntry {
            id: id.to_string(),
            display_name: id.to_string(),
            archetype_raw: Some("Burn".to_string()),
            format: "modern".to_string(),
            date: "2026-01-01".to_string(),
            mainboard: cards
                .iter()
                .map(|(name, qty)| CardLine {
                    name: name.to_string(),
                    quantity: *qty,
                })
                .collect(),
            sideboard: vec![],
        }
    }

    #[test]
    fn weights_land_in_unit_interval() {
        let params = AsiParams::default();
        let decks = vec![
            deck("1", &[("Lightning Bolt", 4), ("Mountain", 20)]),
            deck("2", &[("Lightning Bolt", 4), ("Mountain", 18)]),
        ];
        let entries: Vec<(&DeckEntry, String)> =
            decks.iter().map(|d| (d, "Burn".to_string())).collect();
        let table = compute_archetype_bigrams(&entries, &params);
        for weights in table.values() {
            for (_, w) in weights {
                assert!(*w >= 0.0 && *w <= 1.0);
            }
        }
    }

    #[test]
    fn per_archetype_weights_sorted_descending() {
        let params = AsiParams::default();
        let decks = vec![deck("1", &[("A", 4), ("B", 4), ("C", 1)])];
        let entries: Vec<(&DeckEntry, String)> =
            decks.iter().map(|d| (d, "Burn".to_string())).collect();
        let table = compute_archetype_bigrams(&entries, &params);
        for weights in table.values() {
            let vals: Vec<f64> = weights.iter().map(|(_, w)| *w).collect();
            assert!(vals.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
