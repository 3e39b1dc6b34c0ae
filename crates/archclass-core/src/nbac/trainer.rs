//! Trains the counts and presence Naive Bayes models together, with
//! optional one-pass self-filtering.

use std::collections::{HashMap, HashSet};

use crate::config::NbacParams;
use crate::corpus::DeckEntry;
use crate::error::{ArchClassError, ArchResult};
use crate::nbac::model::{ModelKind, NbacCardEntry, NbacMeta, NbacModel, NbacModelParams};
use crate::normalize::{build_allowed_labels, normalize_label};

/// Trained artifacts ready for encoding: the shared meta plus one dense
/// card entry per vocabulary card.
pub struct TrainedArtifacts {
    pub meta: NbacMeta,
    pub cards: HashMap<String, NbacCardEntry>,
}

struct Pass {
    meta: NbacMeta,
    cards: HashMap<String, NbacCardEntry>,
    /// Per-archetype log_theta_counts by card, kept around only so the
    /// self-filtering scorer doesn't have to decode its own cards back out.
    log_theta_counts_by_card: HashMap<String, Vec<f64>>,
}

fn unseen_prime(alpha: f64, denom_a: f64, denom_bg: f64, background_lambda: f64) -> f64 {
    let unseen = alpha / denom_a;
    let bg_unseen = alpha / denom_bg;
    (1.0 - background_lambda) * unseen + background_lambda * bg_unseen
}

fn train_once(entries: &[&DeckEntry], params: &NbacParams, build_unix: u64) -> ArchResult<Pass> {
    let analyzed = build_allowed_labels(entries.iter().copied());
    let allowed: HashSet<String> = analyzed.into_iter().map(|(k, _)| k).collect();

    let mut archetypes: Vec<String> = allowed.iter().cloned().collect();
    archetypes.sort();
    let a_index: HashMap<&str, usize> = archetypes
        .iter()
        .enumerate()
        .map(|(i, a)| (a.as_str(), i))
        .collect();
    let k_archetypes = archetypes.len();

    let mut counts_counts: Vec<HashMap<String, u32>> = vec![HashMap::new(); k_archetypes];
    let mut counts_presence: Vec<HashMap<String, u32>> = vec![HashMap::new(); k_archetypes];
    let mut decks_per_arch: Vec<u64> = vec![0; k_archetypes];
    let mut vocab: HashSet<String> = HashSet::new();

    for entry in entries {
        let entry: &DeckEntry = entry;
        let Some(label) = normalize_label(entry, &allowed) else {
            continue;
        };
        let idx = a_index[label.as_str()];
        decks_per_arch[idx] += 1;

        let mut seen: HashSet<&str> = HashSet::new();
        for line in &entry.mainboard {
            if line.quantity == 0 {
                continue;
            }
            vocab.insert(line.name.clone());

            let qty_c = line.quantity.min(params.clip_qty);
            *counts_counts[idx].entry(line.name.clone()).or_insert(0) += qty_c;

            if seen.insert(line.name.as_str()) {
                *counts_presence[idx].entry(line.name.clone()).or_insert(0) += 1;
            }
        }
    }

    let total_decks: u64 = decks_per_arch.iter().sum();
    if total_decks == 0 {
        return Err(ArchClassError::CorpusEmpty);
    }

    let mut cards: Vec<String> = vocab.into_iter().collect();
    cards.sort();

    let mut bg_counts_counts: HashMap<&str, u64> = HashMap::new();
    let mut bg_counts_presence: HashMap<&str, u64> = HashMap::new();
    let mut mass_counts: Vec<u64> = vec![0; k_archetypes];
    let mut mass_presence: Vec<u64> = vec![0; k_archetypes];

    for i in 0..k_archetypes {
        for (card, n) in &counts_counts[i] {
            *bg_counts_counts.entry(card.as_str()).or_insert(0) += *n as u64;
            mass_counts[i] += *n as u64;
        }
        for (card, n) in &counts_presence[i] {
            *bg_counts_presence.entry(card.as_str()).or_insert(0) += *n as u64;
            mass_presence[i] += *n as u64;
        }
    }

    let v_size = cards.len() as f64;
    let alpha = params.alpha;
    let lambda = params.background_lambda;

    let bg_mass_counts: u64 = bg_counts_counts.values().sum();
    let bg_mass_presence: u64 = bg_counts_presence.values().sum();

    let denom_counts: Vec<f64> = mass_counts.iter().map(|m| *m as f64 + alpha * v_size).collect();
    let denom_presence: Vec<f64> = mass_presence
        .iter()
        .map(|m| *m as f64 + alpha * v_size)
        .collect();
    let denom_bg_counts = bg_mass_counts as f64 + alpha * v_size;
    let denom_bg_presence = bg_mass_presence as f64 + alpha * v_size;

    let log_unseen_counts: Vec<f64> = (0..k_archetypes)
        .map(|i| unseen_prime(alpha, denom_counts[i], denom_bg_counts, lambda).ln())
        .collect();
    let log_unseen_presence: Vec<f64> = (0..k_archetypes)
        .map(|i| unseen_prime(alpha, denom_presence[i], denom_bg_presence, lambda).ln())
        .collect();

    let log_prior: Vec<f64> = (0..k_archetypes)
        .map(|i| (decks_per_arch[i] as f64 / total_decks as f64).ln())
        .collect();

    let meta = NbacMeta {
        version: 1,
        build_unix,
        archetypes: archetypes.clone(),
        counts: NbacModel {
            kind: ModelKind::Counts,
            params: NbacModelParams {
                alpha,
                background_lambda: lambda,
                temperature: params.temperature_counts,
            },
            log_prior: log_prior.clone(),
            log_unseen: log_unseen_counts,
        },
        presence: NbacModel {
            kind: ModelKind::Presence,
            params: NbacModelParams {
                alpha,
                background_lambda: lambda,
                temperature: params.temperature_presence,
            },
            log_prior,
            log_unseen: log_unseen_presence,
        },
    };

    let mut card_entries: HashMap<String, NbacCardEntry> = HashMap::new();
    let mut log_theta_counts_by_card: HashMap<String, Vec<f64>> = HashMap::new();

    for card in &cards {
        let q_counts = (*bg_counts_counts.get(card.as_str()).unwrap_or(&0) as f64 + alpha) / denom_bg_counts;
        let q_presence =
            (*bg_counts_presence.get(card.as_str()).unwrap_or(&0) as f64 + alpha) / denom_bg_presence;
        let log_q_counts = q_counts.ln();
        let log_q_presence = q_presence.ln();

        let mut log_theta_counts = Vec::with_capacity(k_archetypes);
        let mut log_theta_presence = Vec::with_capacity(k_archetypes);

        for i in 0..k_archetypes {
            let theta = (*counts_counts[i].get(card).unwrap_or(&0) as f64 + alpha) / denom_counts[i];
            let theta_p = (1.0 - lambda) * theta + lambda * q_counts;
            log_theta_counts.push(theta_p.ln());

            let theta2 = (*counts_presence[i].get(card).unwrap_or(&0) as f64 + alpha) / denom_presence[i];
            let theta2_p = (1.0 - lambda) * theta2 + lambda * q_presence;
            log_theta_presence.push(theta2_p.ln());
        }

        log_theta_counts_by_card.insert(card.clone(), log_theta_counts.clone());
        card_entries.insert(
            card.clone(),
            NbacCardEntry {
                log_theta_counts,
                log_theta_presence,
                log_q_counts: Some(log_q_counts),
                log_q_presence: Some(log_q_presence),
            },
        );
    }

    Ok(Pass {
        meta,
        cards: card_entries,
        log_theta_counts_by_card,
    })
}

/// Trains both NBAC models, applying one-pass self-filtering first if
/// `params.self_filter_rho > 0`.
pub fn train_nbac(
    corpus: &[DeckEntry],
    params: &NbacParams,
    build_unix: u64,
) -> ArchResult<TrainedArtifacts> {
    let all_refs: Vec<&DeckEntry> = corpus.iter().collect();
    let pass = train_once(&all_refs, params, build_unix)?;

    let rho = params.self_filter_rho.clamp(0.0, 1.0);
    if rho <= 0.0 {
        return Ok(TrainedArtifacts {
            meta: pass.meta,
            cards: pass.cards,
        });
    }

    let archetypes = &pass.meta.archetypes;
    let a_index: HashMap<&str, usize> = archetypes
        .iter()
        .enumerate()
        .map(|(i, a)| (a.as_str(), i))
        .collect();
    let allowed: HashSet<String> = archetypes.iter().cloned().collect();
    let model = &pass.meta.counts;

    let mut scored_by_label: HashMap<String, Vec<(f64, &DeckEntry)>> = HashMap::new();
    for entry in corpus {
        let Some(label) = normalize_label(entry, &allowed) else {
            continue;
        };
        let label_idx = a_index[label.as_str()];

        let mut deck_counts: HashMap<&str, u32> = HashMap::new();
        for line in &entry.mainboard {
            if line.quantity == 0 {
                continue;
            }
            *deck_counts.entry(line.name.as_str()).or_insert(0) += line.quantity.min(params.clip_qty);
        }

        let total_mass: f64 = deck_counts.values().map(|q| *q as f64).sum();
        let mut log_scores: Vec<f64> = (0..archetypes.len())
            .map(|i| model.log_prior[i] + total_mass * model.log_unseen[i])
            .collect();

        for (card, qty) in &deck_counts {
            let Some(log_theta) = pass.log_theta_counts_by_card.get(*card) else {
                continue;
            };
            let k = *qty as f64;
            for i in 0..archetypes.len() {
                log_scores[i] += k * (log_theta[i] - model.log_unseen[i]);
            }
        }

        let max_s = log_scores.iter().cloned().fold(f64::MIN, f64::max);
        let exps: Vec<f64> = log_scores.iter().map(|s| (s - max_s).exp()).collect();
        let z: f64 = exps.iter().sum();
        if z <= 0.0 {
            continue;
        }
        let p_label = exps[label_idx] / z;
        scored_by_label.entry(label).or_default().push((p_label, entry));
    }

    let mut filtered: Vec<&DeckEntry> = Vec::new();
    for (_, mut items) in scored_by_label {
        if items.is_empty() {
            continue;
        }
        items.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        let keep_n = (((1.0 - rho) * items.len() as f64) as usize).max(1);
        filtered.extend(items.into_iter().take(keep_n).map(|(_, e)| e));
    }

    let retrained = train_once(&filtered, params, build_unix)?;
    Ok(TrainedArtifacts {
        meta: retrained.meta,
        cards: retrained.cards,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::CardLine;

    fn deck(archetype: &str, cards: &[(&str, u32)]) -> DeckEntry {
        DeckEntry {
            id: format!("{archetype}-{}", cards.len()),
            display_name: archetype.to_string(),
            archetype_raw: Some(archetype.to_string()),
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
    fn trains_with_two_archetypes() {
        let corpus = vec![
            deck("Burn", &[("Lightning Bolt", 4), ("Mountain", 20)]),
            deck("Burn", &[("Lightning Bolt", 4), ("Mountain", 18)]),
            deck("Tron", &[("Karn Liberated", 4), ("Urza's Tower", 4)]),
        ];
        let params = NbacParams::default();
        let artifacts = train_nbac(&corpus, &params, 0).unwrap();
        assert_eq!(artifacts.meta.archetypes.len(), 2);
        assert!(artifacts.cards.contains_key("Lightning Bolt"));
        for entry in artifacts.cards.values() {
            assert_eq!(entry.log_theta_counts.len(), 2);
            for v in &entry.log_theta_counts {
                assert!(v.is_finite());
            }
        }
    }

    #[test]
    fn self_filter_rho_zero_matches_unfiltered() {
        let corpus = vec![
            deck("Burn", &[("Lightning Bolt", 4), ("Mountain", 20)]),
            deck("Tron", &[("Karn Liberated", 4), ("Urza's Tower", 4)]),
        ];
        let mut params = NbacParams::default();
        params.self_filter_rho = 0.0;
        let a = train_nbac(&corpus, &params, 0).unwrap();
        let b = train_nbac(&corpus, &params, 0).unwrap();
        assert_eq!(a.meta.archetypes, b.meta.archetypes);
        assert_eq!(a.cards.len(), b.cards.len());
    }

    #[test]
    fn empty_corpus_is_an_error() {
        let params = NbacParams::default();
        let result = train_nbac(&[], &params, 0);
        assert!(matches!(result, Err(ArchClassError::CorpusEmpty)));
    }
}
