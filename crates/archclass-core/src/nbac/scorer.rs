//! Scores a candidate deck against a trained NBAC model and exposes the
//! ambiguity and explainability helpers the edge service needs.

use std::collections::HashMap;

use crate::nbac::model::{ModelKind, NbacCardEntry, NbacMeta};

/// Posterior probability per archetype label.
pub type Posteriors = HashMap<String, f64>;

/// Scores a deck's card quantities against `meta`'s `model_kind` model.
/// Cards absent from `card_entries` are treated as unseen: they contribute
/// nothing beyond the `log_unseen` mass already paid via `total_mass`.
///
/// Returns an empty map if every log-score underflows to a zero softmax
/// denominator (can only happen with degenerate, non-finite inputs).
pub fn score_deck(
    meta: &NbacMeta,
    model_kind: ModelKind,
    deck_counts: &HashMap<String, u32>,
    card_entries: &HashMap<String, NbacCardEntry>,
) -> Posteriors {
    let model = meta.model(model_kind);
    let a_count = meta.archetypes.len();

    let total_mass: f64 = deck_counts.values().filter(|q| **q > 0).map(|q| *q as f64).sum();

    let mut log_scores: Vec<f64> = (0..a_count)
        .map(|i| model.log_prior[i] + total_mass * model.log_unseen[i])
        .collect();

    for (card, qty) in deck_counts {
        if *qty == 0 {
            continue;
        }
        let Some(entry) = card_entries.get(card) else {
            continue;
        };
        let log_theta = match model_kind {
            ModelKind::Counts => &entry.log_theta_counts,
            ModelKind::Presence => &entry.log_theta_presence,
        };
        let k = *qty as f64;
        for i in 0..a_count {
            log_scores[i] += k * (log_theta[i] - model.log_unseen[i]);
        }
    }

    let t = if model.params.temperature > 0.0 {
        model.params.temperature
    } else {
        1.0
    };
    let scaled: Vec<f64> = log_scores.iter().map(|s| s / t).collect();
    let max_s = scaled.iter().cloned().fold(f64::MIN, f64::max);
    let exps: Vec<f64> = scaled.iter().map(|s| (s - max_s).exp()).collect();
    let z: f64 = exps.iter().sum();
    if z == 0.0 {
        return Posteriors::new();
    }

    (0..a_count)
        .map(|i| (meta.archetypes[i].clone(), exps[i] / z))
        .collect()
}

/// Top `k` archetypes by posterior, descending.
pub fn top_k(probs: &Posteriors, k: usize) -> Vec<(String, f64)> {
    if k == 0 {
        return Vec::new();
    }
    let mut ranked: Vec<(String, f64)> = probs.iter().map(|(a, p)| (a.clone(), *p)).collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(k);
    ranked
}

/// Ambiguity policy: the top pick is below `p_min`, or too close to the
/// runner-up (within `delta`). An empty posterior is always ambiguous.
pub fn is_ambiguous(probs: &Posteriors, p_min: f64, delta: f64) -> bool {
    if probs.is_empty() {
        return true;
    }
    let ranked = top_k(probs, 2);
    let p1 = ranked[0].1;
    let p2 = ranked.get(1).map(|(_, p)| *p).unwrap_or(0.0);
    p1 < p_min || (p1 - p2) < delta
}

/// Which quantity to report per card in [`explain_deck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExplainMethod {
    /// `k_c * log(theta'[A][c])`.
    Contrib,
    /// `k_c * (log(theta'[A][c]) - log(q[c]))`, falls back to `Contrib` if
    /// `log_q` is unavailable (v1 card entries).
    Lift,
}

/// Per-card evidence for why `archetype` scored the way it did, sorted
/// descending and truncated to `top_n`.
pub fn explain_deck(
    meta: &NbacMeta,
    model_kind: ModelKind,
    deck_counts: &HashMap<String, u32>,
    card_entries: &HashMap<String, NbacCardEntry>,
    archetype: &str,
    top_n: usize,
    method: ExplainMethod,
) -> Vec<(String, f64)> {
    if top_n == 0 {
        return Vec::new();
    }
    let Some(a_idx) = meta.archetypes.iter().position(|a| a == archetype) else {
        return Vec::new();
    };

    let mut out: Vec<(String, f64)> = Vec::new();
    for (card, qty) in deck_counts {
        if *qty == 0 {
            continue;
        }
        let Some(entry) = card_entries.get(card) else {
            continue;
        };
        let (log_theta, log_q) = match model_kind {
            ModelKind::Counts => (&entry.log_theta_counts, entry.log_q_counts),
            ModelKind::Presence => (&entry.log_theta_presence, entry.log_q_presence),
        };
        let k = *qty as f64;
        let score = match (method, log_q) {
            (ExplainMethod::Lift, Some(log_q)) => k * (log_theta[a_idx] - log_q),
            _ => k * log_theta[a_idx],
        };
        out.push((card.clone(), score));
    }

    out.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    out.truncate(top_n);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nbac::model::{NbacModel, NbacModelParams};

    fn toy_meta() -> NbacMeta {
        let model_for = |log_unseen: Vec<f64>, kind| NbacModel {
            kind,
            params: NbacModelParams {
                alpha: 1.0,
                background_lambda: 0.15,
                temperature: 1.0,
            },
            log_prior: vec![(0.5_f64).ln(), (0.5_f64).ln()],
            log_unseen,
        };
        NbacMeta {
            version: 1,
            build_unix: 0,
            archetypes: vec!["Burn".to_string(), "Tron".to_string()],
            counts: model_for(vec![-3.0, -3.0], ModelKind::Counts),
            presence: model_for(vec![-3.0, -3.0], ModelKind::Presence),
        }
    }

    #[test]
    fn softmax_sums_to_one() {
        let meta = toy_meta();
        let mut cards = HashMap::new();
        cards.insert(
            "Lightning Bolt".to_string(),
            NbacCardEntry {
                log_theta_counts: vec![-0.5, -4.0],
                log_theta_presence: vec![-0.5, -4.0],
                log_q_counts: Some(-2.0),
                log_q_presence: Some(-2.0),
            },
        );
        let mut deck = HashMap::new();
        deck.insert("Lightning Bolt".to_string(), 4);

        let probs = score_deck(&meta, ModelKind::Counts, &deck, &cards);
        let sum: f64 = probs.values().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        let (top, _) = top_k(&probs, 1)[0].clone();
        assert_eq!(top, "Burn");
    }

    #[test]
    fn ambiguous_when_scores_are_close() {
        let mut probs = Posteriors::new();
        probs.insert("A".to_string(), 0.51);
        probs.insert("B".to_string(), 0.49);
        assert!(is_ambiguous(&probs, 0.0, 0.1));
        assert!(!is_ambiguous(&probs, 0.0, 0.01));
    }

    #[test]
    fn explain_without_log_q_falls_back_to_contrib() {
        let meta = toy_meta();
        let mut cards = HashMap::new();
        cards.insert(
            "Lightning Bolt".to_string(),
            NbacCardEntry {
                log_theta_counts: vec![-0.5, -4.0],
                log_theta_presence: vec![-0.5, -4.0],
                log_q_counts: None,
                log_q_presence: None,
            },
        );
        let mut deck = HashMap::new();
        deck.insert("Lightning Bolt".to_string(), 4);

        let explained = explain_deck(
            &meta,
            ModelKind::Counts,
            &deck,
            &cards,
            "Burn",
            12,
            ExplainMethod::Lift,
        );
        assert_eq!(explained.len(), 1);
        assert!((explained[0].1 - 4.0 * -0.5).abs() < 1e-9);
    }
}
