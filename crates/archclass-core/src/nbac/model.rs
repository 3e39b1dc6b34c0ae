//! Naive Bayes Archetype Classifier data model: two parallel models (counts,
//! presence) sharing an archetype order and prior.

use serde::{Deserialize, Serialize};

/// Which of the two parallel NBAC models a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Counts,
    Presence,
}

/// Hyperparameters baked into a trained model (kept alongside it so a
/// decoded artifact is self-describing).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NbacModelParams {
    pub alpha: f64,
    pub background_lambda: f64,
    pub temperature: f64,
}

/// One trained model (counts or presence): per-archetype log-prior and the
/// log-probability mass assigned to any card never observed for that
/// archetype, both indexed by the shared archetype order in [`NbacMeta`].
#[derive(Debug, Clone)]
pub struct NbacModel {
    pub kind: ModelKind,
    pub params: NbacModelParams,
    pub log_prior: Vec<f64>,
    pub log_unseen: Vec<f64>,
}

/// The fixed, build-wide metadata shared by every per-card entry: the
/// archetype order (`archetypes[i]` is archetype index `i` everywhere) and
/// both trained models.
#[derive(Debug, Clone)]
pub struct NbacMeta {
    pub version: u8,
    pub build_unix: u64,
    pub archetypes: Vec<String>,
    pub counts: NbacModel,
    pub presence: NbacModel,
}

impl NbacMeta {
    pub fn model(&self, kind: ModelKind) -> &NbacModel {
        match kind {
            ModelKind::Counts => &self.counts,
            ModelKind::Presence => &self.presence,
        }
    }
}

/// Dense per-card weights for both models, plus optional background
/// log-probabilities (present in format v2, absent in v1).
#[derive(Debug, Clone)]
pub struct NbacCardEntry {
    pub log_theta_counts: Vec<f64>,
    pub log_theta_presence: Vec<f64>,
    pub log_q_counts: Option<f64>,
    pub log_q_presence: Option<f64>,
}
