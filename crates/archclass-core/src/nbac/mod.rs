//! Naive Bayes Archetype Classifier: counts and presence multinomial models
//! over a shared archetype order, with background smoothing, temperature,
//! and explainability.

pub mod model;
pub mod scorer;
pub mod trainer;

pub use model::{ModelKind, NbacCardEntry, NbacMeta, NbacModel, NbacModelParams};
pub use scorer::{explain_deck, is_ambiguous, score_deck, top_k, ExplainMethod, Posteriors};
pub use trainer::{train_nbac, TrainedArtifacts};
