//! `archclass score` — runs the ASI or NBAC scoring path locally against a
//! JSON artifact bundle, without touching a live store. Useful for CI
//! smoke tests and manual QA of a just-trained artifact before it's
//! upserted.

use std::collections::HashMap;
use std::path::PathBuf;

use archclass_core::asi::find_nearest_archetypes;
use archclass_core::codec::{decode_bigram_table, decode_card_entry, decode_meta};
use archclass_core::error::ArchClassError;
use archclass_core::nbac::{score_deck, top_k, ModelKind};
use clap::{Args, Subcommand};
use serde::Deserialize;

use crate::reports;

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    /// Path to a JSON artifact bundle (see `ArtifactBundle`).
    #[arg(long)]
    pub artifact: PathBuf,

    #[command(subcommand)]
    pub mode: ScoreMode,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ScoreMode {
    /// Score a candidate decklist with the ASI bigram table.
    Asi {
        /// Candidate card names (order doesn't matter, case-insensitive).
        cards: Vec<String>,
    },
    /// Score a candidate decklist with an NBAC model.
    Nbac {
        /// Card names (presence model, one copy each) or `Name:qty` pairs
        /// (counts model).
        cards: Vec<String>,
        #[arg(long, value_enum, default_value = "presence")]
        model: NbacModelArg,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum NbacModelArg {
    Presence,
    Counts,
}

/// On-disk shape for local scoring. `nbac_meta`/`nbac_cards` carry the
/// codec's `"b64:"`-wrapped textual blobs (see
/// `archclass_core::codec::blob_to_text`); `asi_bigrams` is the bigram
/// table's own JSON encoding, embedded as-is.
#[derive(Deserialize)]
struct ArtifactBundle {
    #[serde(default)]
    asi_bigrams: Option<serde_json::Value>,
    #[serde(default)]
    nbac_meta: Option<String>,
    #[serde(default)]
    nbac_cards: Option<HashMap<String, String>>,
}

pub fn run(args: ScoreArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.artifact)?;
    let bundle: ArtifactBundle = serde_json::from_str(&raw)?;

    match args.mode {
        ScoreMode::Asi { cards } => run_asi(&bundle, &cards),
        ScoreMode::Nbac { cards, model } => run_nbac(&bundle, &cards, model),
    }
}

fn run_asi(bundle: &ArtifactBundle, cards: &[String]) -> anyhow::Result<()> {
    let Some(bigrams_json) = &bundle.asi_bigrams else {
        anyhow::bail!("artifact bundle has no asi_bigrams section");
    };
    if cards.len() < 2 {
        anyhow::bail!("ASI scoring needs at least two cards");
    }
    let bytes = serde_json::to_vec(bigrams_json)?;
    let table = decode_bigram_table(&bytes)?;
    let lowercased: Vec<String> = cards.iter().map(|c| c.to_lowercase()).collect();
    let scores = find_nearest_archetypes(&table, &lowercased);
    reports::print_scores("ASI", &scores);
    Ok(())
}

fn run_nbac(bundle: &ArtifactBundle, cards: &[String], model: NbacModelArg) -> anyhow::Result<()> {
    let Some(meta_text) = &bundle.nbac_meta else {
        anyhow::bail!("artifact bundle has no nbac_meta section");
    };
    let Some(card_texts) = &bundle.nbac_cards else {
        anyhow::bail!("artifact bundle has no nbac_cards section");
    };

    let meta = decode_meta(meta_text.as_bytes())?;

    let model_kind = match model {
        NbacModelArg::Presence => ModelKind::Presence,
        NbacModelArg::Counts => ModelKind::Counts,
    };

    let mut deck_counts: HashMap<String, u32> = HashMap::new();
    for spec in cards {
        let (name, qty): (String, u32) = match (model_kind, spec.split_once(':')) {
            (ModelKind::Counts, Some((name, qty))) => {
                (name.to_string(), qty.trim().parse::<u32>().unwrap_or(1))
            }
            (ModelKind::Counts, None) => (spec.clone(), 1),
            (ModelKind::Presence, _) => (spec.split(':').next().unwrap_or(spec).to_string(), 1),
        };
        *deck_counts.entry(name).or_insert(0) += qty.min(4);
    }

    let mut card_entries = HashMap::new();
    for (card, qty) in &deck_counts {
        if *qty == 0 {
            continue;
        }
        let Some(text) = card_texts.get(card) else {
            continue;
        };
        let entry = decode_card_entry(text.as_bytes())?;
        if entry.log_theta_counts.len() != meta.archetypes.len() {
            return Err(ArchClassError::VersionSkew(format!(
                "card '{card}' has mismatched archetype count"
            ))
            .into());
        }
        card_entries.insert(card.clone(), entry);
    }

    let posteriors = score_deck(&meta, model_kind, &deck_counts, &card_entries);
    let ranked = top_k(&posteriors, meta.archetypes.len());
    reports::print_scores("NBAC", &ranked);
    Ok(())
}
