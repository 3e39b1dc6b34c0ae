use std::collections::BTreeMap;
use std::io::Write;

use archclass_core::codec::blob_to_text;
use archclass_core::nbac::{ModelKind, NbacCardEntry, NbacMeta, NbacModel, NbacModelParams};
use assert_cmd::Command;
use serde_json::json;
use tempfile::NamedTempFile;

fn write_bundle(contents: &serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_vec(contents).unwrap().as_slice())
        .unwrap();
    file
}

#[test]
fn asi_scores_a_unique_bigram() {
    let bigrams = json!([
        { "a": "lightning bolt", "b": "mountain", "weights": [["Burn", 0.9]] }
    ]);
    let bundle = write_bundle(&json!({ "asi_bigrams": bigrams }));

    let mut cmd = Command::cargo_bin("archclass").unwrap();
    cmd.arg("score")
        .arg("--artifact")
        .arg(bundle.path())
        .arg("asi")
        .arg("Lightning Bolt")
        .arg("Mountain");

    cmd.assert().success().stdout(predicates::str::contains("Burn"));
}

#[test]
fn nbac_presence_scores_the_seeded_archetype() {
    let meta = NbacMeta {
        version: 1,
        build_unix: 0,
        archetypes: vec!["Burn".to_string(), "Tron".to_string()],
        counts: NbacModel {
            kind: ModelKind::Counts,
            params: NbacModelParams { alpha: 1.0, background_lambda: 0.15, temperature: 1.0 },
            log_prior: vec![(0.5_f64).ln(), (0.5_f64).ln()],
            log_unseen: vec![-3.0, -3.0],
        },
        presence: NbacModel {
            kind: ModelKind::Presence,
            params: NbacModelParams { alpha: 1.0, background_lambda: 0.15, temperature: 1.0 },
            log_prior: vec![(0.5_f64).ln(), (0.5_f64).ln()],
            log_unseen: vec![-3.0, -3.0],
        },
    };
    let bolt_entry = NbacCardEntry {
        log_theta_counts: vec![-0.3, -5.0],
        log_theta_presence: vec![-0.3, -5.0],
        log_q_counts: Some(-2.0),
        log_q_presence: Some(-2.0),
    };

    let meta_blob = archclass_core::codec::encode_meta(&meta).unwrap();
    let card_blob = archclass_core::codec::encode_card_entry(&bolt_entry).unwrap();

    let mut cards = BTreeMap::new();
    cards.insert("Lightning Bolt".to_string(), blob_to_text(&card_blob));

    let bundle = write_bundle(&json!({
        "nbac_meta": blob_to_text(&meta_blob),
        "nbac_cards": cards,
    }));

    let mut cmd = Command::cargo_bin("archclass").unwrap();
    cmd.arg("score")
        .arg("--artifact")
        .arg(bundle.path())
        .arg("nbac")
        .arg("Lightning Bolt");

    cmd.assert().success().stdout(predicates::str::contains("Burn"));
}
