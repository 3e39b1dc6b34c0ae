use std::collections::HashMap;
use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};

use archclass_core::asi::{bigram_key, find_nearest_archetypes, BigramTable};
use archclass_core::nbac::model::{ModelKind, NbacCardEntry, NbacMeta, NbacModel, NbacModelParams};
use archclass_core::nbac::scorer::score_deck;

fn setup_bigram_table(num_cards: usize, num_archetypes: usize) -> (BigramTable, Vec<String>) {
    let cards: Vec<String> = (0..num_cards).map(|i| format!("card-{i}")).collect();
    let archetypes: Vec<String> = (0..num_archetypes).map(|i| format!("Archetype-{i}")).collect();

    let mut table = BigramTable::new();
    for i in 0..num_cards {
        for j in (i + 1)..num_cards {
            let key = bigram_key(&cards[i], &cards[j]);
            let weights: Vec<(String, f64)> = archetypes
                .iter()
                .enumerate()
                .map(|(k, a)| (a.clone(), 1.0 / (1.0 + k as f64)))
                .collect();
            table.insert(key, weights);
        }
    }
    (table, cards)
}

fn setup_nbac(num_cards: usize, num_archetypes: usize) -> (NbacMeta, HashMap<String, NbacCardEntry>) {
    let archetypes: Vec<String> = (0..num_archetypes).map(|i| format!("Archetype-{i}")).collect();
    let model = |kind| NbacModel {
        kind,
        params: NbacModelParams {
            alpha: 1.0,
            background_lambda: 0.15,
            temperature: 1.0,
        },
        log_prior: vec![-1.0; num_archetypes],
        log_unseen: vec![-4.0; num_archetypes],
    };
    let meta = NbacMeta {
        version: 1,
        build_unix: 0,
        archetypes,
        counts: model(ModelKind::Counts),
        presence: model(ModelKind::Presence),
    };

    let mut cards = HashMap::new();
    for i in 0..num_cards {
        cards.insert(
            format!("card-{i}"),
            NbacCardEntry {
                log_theta_counts: vec![-1.5; num_archetypes],
                log_theta_presence: vec![-1.5; num_archetypes],
                log_q_counts: Some(-2.0),
                log_q_presence: Some(-2.0),
            },
        );
    }
    (meta, cards)
}

fn criterion_benchmark(c: &mut Criterion) {
    let (table, cards) = setup_bigram_table(60, 25);
    let decklist: Vec<String> = cards.into_iter().take(40).collect();

    c.bench_function("asi_find_nearest_archetypes (60 cards, 25 archetypes)", |b| {
        b.iter(|| find_nearest_archetypes(black_box(&table), black_box(&decklist)))
    });

    let (meta, card_entries) = setup_nbac(300, 25);
    let mut deck_counts = HashMap::new();
    for i in 0..40 {
        deck_counts.insert(format!("card-{i}"), 4);
    }

    c.bench_function("nbac_score_deck (300-card vocab, 25 archetypes)", |b| {
        b.iter(|| {
            score_deck(
                black_box(&meta),
                black_box(ModelKind::Counts),
                black_box(&deck_counts),
                black_box(&card_entries),
            )
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
