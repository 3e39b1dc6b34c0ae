use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use archclass_core::asi::compute_archetype_bigrams;
use archclass_core::codec::{encode_bigram_table, encode_card_entry, encode_meta};
use archclass_core::config::TrainingConfig;
use archclass_core::nbac::train_nbac;
use archclass_core::normalize::normalize_corpus;
use archclass_hive::store::{ArtifactStore, DEFAULT_BATCH_SIZE};
use archclass_protocol::format::Format;
use clap::Args;
use tracing::{info, warn};

use crate::content_hash::hash_bytes;
use crate::corpus::PostgresCorpusSource;

#[derive(Args, Debug, Clone)]
pub struct BuildArgs {
    /// Corpus database connection string. Defaults to `DATABASE_URL`.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Formats to (re)train. Defaults to all six supported formats.
    #[arg(long, value_delimiter = ',')]
    pub formats: Vec<String>,

    /// Recency window, in days, for the corpus fetch.
    #[arg(long, default_value_t = 90)]
    pub window_days: i64,

    /// Card-entry upsert batch size (25-50 is the usual range).
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: usize,

    #[command(flatten)]
    pub training: TrainingConfig,

    /// Skip the 30-day retention sweep after upserting.
    #[arg(long, default_value_t = false)]
    pub skip_retention: bool,
}

pub async fn run(args: BuildArgs) -> anyhow::Result<()> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(10)
        .connect(&args.database_url)
        .await?;

    let store = ArtifactStore::new(pool.clone());
    store.init_schema().await?;

    let source = PostgresCorpusSource::new(pool);

    let formats: Vec<Format> = if args.formats.is_empty() {
        Format::ALL.to_vec()
    } else {
        args.formats
            .iter()
            .map(|f| {
                Format::from_str(f).map_err(|_| anyhow::anyhow!("unknown format: {f}"))
            })
            .collect::<Result<_, _>>()?
    };

    let min_date = min_date_str(args.window_days);
    let build_unix = unix_now();

    for format in formats {
        info!(format = format.as_str(), "fetching corpus");
        let corpus = source.fetch(format.as_str(), &min_date).await?;
        if corpus.is_empty() {
            warn!(format = format.as_str(), "no decks returned, skipping");
            continue;
        }
        info!(format = format.as_str(), decks = corpus.len(), "normalizing");
        let normalized = normalize_corpus(&corpus);
        if normalized.is_empty() {
            warn!(format = format.as_str(), "no labelled decks survived normalization, skipping");
            continue;
        }

        info!(format = format.as_str(), "training ASI bigram table");
        let bigram_table = compute_archetype_bigrams(&normalized, &args.training.asi);
        let bigram_blob = encode_bigram_table(&bigram_table)?;
        let bigram_hash = hash_bytes(&bigram_blob);
        let bigram_changed = store
            .upsert_meta_row(format, "asi", &bigram_blob, &bigram_hash)
            .await?;
        info!(format = format.as_str(), changed = bigram_changed, "asi artifact upserted");

        info!(format = format.as_str(), "training NBAC models");
        let artifacts = train_nbac(&corpus, &args.training.nbac, build_unix)?;

        let meta_blob = encode_meta(&artifacts.meta)?;
        let meta_hash = hash_bytes(&meta_blob);
        let meta_changed = store.upsert_meta(format, &meta_blob, &meta_hash).await?;
        info!(format = format.as_str(), changed = meta_changed, "nbac meta upserted");

        let mut card_rows: Vec<(String, Vec<u8>, String)> = Vec::with_capacity(artifacts.cards.len());
        for (card, entry) in &artifacts.cards {
            let blob = encode_card_entry(entry)?;
            let hash = hash_bytes(&blob);
            card_rows.push((card.clone(), blob, hash));
        }
        store.upsert_cards(format, &card_rows, args.batch_size).await?;
        info!(format = format.as_str(), cards = card_rows.len(), "nbac card entries upserted");

        if !args.skip_retention {
            let removed = store.retain(format).await?;
            info!(format = format.as_str(), removed, "retention sweep complete");
        }
    }

    Ok(())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn min_date_str(window_days: i64) -> String {
    let today = chrono::Utc::now().date_naive();
    let min_date = today - chrono::Duration::days(window_days.max(0));
    min_date.format("%Y-%m-%d").to_string()
}
