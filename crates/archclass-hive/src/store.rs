use std::collections::HashMap;

use archclass_core::consts::RETENTION_DAYS;
use archclass_protocol::format::Format;
use sqlx::{Pool, Postgres, Row};

/// One `{fmt}_meta` / `{fmt}_cards` pair of tables per format, hash-guarded
/// upserts so unchanged artifacts never bump `updated_at`, batched card
/// writes, and a 30-day retention sweep.
#[derive(Clone)]
pub struct ArtifactStore {
    db: Pool<Postgres>,
}

/// Card upsert batches land between 25 and 50 rows; callers that don't care
/// get this default.
pub const DEFAULT_BATCH_SIZE: usize = 50;

impl ArtifactStore {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.db
    }

    /// Creates both tables for every supported format, if they don't
    /// already exist. Idempotent, safe to call on every boot.
    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        for fmt in Format::ALL {
            let meta_table = format!("{}_meta", fmt.as_str());
            let cards_table = format!("{}_cards", fmt.as_str());

            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {meta_table} (
                    key        TEXT PRIMARY KEY,
                    entry      BYTEA NOT NULL,
                    hash       TEXT NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )
                "#
            ))
            .execute(&self.db)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {meta_table}_hash_idx ON {meta_table} (hash)"
            ))
            .execute(&self.db)
            .await?;
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {meta_table}_updated_idx ON {meta_table} (updated_at)"
            ))
            .execute(&self.db)
            .await?;

            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {cards_table} (
                    card       TEXT PRIMARY KEY,
                    entry      BYTEA NOT NULL,
                    hash       TEXT NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )
                "#
            ))
            .execute(&self.db)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {cards_table}_hash_idx ON {cards_table} (hash)"
            ))
            .execute(&self.db)
            .await?;
            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {cards_table}_updated_idx ON {cards_table} (updated_at)"
            ))
            .execute(&self.db)
            .await?;
        }

        Ok(())
    }

    /// Upserts a single row of the `{fmt}_meta` table under `key`. NBAC uses
    /// the literal key `"meta"`; the ASI bigram table (which has no natural
    /// per-card shape) rides the same table under key `"asi"` rather than
    /// inventing a third table family. Returns whether the row actually
    /// changed (hash differed), so callers can skip bumping `updated_at`
    /// when the re-encoded artifact is byte-identical to what's stored.
    pub async fn upsert_meta_row(
        &self,
        format: Format,
        key: &str,
        entry: &[u8],
        hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let table = format!("{}_meta", format.as_str());
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO {table} (key, entry, hash, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (key) DO UPDATE
                SET entry = excluded.entry,
                    hash = excluded.hash,
                    updated_at = now()
                WHERE excluded.hash != {table}.hash
            RETURNING key
            "#
        ))
        .bind(key)
        .bind(entry)
        .bind(hash)
        .fetch_optional(&self.db)
        .await?;

        Ok(row.is_some())
    }

    pub async fn get_meta_row(
        &self,
        format: Format,
        key: &str,
    ) -> Result<Option<Vec<u8>>, sqlx::Error> {
        let table = format!("{}_meta", format.as_str());
        let row = sqlx::query(&format!("SELECT entry FROM {table} WHERE key = $1"))
            .bind(key)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(|r| r.get::<Vec<u8>, _>("entry")))
    }

    pub async fn upsert_meta(
        &self,
        format: Format,
        entry: &[u8],
        hash: &str,
    ) -> Result<bool, sqlx::Error> {
        self.upsert_meta_row(format, "meta", entry, hash).await
    }

    pub async fn get_meta(&self, format: Format) -> Result<Option<Vec<u8>>, sqlx::Error> {
        self.get_meta_row(format, "meta").await
    }

    /// Upserts card entries in batches of `batch_size` (25-50 rows is the
    /// usual range), each batch guarded by the same `hash != table.hash`
    /// condition.
    pub async fn upsert_cards(
        &self,
        format: Format,
        entries: &[(String, Vec<u8>, String)],
        batch_size: usize,
    ) -> Result<(), sqlx::Error> {
        let table = format!("{}_cards", format.as_str());
        for batch in entries.chunks(batch_size.max(1)) {
            let mut tx = self.db.begin().await?;
            for (card, entry, hash) in batch {
                sqlx::query(&format!(
                    r#"
                    INSERT INTO {table} (card, entry, hash, updated_at)
                    VALUES ($1, $2, $3, now())
                    ON CONFLICT (card) DO UPDATE
                        SET entry = excluded.entry,
                            hash = excluded.hash,
                            updated_at = now()
                        WHERE excluded.hash != {table}.hash
                    "#
                ))
                .bind(card)
                .bind(entry)
                .bind(hash)
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await?;
        }
        Ok(())
    }

    /// Fetches exactly the cards present in `cards`, keyed by card name.
    /// Cards absent from the store are simply absent from the map; the
    /// caller treats them as unseen-by-the-model, not an error.
    pub async fn get_cards(
        &self,
        format: Format,
        cards: &[String],
    ) -> Result<HashMap<String, Vec<u8>>, sqlx::Error> {
        if cards.is_empty() {
            return Ok(HashMap::new());
        }

        let table = format!("{}_cards", format.as_str());
        let rows = sqlx::query(&format!(
            "SELECT card, entry FROM {table} WHERE card = ANY($1)"
        ))
        .bind(cards)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.get::<String, _>("card"), r.get::<Vec<u8>, _>("entry")))
            .collect())
    }

    /// Deletes rows older than [`RETENTION_DAYS`] for both tables of a
    /// format. Returns the total number of rows removed.
    pub async fn retain(&self, format: Format) -> Result<u64, sqlx::Error> {
        let meta_table = format!("{}_meta", format.as_str());
        let cards_table = format!("{}_cards", format.as_str());

        let meta_deleted = sqlx::query(&format!(
            "DELETE FROM {meta_table} WHERE updated_at < now() - ($1 || ' days')::interval"
        ))
        .bind(RETENTION_DAYS.to_string())
        .execute(&self.db)
        .await?
        .rows_affected();

        let cards_deleted = sqlx::query(&format!(
            "DELETE FROM {cards_table} WHERE updated_at < now() - ($1 || ' days')::interval"
        ))
        .bind(RETENTION_DAYS.to_string())
        .execute(&self.db)
        .await?
        .rows_affected();

        Ok(meta_deleted + cards_deleted)
    }
}
