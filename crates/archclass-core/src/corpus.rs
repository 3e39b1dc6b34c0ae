//! Corpus data model and the loader contract.
//!
//! The actual relational fetch (and the gnarly source-DB decklist string
//! encoding) is an external collaborator — this module only fixes the shape
//! callers must produce. `archclass-cli` supplies the concrete
//! Postgres-backed implementation.

use std::collections::HashMap;

/// One card line in a mainboard or sideboard. Multiple rows for the same
/// card name (e.g. under different source card IDs) must be pre-summed by
/// the loader before reaching this type.
#[derive(Debug, Clone, PartialEq)]
pub struct CardLine {
    pub name: String,
    pub quantity: u32,
}

/// A single labelled deck, pre-normalization.
#[derive(Debug, Clone)]
pub struct DeckEntry {
    pub id: String,
    pub display_name: String,
    pub archetype_raw: Option<String>,
    pub format: String,
    pub date: String,
    pub mainboard: Vec<CardLine>,
    pub sideboard: Vec<CardLine>,
}

impl DeckEntry {
    /// Mainboard quantities collapsed to one entry per distinct card name.
    pub fn mainboard_counts(&self) -> HashMap<&str, u32> {
        let mut counts: HashMap<&str, u32> = HashMap::new();
        for line in &self.mainboard {
            *counts.entry(line.name.as_str()).or_insert(0) += line.quantity;
        }
        counts
    }

    /// Total mainboard card count (sum of quantities), used as the
    /// hypergeometric deck size `total` in the ASI trainer.
    pub fn mainboard_size(&self) -> u32 {
        self.mainboard.iter().map(|c| c.quantity).sum()
    }
}

/// Contract for fetching labelled decks for a format within a recency
/// window. Concrete adapters live outside this crate (see
/// `archclass-cli::corpus::PostgresCorpusSource`).
pub trait CorpusSource {
    type Error;

    /// Fetch all labelled decks for `format` with `date >= min_date`
    /// (`min_date` as an ISO-8601 `YYYY-MM-DD` string, matching the source
    /// query's date filter). Implementations should return an
    /// `ArchClassError::CorpusEmpty`-equivalent on an empty result.
    fn fetch(&mut self, format: &str, min_date: &str) -> Result<Vec<DeckEntry>, Self::Error>;
}
