use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ResponseMeta;

/// `POST /asi?format={fmt}` request body: a JSON array of card names.
pub type AsiRequest = Vec<String>;

/// `POST /asi?format={fmt}` response. `data` is pre-filtered to scores
/// above the response floor and sorted descending by the caller; an
/// `IndexMap` (rather than a `BTreeMap`) is used so that insertion order —
/// and therefore the descending-by-score contract — survives JSON
/// serialization instead of being re-sorted alphabetically by key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsiResponse {
    pub meta: ResponseMeta,
    pub data: IndexMap<String, f64>,
}
