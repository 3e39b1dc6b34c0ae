pub mod asi;
pub mod error;
pub mod format;
pub mod nbac;

use serde::{Deserialize, Serialize};

/// Shared response envelope metadata for both `/asi` and `/nbac`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub database: String,
    pub backend: String,
    pub exec_ms: u64,
    pub read_count: u64,
    pub model: String,
}
