/// Default mainboard deck size used by the hypergeometric bigram model.
pub const DEFAULT_DECK_SIZE: f64 = 60.0;

/// Default opening-hand size used by the hypergeometric bigram model.
pub const DEFAULT_OPENER_SIZE: f64 = 7.0;

/// Overflow cap on the gamma-function binomial coefficient: both `n` and `k`
/// must stay at or below this to avoid `gamma` blowing up to infinity.
pub const COMB_OVERFLOW_CAP: f64 = 170.0;

/// Default Laplace smoothing pseudo-count for NBAC.
pub const DEFAULT_ALPHA: f64 = 1.0;

/// Default background-mixing fraction for NBAC.
pub const DEFAULT_BACKGROUND_LAMBDA: f64 = 0.15;

/// Default softmax temperature (applies independently to counts/presence).
pub const DEFAULT_TEMPERATURE: f64 = 1.0;

/// Default per-card quantity clip for the counts model.
pub const DEFAULT_CLIP_QTY: u32 = 4;

/// Default self-filter fraction (disabled).
pub const DEFAULT_SELF_FILTER_RHO: f64 = 0.0;

/// Score threshold below which archetypes are dropped from HTTP responses.
pub const RESPONSE_SCORE_FLOOR: f64 = 0.05;

/// Max archetypes returned by the NBAC endpoint.
pub const NBAC_RESPONSE_LIMIT: usize = 25;

/// Retention window for store rows, in days.
pub const RETENTION_DAYS: i64 = 30;
