use clap::Args;
use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ALPHA, DEFAULT_BACKGROUND_LAMBDA, DEFAULT_CLIP_QTY, DEFAULT_DECK_SIZE,
    DEFAULT_OPENER_SIZE, DEFAULT_SELF_FILTER_RHO, DEFAULT_TEMPERATURE,
};

/// Hypergeometric defaults for the ASI trainer. Kept overridable rather than
/// hardcoded at call sites, since different formats run best-of-60 and
/// limited pools alike.
#[derive(Args, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct AsiParams {
    #[arg(long, default_value_t = DEFAULT_DECK_SIZE, help = "Assumed mean deck size for hypergeometric draws")]
    pub deck_size: f64,

    #[arg(long, default_value_t = DEFAULT_OPENER_SIZE, help = "Opening hand size for hypergeometric draws")]
    pub opener_size: f64,
}

impl Default for AsiParams {
    fn default() -> Self {
        Self {
            deck_size: DEFAULT_DECK_SIZE,
            opener_size: DEFAULT_OPENER_SIZE,
        }
    }
}

/// Hyperparameters for the NBAC trainer.
#[derive(Args, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct NbacParams {
    #[arg(long, default_value_t = DEFAULT_ALPHA, help = "Laplace smoothing pseudo-count")]
    pub alpha: f64,

    #[arg(long, default_value_t = DEFAULT_BACKGROUND_LAMBDA, help = "Background mixing fraction, in [0,1]")]
    pub background_lambda: f64,

    #[arg(long, default_value_t = DEFAULT_TEMPERATURE, help = "Softmax temperature for the counts model")]
    pub temperature_counts: f64,

    #[arg(long, default_value_t = DEFAULT_TEMPERATURE, help = "Softmax temperature for the presence model")]
    pub temperature_presence: f64,

    #[arg(long, default_value_t = DEFAULT_CLIP_QTY, help = "Per-card quantity clip for the counts model")]
    pub clip_qty: u32,

    #[arg(long, default_value_t = DEFAULT_SELF_FILTER_RHO, help = "Self-filter fraction in [0,1); 0 disables")]
    pub self_filter_rho: f64,
}

impl Default for NbacParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            background_lambda: DEFAULT_BACKGROUND_LAMBDA,
            temperature_counts: DEFAULT_TEMPERATURE,
            temperature_presence: DEFAULT_TEMPERATURE,
            clip_qty: DEFAULT_CLIP_QTY,
            self_filter_rho: DEFAULT_SELF_FILTER_RHO,
        }
    }
}

/// Top-level training configuration, flattening both engines' parameters
/// onto a single trainer CLI/config surface.
#[derive(Args, Debug, Clone, Serialize, Deserialize, Default)]
pub struct TrainingConfig {
    #[command(flatten)]
    pub asi: AsiParams,
    #[command(flatten)]
    pub nbac: NbacParams,
}
