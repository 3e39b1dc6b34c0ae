use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::ResponseMeta;

/// One `{name, quantity}` entry of a counts-model request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardQuantity {
    pub name: String,
    pub quantity: u32,
}

/// `POST /nbac?format={fmt}` request body: either a bare array of card
/// names (presence model, `k=1` each) or an array of `{name, quantity}`
/// (counts model, quantities clipped server-side to 4).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NbacRequest {
    Presence(Vec<String>),
    Counts(Vec<CardQuantity>),
}

/// `?explain_method=` query value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExplainMethod {
    Lift,
    Contrib,
}

/// One card's evidence contribution within an [`ExplainBlock`].
#[derive(Debug, Clone, Serialize)]
pub struct CardEvidence {
    pub card: String,
    pub quantity: u32,
    pub score: f64,
}

/// The optional `explain` block, present only when `explain=1` was
/// requested.
#[derive(Debug, Clone, Serialize)]
pub struct ExplainBlock {
    pub method: ExplainMethod,
    pub top: usize,
    pub n: usize,
    pub archetypes: IndexMap<String, Vec<CardEvidence>>,
}

/// `POST /nbac?format={fmt}` response.
#[derive(Debug, Clone, Serialize)]
pub struct NbacResponse {
    pub meta: ResponseMeta,
    pub data: IndexMap<String, f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explain: Option<ExplainBlock>,
}
