use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use archclass_core::codec::{decode_card_entry, decode_meta};
use archclass_core::consts::{DEFAULT_CLIP_QTY, NBAC_RESPONSE_LIMIT, RESPONSE_SCORE_FLOOR};
use archclass_core::error::ArchClassError;
use archclass_core::nbac::{explain_deck, score_deck, top_k, ExplainMethod, ModelKind};
use archclass_protocol::format::Format;
use archclass_protocol::nbac::{
    CardEvidence, CardQuantity, ExplainBlock, NbacRequest, NbacResponse,
};
use archclass_protocol::nbac::ExplainMethod as WireExplainMethod;
use archclass_protocol::ResponseMeta;
use axum::extract::{Query, State};
use axum::Json;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct NbacQuery {
    pub format: String,
    #[serde(default)]
    pub explain: u8,
    pub explain_top: Option<usize>,
    pub explain_n: Option<usize>,
    pub explain_method: Option<String>,
}

fn consolidate(request: &NbacRequest) -> Result<(ModelKind, HashMap<String, u32>), AppError> {
    match request {
        NbacRequest::Presence(names) => {
            if names.is_empty() {
                return Err(AppError::InputShape("deck must not be empty".to_string()));
            }
            let mut counts = HashMap::new();
            for name in names {
                counts.insert(name.clone(), 1);
            }
            Ok((ModelKind::Presence, counts))
        }
        NbacRequest::Counts(entries) => {
            if entries.is_empty() {
                return Err(AppError::InputShape("deck must not be empty".to_string()));
            }
            let mut counts: HashMap<String, u32> = HashMap::new();
            for CardQuantity { name, quantity } in entries {
                if *quantity == 0 {
                    return Err(AppError::InputShape(
                        "card quantity must be positive".to_string(),
                    ));
                }
                let clipped = (*quantity).min(DEFAULT_CLIP_QTY);
                *counts.entry(name.clone()).or_insert(0u32) += clipped;
            }
            Ok((ModelKind::Counts, counts))
        }
    }
}

/// `POST /nbac?format={fmt}[&explain=...]`.
pub async fn score(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NbacQuery>,
    Json(request): Json<NbacRequest>,
) -> AppResult<Json<NbacResponse>> {
    let start = Instant::now();

    let format = Format::from_str(&query.format)
        .map_err(|_| AppError::InputShape(format!("unknown format: {}", query.format)))?;

    let (model_kind, deck_counts) = consolidate(&request)?;

    let meta_blob = state
        .store
        .get_meta(format)
        .await
        .map_err(AppError::Store)?
        .ok_or_else(|| {
            AppError::Core(ArchClassError::MissingArtifact(format!(
                "no nbac artifact for format {}",
                format.as_str()
            )))
        })?;
    let meta = decode_meta(&meta_blob).map_err(AppError::Core)?;

    let card_names: Vec<String> = deck_counts.keys().cloned().collect();
    let card_blobs = state
        .store
        .get_cards(format, &card_names)
        .await
        .map_err(AppError::Store)?;

    let mut card_entries = HashMap::new();
    for (card, blob) in card_blobs {
        let entry = decode_card_entry(&blob).map_err(AppError::Core)?;
        if entry.log_theta_counts.len() != meta.archetypes.len() {
            return Err(AppError::Core(ArchClassError::VersionSkew(format!(
                "card '{card}' has {} archetypes, meta has {}",
                entry.log_theta_counts.len(),
                meta.archetypes.len()
            ))));
        }
        card_entries.insert(card, entry);
    }
    let read_count = 1 + card_entries.len() as u64;

    let posteriors = score_deck(&meta, model_kind, &deck_counts, &card_entries);

    let data: IndexMap<String, f64> = top_k(&posteriors, NBAC_RESPONSE_LIMIT)
        .into_iter()
        .filter(|(_, score)| *score > RESPONSE_SCORE_FLOOR)
        .collect();

    let explain = if query.explain != 0 {
        let top = query.explain_top.unwrap_or(1).max(1);
        let n = query.explain_n.unwrap_or(5).max(1);
        let method = match query.explain_method.as_deref() {
            Some("lift") => WireExplainMethod::Lift,
            _ => WireExplainMethod::Contrib,
        };
        let core_method = match method {
            WireExplainMethod::Lift => ExplainMethod::Lift,
            WireExplainMethod::Contrib => ExplainMethod::Contrib,
        };

        let mut archetypes = IndexMap::new();
        for (archetype, _) in top_k(&posteriors, top) {
            let evidence = explain_deck(
                &meta,
                model_kind,
                &deck_counts,
                &card_entries,
                &archetype,
                n,
                core_method,
            )
            .into_iter()
            .map(|(card, score)| CardEvidence {
                quantity: deck_counts.get(&card).copied().unwrap_or(0),
                card,
                score,
            })
            .collect();
            archetypes.insert(archetype, evidence);
        }

        Some(ExplainBlock {
            method,
            top,
            n,
            archetypes,
        })
    } else {
        None
    };

    Ok(Json(NbacResponse {
        meta: ResponseMeta {
            database: (*state.database_label).clone(),
            backend: "postgres".to_string(),
            exec_ms: start.elapsed().as_millis() as u64,
            read_count,
            model: model_kind_label(model_kind).to_string(),
        },
        data,
        explain,
    }))
}

fn model_kind_label(kind: ModelKind) -> &'static str {
    match kind {
        ModelKind::Counts => "counts",
        ModelKind::Presence => "presence",
    }
}
