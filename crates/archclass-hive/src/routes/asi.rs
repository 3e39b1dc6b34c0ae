use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use archclass_core::asi::find_nearest_archetypes;
use archclass_core::codec::decode_bigram_table;
use archclass_core::consts::RESPONSE_SCORE_FLOOR;
use archclass_core::error::ArchClassError;
use archclass_protocol::asi::{AsiRequest, AsiResponse};
use archclass_protocol::format::Format;
use archclass_protocol::ResponseMeta;
use axum::extract::{Query, State};
use axum::Json;
use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AsiQuery {
    pub format: String,
}

/// `POST /asi?format={fmt}`.
pub async fn score(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AsiQuery>,
    Json(decklist): Json<AsiRequest>,
) -> AppResult<Json<AsiResponse>> {
    let start = Instant::now();

    let format = Format::from_str(&query.format)
        .map_err(|_| AppError::InputShape(format!("unknown format: {}", query.format)))?;

    if decklist.len() < 2 {
        return Err(AppError::InputShape(
            "decklist must contain at least two cards".to_string(),
        ));
    }

    let blob = state
        .store
        .get_meta_row(format, "asi")
        .await
        .map_err(AppError::Store)?
        .ok_or_else(|| {
            AppError::Core(ArchClassError::MissingArtifact(format!(
                "no asi artifact for format {}",
                format.as_str()
            )))
        })?;

    let bigrams = decode_bigram_table(&blob).map_err(AppError::Core)?;
    let read_count = bigrams.len() as u64;

    let lowercased: Vec<String> = decklist.iter().map(|c| c.to_lowercase()).collect();
    let scored = find_nearest_archetypes(&bigrams, &lowercased);

    let data: IndexMap<String, f64> = scored
        .into_iter()
        .filter(|(_, score)| *score > RESPONSE_SCORE_FLOOR)
        .collect();

    Ok(Json(AsiResponse {
        meta: ResponseMeta {
            database: (*state.database_label).clone(),
            backend: "postgres".to_string(),
            exec_ms: start.elapsed().as_millis() as u64,
            read_count,
            model: "asi".to_string(),
        },
        data,
    }))
}
