pub mod asi;
pub mod nbac;
pub mod system;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;

use crate::state::AppState;

pub fn system_routes() -> Router<Arc<AppState>> {
    Router::new().route("/health", axum::routing::get(system::health))
}

pub fn scoring_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/asi", axum::routing::post(asi::score))
        .route("/nbac", axum::routing::post(nbac::score))
}

/// Any path/method combination not matched by `system_routes` or
/// `scoring_routes` falls through here; the only two endpoints are
/// `/asi` and `/nbac` (both `POST`-only), so any other request is
/// unsupported rather than merely missing.
pub async fn unsupported() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}
