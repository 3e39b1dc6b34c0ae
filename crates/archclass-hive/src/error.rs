use archclass_core::error::ArchClassError;
use archclass_protocol::error::ErrorBody;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

/// Edge-service error type. The mapping below is the only place that
/// decides HTTP status codes for each kind of failure.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("malformed input: {0}")]
    InputShape(String),

    #[error(transparent)]
    Core(#[from] ArchClassError),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            AppError::InputShape(msg) => (StatusCode::BAD_REQUEST, "input_shape", msg.clone()),
            AppError::Core(ArchClassError::InputShape(msg)) => {
                (StatusCode::BAD_REQUEST, "input_shape", msg.clone())
            }
            AppError::Core(ArchClassError::MissingArtifact(msg)) => {
                tracing::error!("missing artifact: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "missing_artifact",
                    msg.clone(),
                )
            }
            AppError::Core(ArchClassError::VersionSkew(msg)) => {
                tracing::error!("version skew: {msg}");
                (StatusCode::INTERNAL_SERVER_ERROR, "version_skew", msg.clone())
            }
            AppError::Core(ArchClassError::NumericDomain(msg)) => {
                tracing::error!("numeric domain: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "numeric_domain",
                    msg.clone(),
                )
            }
            AppError::Core(ArchClassError::CorpusEmpty) => {
                tracing::error!("corpus empty");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "corpus_empty",
                    self.to_string(),
                )
            }
            AppError::Core(ArchClassError::Json(e)) => {
                tracing::error!("json error: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "json", e.to_string())
            }
            AppError::Store(e) => {
                tracing::error!("store failure: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "store_failure",
                    "store failure".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: kind.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
