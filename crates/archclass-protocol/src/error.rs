use serde::Serialize;

/// The wire shape of every error response, for both 4xx and 5xx: `{error,
/// message}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}
