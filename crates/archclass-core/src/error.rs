use thiserror::Error;

/// Error kinds shared by the training and scoring paths. Callers at the HTTP
/// boundary translate `InputShape` to a 4xx and everything else to a 5xx.
#[derive(Error, Debug)]
pub enum ArchClassError {
    #[error("malformed input: {0}")]
    InputShape(String),

    #[error("no artifact for format: {0}")]
    MissingArtifact(String),

    #[error("artifact version skew: {0}")]
    VersionSkew(String),

    #[error("non-finite value encountered during encode: {0}")]
    NumericDomain(String),

    #[error("no labelled decks remain after normalization")]
    CorpusEmpty,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ArchResult<T> = Result<T, ArchClassError>;
