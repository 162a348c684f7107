//! Error types for glosa operations

#[derive(Debug, thiserror::Error)]
pub enum GlosaError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Ambiguous path: {path} ({reason})")]
    AmbiguousPath { path: String, reason: String },

    #[error("Invalid manual correction: {0}")]
    InvalidManualCorrection(String),

    #[error("Change set is empty: approve a proposal or add a manual correction first")]
    EmptyChangeSet,

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Service error [{code}]: {message} ({hint})")]
    ServiceError {
        code: String,
        message: String,
        hint: String,
    },
}
