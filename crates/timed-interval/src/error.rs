use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown output format {0:?}, expected one of: table, json, json-pretty")]
    UnknownFormat(String),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
