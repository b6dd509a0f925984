use thiserror::Error;

/// Errors decoding a feed payload ("malformed payloads are
/// dropped with a warning"). Never propagated past the decoder that raises
/// it — callers log and move on.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload was not valid JSON.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// A required field was missing or had the wrong shape.
    #[error("missing or malformed field {0:?}")]
    MissingField(&'static str),
    /// A field failed a `trainwatch-model` validation (e.g. a berth name
    /// that isn't 6 characters).
    #[error("invalid model value: {0}")]
    Model(#[from] trainwatch_model::ModelError),
    /// A millisecond-epoch field did not convert to a valid instant.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}
