use thiserror::Error;

/// Per-record decode failures. Recoverable: the offending record is
/// skipped and the batch continues.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("malformed event payload: {0}")]
    Json(#[from] serde_json::Error),
}
