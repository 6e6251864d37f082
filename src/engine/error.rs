use thiserror::Error;

/// Errors returned by record sinks. Per-record and recoverable: the
/// poller logs the failure and moves on to the next record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("record rejected: {0}")]
    Rejected(String),
}
