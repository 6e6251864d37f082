use thiserror::Error;

use crate::client::ClientError;
use crate::domain::AssignmentError;
use crate::poller::PollerError;

/// One poller that ended in a failed state
#[derive(Debug)]
pub struct PollerFailure {
    pub shard_id: String,
    pub error: PollerError,
}

/// Errors surfaced by a supervisor run
#[derive(Error, Debug)]
pub enum RunError {
    #[error("invalid assignment: {0}")]
    InvalidAssignment(#[from] AssignmentError),

    #[error("failed to describe stream: {0}")]
    Stream(ClientError),

    #[error("pollers failed for shards: {}", failed_shards(.0))]
    PollerFailures(Vec<PollerFailure>),
}

fn failed_shards(failures: &[PollerFailure]) -> String {
    failures
        .iter()
        .map(|failure| failure.shard_id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
