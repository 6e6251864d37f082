use thiserror::Error;

use crate::client::ClientError;

/// Fatal poller errors. Everything else the poller sees in steady state
/// is absorbed by its retry loop and reflected only in logs.
#[derive(Error, Debug)]
pub enum PollerError {
    /// The initial iterator request was rejected: the shard does not
    /// exist or was deleted out-of-band after validation. Not retried.
    #[error("failed to obtain initial iterator for shard {shard_id}: {source}")]
    InitialIterator {
        shard_id: String,
        #[source]
        source: ClientError,
    },

    /// The poller task itself died before reporting a terminal state
    #[error("poller task aborted: {0}")]
    Aborted(String),
}
