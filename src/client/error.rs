use thiserror::Error;

/// Errors surfaced by the stream service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("stream {0} not found")]
    StreamNotFound(String),

    #[error("shard {shard_id} not found in stream {stream}")]
    ShardNotFound { stream: String, shard_id: String },

    #[error("invalid shard iterator: {0}")]
    InvalidIterator(String),

    #[error("stream service unavailable: {0}")]
    Unavailable(String),
}

/// Errors surfaced by the checkpoint store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("checkpoint store unavailable: {0}")]
    Unavailable(String),
}
