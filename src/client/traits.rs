use async_trait::async_trait;
use serde::Deserialize;

use super::error::{CheckpointError, ClientError};

/// Where a freshly requested shard iterator starts reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartPosition {
    /// Oldest record still retained by the shard
    Earliest,
    /// Only records written after the iterator was issued
    Latest,
}

/// A single record as returned from a shard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub data: Vec<u8>,
    pub sequence_number: u64,
}

/// One fetched batch plus the token for the next fetch.
///
/// An absent `next_iterator` is the upstream log's end-of-shard signal:
/// the shard is closed and fully consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBatch {
    pub records: Vec<Record>,
    pub next_iterator: Option<String>,
}

/// Operations the consumer core needs from the log service.
///
/// Implementations are shared across pollers; each poller only ever
/// touches its own shard id.
#[async_trait]
pub trait StreamClient: Send + Sync {
    /// List the stream's current shard ids
    async fn describe_stream(&self, stream: &str) -> Result<Vec<String>, ClientError>;

    /// Obtain an iterator for reading `shard_id` from `position`
    async fn shard_iterator(
        &self,
        stream: &str,
        shard_id: &str,
        position: StartPosition,
    ) -> Result<String, ClientError>;

    /// Fetch up to `limit` records at `iterator`
    async fn records(&self, iterator: &str, limit: usize) -> Result<RecordBatch, ClientError>;
}

/// Durable record of the last processed position per shard.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Record `sequence_number` as processed for `shard_id`.
    ///
    /// Idempotent: recording the same or an earlier value again is safe,
    /// so a failed write may simply be retried or superseded.
    async fn checkpoint(&self, shard_id: &str, sequence_number: u64)
    -> Result<(), CheckpointError>;
}
