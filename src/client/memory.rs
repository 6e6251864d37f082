use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;

use super::error::{CheckpointError, ClientError};
use super::traits::{CheckpointStore, Record, RecordBatch, StartPosition, StreamClient};
use crate::codec::{self, DecodeError};
use crate::domain::Event;

/// In-memory stream service double.
///
/// Shards are seeded through [`push_event`](Self::push_event) /
/// [`push_raw`](Self::push_raw) and optionally closed to simulate the
/// end-of-shard signal. Iterator tokens are `"{shard_id}/{offset}"`,
/// opaque to the consumer core. Fetch calls are counted per shard and
/// can be made to fail on demand, which is what the isolation and
/// exhaustion tests lean on.
pub struct InMemoryStreamClient {
    stream: String,
    shards: DashMap<String, ShardData>,
}

#[derive(Default)]
struct ShardData {
    records: Vec<Record>,
    next_sequence: u64,
    closed: bool,
    fail_fetches: bool,
    fail_iterators: bool,
    fetch_calls: u64,
}

impl InMemoryStreamClient {
    pub fn new(stream: impl Into<String>) -> Self {
        Self {
            stream: stream.into(),
            shards: DashMap::new(),
        }
    }

    /// Create an empty open shard
    pub fn add_shard(&self, shard_id: impl Into<String>) {
        self.shards.entry(shard_id.into()).or_default();
    }

    /// Append an encoded event to a shard, creating the shard if needed.
    /// Returns the sequence number the record was stored under.
    pub fn push_event(&self, shard_id: &str, event: &Event) -> Result<u64, DecodeError> {
        Ok(self.push_raw(shard_id, codec::encode(event)?))
    }

    /// Append a raw payload to a shard, creating the shard if needed
    pub fn push_raw(&self, shard_id: &str, data: Vec<u8>) -> u64 {
        let mut shard = self.shards.entry(shard_id.to_string()).or_default();
        shard.next_sequence += 1;
        let sequence_number = shard.next_sequence;
        shard.records.push(Record {
            data,
            sequence_number,
        });
        sequence_number
    }

    /// Mark a shard closed: once drained, fetches report no next iterator
    pub fn close_shard(&self, shard_id: &str) {
        if let Some(mut shard) = self.shards.get_mut(shard_id) {
            shard.closed = true;
        }
    }

    /// Make every fetch on `shard_id` fail until turned off again
    pub fn fail_fetches(&self, shard_id: &str, fail: bool) {
        if let Some(mut shard) = self.shards.get_mut(shard_id) {
            shard.fail_fetches = fail;
        }
    }

    /// Make iterator requests for `shard_id` fail, simulating a shard
    /// deleted out-of-band after validation
    pub fn fail_iterators(&self, shard_id: &str, fail: bool) {
        if let Some(mut shard) = self.shards.get_mut(shard_id) {
            shard.fail_iterators = fail;
        }
    }

    /// Number of fetch calls (successful or failed) seen by a shard
    pub fn fetch_calls(&self, shard_id: &str) -> u64 {
        self.shards
            .get(shard_id)
            .map(|shard| shard.fetch_calls)
            .unwrap_or(0)
    }

    fn check_stream(&self, stream: &str) -> Result<(), ClientError> {
        if stream == self.stream {
            Ok(())
        } else {
            Err(ClientError::StreamNotFound(stream.to_string()))
        }
    }
}

fn token(shard_id: &str, offset: usize) -> String {
    format!("{shard_id}/{offset}")
}

fn parse_token(iterator: &str) -> Result<(&str, usize), ClientError> {
    let invalid = || ClientError::InvalidIterator(iterator.to_string());
    let (shard_id, offset) = iterator.rsplit_once('/').ok_or_else(invalid)?;
    let offset = offset.parse().map_err(|_| invalid())?;
    Ok((shard_id, offset))
}

#[async_trait]
impl StreamClient for InMemoryStreamClient {
    async fn describe_stream(&self, stream: &str) -> Result<Vec<String>, ClientError> {
        self.check_stream(stream)?;
        let mut shard_ids: Vec<String> = self
            .shards
            .iter()
            .map(|shard| shard.key().clone())
            .collect();
        shard_ids.sort();
        Ok(shard_ids)
    }

    async fn shard_iterator(
        &self,
        stream: &str,
        shard_id: &str,
        position: StartPosition,
    ) -> Result<String, ClientError> {
        self.check_stream(stream)?;
        let shard = self
            .shards
            .get(shard_id)
            .ok_or_else(|| ClientError::ShardNotFound {
                stream: stream.to_string(),
                shard_id: shard_id.to_string(),
            })?;
        if shard.fail_iterators {
            return Err(ClientError::Unavailable(format!(
                "injected iterator failure on {shard_id}"
            )));
        }
        let offset = match position {
            StartPosition::Earliest => 0,
            StartPosition::Latest => shard.records.len(),
        };
        Ok(token(shard_id, offset))
    }

    async fn records(&self, iterator: &str, limit: usize) -> Result<RecordBatch, ClientError> {
        let (shard_id, offset) = parse_token(iterator)?;
        let mut shard = self
            .shards
            .get_mut(shard_id)
            .ok_or_else(|| ClientError::InvalidIterator(iterator.to_string()))?;
        shard.fetch_calls += 1;
        if shard.fail_fetches {
            return Err(ClientError::Unavailable(format!(
                "injected fetch failure on {shard_id}"
            )));
        }

        let start = offset.min(shard.records.len());
        let end = offset.saturating_add(limit).min(shard.records.len());
        let records = shard.records[start..end].to_vec();

        let next_iterator = if shard.closed && end >= shard.records.len() {
            None
        } else {
            Some(token(shard_id, end))
        };

        Ok(RecordBatch {
            records,
            next_iterator,
        })
    }
}

/// In-memory checkpoint store retaining the full per-shard history,
/// so tests can assert on the whole sequence of recorded positions.
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    history: DashMap<String, Vec<u64>>,
    failing: AtomicBool,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last recorded position for a shard, if any
    pub fn latest(&self, shard_id: &str) -> Option<u64> {
        self.history
            .get(shard_id)
            .and_then(|history| history.last().copied())
    }

    /// Every position ever recorded for a shard, in write order
    pub fn history(&self, shard_id: &str) -> Vec<u64> {
        self.history
            .get(shard_id)
            .map(|history| history.value().clone())
            .unwrap_or_default()
    }

    /// Make every checkpoint write fail until turned off again
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn checkpoint(
        &self,
        shard_id: &str,
        sequence_number: u64,
    ) -> Result<(), CheckpointError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CheckpointError::Unavailable(
                "injected checkpoint failure".to_string(),
            ));
        }
        self.history
            .entry(shard_id.to_string())
            .or_default()
            .push(sequence_number);
        Ok(())
    }
}
