use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;

use super::error::ProcessError;
use crate::domain::Event;

/// Record-processing capability injected into every poller at spawn.
///
/// This is the seam between the consumer core and whatever consumes the
/// records: business logic, a sink, a forwarder. Implementations are
/// shared across pollers and must tolerate concurrent calls for
/// different shards.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    /// Handle one decoded record from `shard_id`
    async fn process(
        &self,
        shard_id: &str,
        sequence_number: u64,
        event: Event,
    ) -> Result<(), ProcessError>;
}

/// Sink that logs each record's fields and does nothing else
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingProcessor;

#[async_trait]
impl EventProcessor for LoggingProcessor {
    async fn process(
        &self,
        shard_id: &str,
        sequence_number: u64,
        event: Event,
    ) -> Result<(), ProcessError> {
        info!(
            shard_id,
            sequence_number,
            event_id = %event.event_id,
            user_id = %event.user_id,
            action = %event.action,
            value = event.value,
            "received event"
        );
        Ok(())
    }
}

/// Sink that buffers every record per shard, preserving arrival order.
/// Used by tests and demos to assert on what was delivered.
#[derive(Default)]
pub struct CollectingProcessor {
    events: DashMap<String, Vec<Event>>,
}

impl CollectingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events collected for one shard
    pub fn count(&self, shard_id: &str) -> usize {
        self.events
            .get(shard_id)
            .map(|events| events.len())
            .unwrap_or(0)
    }

    /// Total events collected across all shards
    pub fn total(&self) -> usize {
        self.events.iter().map(|entry| entry.value().len()).sum()
    }

    /// Events collected for one shard, in the order they arrived
    pub fn events(&self, shard_id: &str) -> Vec<Event> {
        self.events
            .get(shard_id)
            .map(|events| events.value().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl EventProcessor for CollectingProcessor {
    async fn process(
        &self,
        shard_id: &str,
        _sequence_number: u64,
        event: Event,
    ) -> Result<(), ProcessError> {
        self.events
            .entry(shard_id.to_string())
            .or_default()
            .push(event);
        Ok(())
    }
}
