use std::time::{Duration, Instant};

use super::error::PollerError;

/// Lifecycle of a poller task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerStatus {
    Running,
    Stopping,
    Stopped,
    Failed,
}

/// Progress counters owned by one poller.
///
/// Mutated only by the owning task and read by the supervisor only
/// after the task has handed it back, so there is no concurrent access
/// by construction.
#[derive(Debug, Clone)]
pub struct PollerState {
    pub shard_id: String,
    pub records_processed: u64,
    pub started_at: Instant,
    pub status: PollerStatus,
}

impl PollerState {
    pub(crate) fn new(shard_id: impl Into<String>) -> Self {
        Self {
            shard_id: shard_id.into(),
            records_processed: 0,
            started_at: Instant::now(),
            status: PollerStatus::Running,
        }
    }

    /// Time since the poller was spawned
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Why a poller reached its terminal state
#[derive(Debug)]
pub enum StopCause {
    /// The shared cancellation signal was observed
    Cancelled,
    /// The shard's final iterator was consumed (closed shard)
    ShardExhausted,
    /// The poller never got off the ground
    Failed(PollerError),
}

/// Terminal outcome handed back to the supervisor when the task returns
#[derive(Debug)]
pub struct PollerReport {
    pub state: PollerState,
    pub cause: StopCause,
}

impl PollerReport {
    pub fn is_failed(&self) -> bool {
        matches!(self.cause, StopCause::Failed(_))
    }
}
