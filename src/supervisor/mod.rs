pub mod error;

pub use error::{PollerFailure, RunError};

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::client::{CheckpointStore, StreamClient};
use crate::domain::Assignment;
use crate::engine::EventProcessor;
use crate::poller::{PollerConfig, PollerError, PollerState, ShardPoller, StopCause};

/// Runs one poller task per assigned shard under a single cancellation
/// signal.
///
/// The supervisor validates the assignment against the live shard list
/// before anything is spawned, then blocks until every poller has
/// reached a terminal state: no task outlives [`run`](Self::run).
///
/// # Example
/// ```rust,ignore
/// let cancel = CancellationToken::new();
/// let supervisor = Supervisor::new(client, checkpoints, processor, config, cancel.clone());
///
/// // Bridge SIGTERM into `cancel` elsewhere; run drains and returns.
/// let summary = supervisor.run(&assignment).await?;
/// println!("processed {} records", summary.total_records());
/// ```
pub struct Supervisor<C, S, P> {
    client: Arc<C>,
    checkpoints: Arc<S>,
    processor: Arc<P>,
    config: PollerConfig,
    cancel: CancellationToken,
}

/// Aggregate outcome of a clean run
#[derive(Debug)]
pub struct RunSummary {
    pub pollers: Vec<PollerState>,
}

impl RunSummary {
    /// Records processed across all shards
    pub fn total_records(&self) -> u64 {
        self.pollers
            .iter()
            .map(|state| state.records_processed)
            .sum()
    }

    /// Records processed by one shard's poller, if it ran
    pub fn records_for(&self, shard_id: &str) -> Option<u64> {
        self.pollers
            .iter()
            .find(|state| state.shard_id == shard_id)
            .map(|state| state.records_processed)
    }
}

impl<C, S, P> Supervisor<C, S, P>
where
    C: StreamClient + 'static,
    S: CheckpointStore + 'static,
    P: EventProcessor + 'static,
{
    pub fn new(
        client: Arc<C>,
        checkpoints: Arc<S>,
        processor: Arc<P>,
        config: PollerConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            checkpoints,
            processor,
            config,
            cancel,
        }
    }

    /// Validate the assignment against the live shard list, run one
    /// poller per assigned shard to completion and aggregate the
    /// terminal states.
    pub async fn run(&self, assignment: &Assignment) -> Result<RunSummary, RunError> {
        let live_shards = self
            .client
            .describe_stream(&self.config.stream)
            .await
            .map_err(RunError::Stream)?;
        let available: HashSet<String> = live_shards.into_iter().collect();
        assignment.validate_against(&available)?;
        info!(
            worker_id = assignment.worker_id(),
            assigned = assignment.len(),
            available = available.len(),
            "assignment validated against stream"
        );

        let handles: Vec<_> = assignment
            .shard_ids()
            .map(|shard_id| {
                let poller = ShardPoller::new(
                    shard_id,
                    Arc::clone(&self.client),
                    Arc::clone(&self.checkpoints),
                    Arc::clone(&self.processor),
                    self.config.clone(),
                    self.cancel.child_token(),
                );
                tokio::spawn(poller.run())
            })
            .collect();
        info!(pollers = handles.len(), "spawned one poller per shard");

        let mut pollers = Vec::with_capacity(handles.len());
        let mut failures = Vec::new();
        for (shard_id, joined) in assignment.shard_ids().zip(join_all(handles).await) {
            match joined {
                Ok(report) => match report.cause {
                    StopCause::Failed(error) => {
                        warn!(shard_id, %error, "poller failed");
                        failures.push(PollerFailure {
                            shard_id: report.state.shard_id,
                            error,
                        });
                    }
                    _ => pollers.push(report.state),
                },
                Err(join_error) => {
                    warn!(shard_id, %join_error, "poller task aborted");
                    failures.push(PollerFailure {
                        shard_id: shard_id.to_string(),
                        error: PollerError::Aborted(join_error.to_string()),
                    });
                }
            }
        }

        if failures.is_empty() {
            Ok(RunSummary { pollers })
        } else {
            Err(RunError::PollerFailures(failures))
        }
    }
}
