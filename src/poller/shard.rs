use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cursor::ShardCursor;
use super::error::PollerError;
use super::state::{PollerReport, PollerState, PollerStatus, StopCause};
use crate::client::{CheckpointStore, RecordBatch, StartPosition, StreamClient};
use crate::codec;
use crate::engine::EventProcessor;

/// Settings shared by every poller in a run
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub stream: String,
    pub batch_limit: usize,
    pub poll_interval: Duration,
    pub start_position: StartPosition,
}

/// A single shard's polling loop.
///
/// Owns the shard's cursor for the lifetime of the task and repeats
/// fetch, decode, process, checkpoint, advance, wait until the shared
/// cancellation signal fires or the shard is exhausted. Fetch failures
/// are retried indefinitely at the poll interval; only a failed initial
/// iterator request is fatal.
pub struct ShardPoller<C, S, P> {
    client: Arc<C>,
    checkpoints: Arc<S>,
    processor: Arc<P>,
    config: PollerConfig,
    cancel: CancellationToken,
    state: PollerState,
    /// Last sequence number handed to the processor but not yet
    /// recorded in the checkpoint store
    owed_checkpoint: Option<u64>,
}

impl<C, S, P> ShardPoller<C, S, P>
where
    C: StreamClient,
    S: CheckpointStore,
    P: EventProcessor,
{
    pub fn new(
        shard_id: impl Into<String>,
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
            state: PollerState::new(shard_id),
            owed_checkpoint: None,
        }
    }

    /// Drive the shard to a terminal state.
    ///
    /// Consumes the poller; the returned report is the only channel back
    /// to the supervisor.
    pub async fn run(mut self) -> PollerReport {
        info!(shard_id = %self.state.shard_id, "starting shard poller");

        let iterator = match self
            .client
            .shard_iterator(
                &self.config.stream,
                &self.state.shard_id,
                self.config.start_position,
            )
            .await
        {
            Ok(iterator) => iterator,
            Err(source) => {
                warn!(
                    shard_id = %self.state.shard_id,
                    error = %source,
                    "failed to obtain initial iterator"
                );
                self.state.status = PollerStatus::Failed;
                let shard_id = self.state.shard_id.clone();
                return PollerReport {
                    state: self.state,
                    cause: StopCause::Failed(PollerError::InitialIterator { shard_id, source }),
                };
            }
        };

        let mut cursor = ShardCursor::new(self.state.shard_id.clone(), iterator);
        let cause = self.poll_loop(&mut cursor).await;

        self.state.status = PollerStatus::Stopping;
        if let Some(sequence_number) = self.owed_checkpoint.take() {
            // One best-effort attempt to cover work done since the last
            // successful checkpoint; failure is logged and swallowed.
            match self
                .checkpoints
                .checkpoint(&self.state.shard_id, sequence_number)
                .await
            {
                Ok(()) => cursor.commit(sequence_number),
                Err(error) => warn!(
                    shard_id = %self.state.shard_id,
                    sequence_number,
                    %error,
                    "final checkpoint failed"
                ),
            }
        }

        self.state.status = PollerStatus::Stopped;
        info!(
            shard_id = %self.state.shard_id,
            records_processed = self.state.records_processed,
            last_position = ?cursor.position(),
            elapsed_secs = self.state.elapsed().as_secs_f64(),
            "shard poller stopped"
        );
        PollerReport {
            state: self.state,
            cause,
        }
    }

    async fn poll_loop(&mut self, cursor: &mut ShardCursor) -> StopCause {
        loop {
            if self.cancel.is_cancelled() {
                return StopCause::Cancelled;
            }

            let Some(iterator) = cursor.iterator() else {
                info!(shard_id = %cursor.shard_id(), "shard exhausted");
                return StopCause::ShardExhausted;
            };

            // A fetch that never answers must not outlive cancellation,
            // so the call is raced against the token.
            let batch = tokio::select! {
                _ = self.cancel.cancelled() => return StopCause::Cancelled,
                result = self.client.records(iterator, self.config.batch_limit) => {
                    match result {
                        Ok(batch) => batch,
                        Err(error) => {
                            warn!(
                                shard_id = %cursor.shard_id(),
                                %error,
                                "fetch failed, retrying after poll interval"
                            );
                            if !self.wait_one_interval().await {
                                return StopCause::Cancelled;
                            }
                            continue;
                        }
                    }
                }
            };

            self.handle_batch(cursor, batch).await;

            if !self.wait_one_interval().await {
                return StopCause::Cancelled;
            }
        }
    }

    async fn handle_batch(&mut self, cursor: &mut ShardCursor, batch: RecordBatch) {
        let RecordBatch {
            records,
            next_iterator,
        } = batch;
        let last_sequence = records.last().map(|record| record.sequence_number);

        for record in records {
            let event = match codec::decode(&record.data) {
                Ok(event) => event,
                Err(error) => {
                    warn!(
                        shard_id = %cursor.shard_id(),
                        sequence_number = record.sequence_number,
                        %error,
                        "skipping undecodable record"
                    );
                    continue;
                }
            };

            if let Err(error) = self
                .processor
                .process(cursor.shard_id(), record.sequence_number, event)
                .await
            {
                warn!(
                    shard_id = %cursor.shard_id(),
                    sequence_number = record.sequence_number,
                    %error,
                    "record handler failed, skipping"
                );
                continue;
            }

            self.state.records_processed += 1;
            debug!(
                shard_id = %cursor.shard_id(),
                sequence_number = record.sequence_number,
                records_processed = self.state.records_processed,
                "processed record"
            );
        }

        // At-least-once: only the last sequence number of a fully handed
        // over batch is checkpointed, and only ever forward.
        if let Some(sequence_number) = last_sequence {
            self.owed_checkpoint = Some(sequence_number);
            match self
                .checkpoints
                .checkpoint(cursor.shard_id(), sequence_number)
                .await
            {
                Ok(()) => {
                    self.owed_checkpoint = None;
                    cursor.commit(sequence_number);
                }
                // Not retried: the next non-empty batch supersedes it,
                // and the shutdown path covers whatever is still owed.
                Err(error) => warn!(
                    shard_id = %cursor.shard_id(),
                    sequence_number,
                    %error,
                    "checkpoint failed"
                ),
            }
        }

        cursor.advance(next_iterator);
    }

    /// Interruptible poll-interval wait. Returns false if cancellation
    /// was observed during the wait.
    async fn wait_one_interval(&self) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = sleep(self.config.poll_interval) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{InMemoryCheckpointStore, InMemoryStreamClient};
    use crate::engine::{CollectingProcessor, ProcessError};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::Map;
    use std::time::Instant;
    use tokio::time::timeout;

    use crate::domain::Event;

    const SHARD: &str = "shardId-000";

    fn sample_event(n: u64) -> Event {
        Event {
            event_id: format!("evt_{n}"),
            user_id: format!("user_{n}"),
            timestamp: Utc::now(),
            action: "purchase".to_string(),
            value: n as f64,
            metadata: Map::new(),
        }
    }

    fn config(poll_interval: Duration) -> PollerConfig {
        PollerConfig {
            stream: "events".to_string(),
            batch_limit: 10,
            poll_interval,
            start_position: StartPosition::Earliest,
        }
    }

    fn poller(
        client: &Arc<InMemoryStreamClient>,
        checkpoints: &Arc<InMemoryCheckpointStore>,
        processor: &Arc<CollectingProcessor>,
        config: PollerConfig,
        cancel: &CancellationToken,
    ) -> ShardPoller<InMemoryStreamClient, InMemoryCheckpointStore, CollectingProcessor> {
        ShardPoller::new(
            SHARD,
            Arc::clone(client),
            Arc::clone(checkpoints),
            Arc::clone(processor),
            config,
            cancel.clone(),
        )
    }

    fn seeded_client(n: u64, closed: bool) -> Arc<InMemoryStreamClient> {
        let client = InMemoryStreamClient::new("events");
        for i in 0..n {
            client.push_event(SHARD, &sample_event(i)).unwrap();
        }
        if closed {
            client.close_shard(SHARD);
        }
        Arc::new(client)
    }

    #[tokio::test]
    async fn drains_a_closed_shard_and_stops() {
        let client = seeded_client(3, true);
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let processor = Arc::new(CollectingProcessor::new());
        let cancel = CancellationToken::new();

        let report = poller(
            &client,
            &checkpoints,
            &processor,
            config(Duration::from_millis(1)),
            &cancel,
        )
        .run()
        .await;

        assert!(matches!(report.cause, StopCause::ShardExhausted));
        assert_eq!(report.state.status, PollerStatus::Stopped);
        assert_eq!(report.state.records_processed, 3);
        assert_eq!(processor.count(SHARD), 3);
        assert_eq!(checkpoints.latest(SHARD), Some(3));
        // The single fetch that drained the shard is the last one ever
        assert_eq!(client.fetch_calls(SHARD), 1);
    }

    #[tokio::test]
    async fn preserves_per_shard_record_order() {
        let client = seeded_client(5, true);
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let processor = Arc::new(CollectingProcessor::new());
        let cancel = CancellationToken::new();

        poller(
            &client,
            &checkpoints,
            &processor,
            config(Duration::from_millis(1)),
            &cancel,
        )
        .run()
        .await;

        let ids: Vec<String> = processor
            .events(SHARD)
            .into_iter()
            .map(|e| e.event_id)
            .collect();
        assert_eq!(ids, vec!["evt_0", "evt_1", "evt_2", "evt_3", "evt_4"]);
    }

    #[tokio::test]
    async fn skips_undecodable_records() {
        let client = Arc::new(InMemoryStreamClient::new("events"));
        client.push_event(SHARD, &sample_event(0)).unwrap();
        client.push_event(SHARD, &sample_event(1)).unwrap();
        client.push_raw(SHARD, b"definitely not json".to_vec());
        client.push_event(SHARD, &sample_event(2)).unwrap();
        client.close_shard(SHARD);
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let processor = Arc::new(CollectingProcessor::new());
        let cancel = CancellationToken::new();

        let report = poller(
            &client,
            &checkpoints,
            &processor,
            config(Duration::from_millis(1)),
            &cancel,
        )
        .run()
        .await;

        assert_eq!(report.state.records_processed, 3);
        assert_eq!(processor.count(SHARD), 3);
        // The malformed record still advances the checkpoint
        assert_eq!(checkpoints.latest(SHARD), Some(4));
        assert_eq!(report.state.status, PollerStatus::Stopped);
    }

    #[tokio::test]
    async fn skips_records_the_handler_rejects() {
        struct RejectEverything;

        #[async_trait]
        impl EventProcessor for RejectEverything {
            async fn process(
                &self,
                _shard_id: &str,
                _sequence_number: u64,
                _event: Event,
            ) -> Result<(), ProcessError> {
                Err(ProcessError::Rejected("not today".to_string()))
            }
        }

        let client = seeded_client(3, true);
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let cancel = CancellationToken::new();

        let report = ShardPoller::new(
            SHARD,
            Arc::clone(&client),
            Arc::clone(&checkpoints),
            Arc::new(RejectEverything),
            config(Duration::from_millis(1)),
            cancel.clone(),
        )
        .run()
        .await;

        assert_eq!(report.state.records_processed, 0);
        assert_eq!(report.state.status, PollerStatus::Stopped);
        // The batch was still handed over in full, so it checkpoints
        assert_eq!(checkpoints.latest(SHARD), Some(3));
    }

    #[tokio::test]
    async fn checkpointed_positions_never_decrease() {
        let client = seeded_client(5, true);
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let processor = Arc::new(CollectingProcessor::new());
        let cancel = CancellationToken::new();

        let mut config = config(Duration::from_millis(1));
        config.batch_limit = 2;

        poller(&client, &checkpoints, &processor, config, &cancel)
            .run()
            .await;

        let history = checkpoints.history(SHARD);
        assert_eq!(history, vec![2, 4, 5]);
        assert!(history.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[tokio::test]
    async fn initial_iterator_failure_is_fatal() {
        let client = Arc::new(InMemoryStreamClient::new("events"));
        client.add_shard(SHARD);
        client.fail_iterators(SHARD, true);
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let processor = Arc::new(CollectingProcessor::new());
        let cancel = CancellationToken::new();

        let report = poller(
            &client,
            &checkpoints,
            &processor,
            config(Duration::from_millis(1)),
            &cancel,
        )
        .run()
        .await;

        assert!(report.is_failed());
        assert_eq!(report.state.status, PollerStatus::Failed);
        assert_eq!(report.state.records_processed, 0);
        assert_eq!(client.fetch_calls(SHARD), 0);
    }

    #[tokio::test]
    async fn fetch_failures_are_retried_until_cancelled() {
        let client = Arc::new(InMemoryStreamClient::new("events"));
        client.add_shard(SHARD);
        client.fail_fetches(SHARD, true);
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let processor = Arc::new(CollectingProcessor::new());
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(
            poller(
                &client,
                &checkpoints,
                &processor,
                config(Duration::from_millis(2)),
                &cancel,
            )
            .run(),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel.cancel();
        let report = handle.await.unwrap();

        assert!(matches!(report.cause, StopCause::Cancelled));
        assert_eq!(report.state.status, PollerStatus::Stopped);
        assert_eq!(report.state.records_processed, 0);
        assert!(client.fetch_calls(SHARD) >= 2, "expected repeated retries");
    }

    #[tokio::test]
    async fn cancellation_interrupts_a_long_poll_wait() {
        let client = seeded_client(2, false);
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        let processor = Arc::new(CollectingProcessor::new());
        let cancel = CancellationToken::new();

        // An interval far longer than the test is allowed to take
        let handle = tokio::spawn(
            poller(
                &client,
                &checkpoints,
                &processor,
                config(Duration::from_secs(60)),
                &cancel,
            )
            .run(),
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
        let cancelled_at = Instant::now();
        cancel.cancel();

        let report = timeout(Duration::from_secs(2), handle)
            .await
            .expect("poller did not stop within bound")
            .unwrap();

        assert!(cancelled_at.elapsed() < Duration::from_secs(2));
        assert!(matches!(report.cause, StopCause::Cancelled));
        assert_eq!(report.state.records_processed, 2);
    }

    #[tokio::test]
    async fn owed_checkpoint_is_written_on_shutdown() {
        let client = seeded_client(2, false);
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        checkpoints.set_failing(true);
        let processor = Arc::new(CollectingProcessor::new());
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(
            poller(
                &client,
                &checkpoints,
                &processor,
                config(Duration::from_millis(2)),
                &cancel,
            )
            .run(),
        );

        let deadline = Instant::now() + Duration::from_secs(5);
        while processor.count(SHARD) < 2 {
            assert!(Instant::now() < deadline, "records were never processed");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // The store recovers just before shutdown; the final best-effort
        // attempt covers the batch whose checkpoint failed mid-run.
        checkpoints.set_failing(false);
        cancel.cancel();
        let report = handle.await.unwrap();

        assert_eq!(report.state.status, PollerStatus::Stopped);
        assert_eq!(checkpoints.history(SHARD), vec![2]);
    }

    #[tokio::test]
    async fn checkpoint_failures_do_not_stop_processing() {
        let client = seeded_client(3, true);
        let checkpoints = Arc::new(InMemoryCheckpointStore::new());
        checkpoints.set_failing(true);
        let processor = Arc::new(CollectingProcessor::new());
        let cancel = CancellationToken::new();

        let report = poller(
            &client,
            &checkpoints,
            &processor,
            config(Duration::from_millis(1)),
            &cancel,
        )
        .run()
        .await;

        assert_eq!(report.state.status, PollerStatus::Stopped);
        assert_eq!(report.state.records_processed, 3);
        assert!(checkpoints.history(SHARD).is_empty());
    }
}
