use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use shardpoll::prelude::*;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    CliApp::new("shardpoll").run(run_consumer).await;
}

/// Main application logic: load the configuration, stand up the demo
/// stream and poll the assigned shards until a shutdown signal arrives.
async fn run_consumer(cancel: CancellationToken) -> Result<(), AppError> {
    let config = Config::load()?;

    if config.consumer.assignment_mode != AssignmentMode::Manual {
        return Err(AppError::UnsupportedMode("automatic".to_string()));
    }

    info!(
        stream = %config.stream.stream_name,
        region = %config.stream.region,
        endpoint = %config.stream.endpoint,
        "connecting to stream"
    );
    info!(
        worker_id = %config.consumer.worker_id,
        assigned_shards = ?config.consumer.assigned_shards,
        "running in manual assignment mode"
    );

    let client = Arc::new(seed_demo_stream(&config)?);
    let checkpoints = Arc::new(InMemoryCheckpointStore::new());
    let processor = Arc::new(LoggingProcessor);

    let supervisor = Supervisor::new(
        client,
        checkpoints,
        processor,
        config.poller_config(),
        cancel,
    );
    let summary = supervisor.run(&config.assignment()).await?;

    info!(
        pollers = summary.pollers.len(),
        total_records = summary.total_records(),
        "all shard pollers stopped"
    );
    Ok(())
}

/// Stand-in for the real log service: an in-memory stream pre-seeded
/// with sample events on every assigned shard. The shards stay open, so
/// the consumer keeps polling until interrupted, like it would against
/// a live stream.
fn seed_demo_stream(config: &Config) -> Result<InMemoryStreamClient, AppError> {
    let client = InMemoryStreamClient::new(&config.stream.stream_name);
    for (shard_index, shard_id) in config.consumer.assigned_shards.iter().enumerate() {
        client.add_shard(shard_id);
        for n in 0..25 {
            client.push_event(shard_id, &sample_event(shard_index as u64, n))?;
        }
    }
    Ok(client)
}

const ACTIONS: &[&str] = &[
    "login",
    "purchase",
    "view",
    "click",
    "logout",
    "search",
    "add_to_cart",
    "checkout",
];

fn sample_event(shard_index: u64, n: u64) -> Event {
    let mut metadata = serde_json::Map::new();
    metadata.insert("source".to_string(), "web".into());
    metadata.insert("version".to_string(), "1.0".into());
    metadata.insert(
        "session".to_string(),
        format!("sess_{}", (shard_index * 7 + n) % 100).into(),
    );

    Event {
        event_id: format!("evt_{shard_index}_{n}"),
        user_id: format!("user_{}", (n * 31 + shard_index) % 1000),
        timestamp: chrono::Utc::now(),
        action: ACTIONS[(shard_index as usize + n as usize) % ACTIONS.len()].to_string(),
        value: ((n * 131 + shard_index * 17) % 100_000) as f64 / 100.0,
        metadata,
    }
}
