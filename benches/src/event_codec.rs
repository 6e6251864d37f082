use std::sync::Arc;
use std::time::Duration;

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tokio_util::sync::CancellationToken;

use shardpoll::prelude::*;

fn sample_event(n: u64) -> Event {
    let mut metadata = serde_json::Map::new();
    metadata.insert("source".to_string(), "web".into());
    metadata.insert("version".to_string(), "1.0".into());
    metadata.insert("session".to_string(), format!("sess_{}", n % 100).into());

    Event {
        event_id: format!("evt_{n}"),
        user_id: format!("user_{}", n % 1000),
        timestamp: chrono::Utc::now(),
        action: "purchase".to_string(),
        value: (n % 100_000) as f64 / 100.0,
        metadata,
    }
}

/// Benchmark event encoding throughput
fn bench_encode(c: &mut Criterion) {
    let event = sample_event(42);

    c.bench_function("encode_event", |b| {
        b.iter(|| black_box(encode(black_box(&event)).unwrap()));
    });
}

/// Benchmark event decoding throughput
fn bench_decode(c: &mut Criterion) {
    let payload = encode(&sample_event(42)).unwrap();

    c.bench_function("decode_event", |b| {
        b.iter(|| black_box(decode(black_box(&payload)).unwrap()));
    });
}

/// Benchmark a full poller drain over a closed in-memory shard
fn bench_poller_drain(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("poller_drain");

    for count in [100u64, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.to_async(&rt).iter_batched(
                || {
                    let client = Arc::new(InMemoryStreamClient::new("events"));
                    for n in 0..count {
                        client.push_event("shardId-000", &sample_event(n)).unwrap();
                    }
                    client.close_shard("shardId-000");

                    ShardPoller::new(
                        "shardId-000",
                        client,
                        Arc::new(InMemoryCheckpointStore::new()),
                        Arc::new(CollectingProcessor::new()),
                        PollerConfig {
                            stream: "events".to_string(),
                            batch_limit: 100,
                            poll_interval: Duration::from_micros(1),
                            start_position: StartPosition::Earliest,
                        },
                        CancellationToken::new(),
                    )
                },
                |poller| async move { black_box(poller.run().await) },
                BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_poller_drain);
criterion_main!(benches);
