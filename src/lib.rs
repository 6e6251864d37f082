//! Manual-assignment consumer core for a partitioned log stream.
//!
//! A fixed set of shards is assigned to this worker up front. The
//! supervisor validates the assignment against the live stream, runs one
//! polling task per assigned shard and joins them all under a single
//! cancellation signal. Each poller owns its shard's iterator state,
//! checkpoints progress after every processed batch and retries fetch
//! failures indefinitely at a fixed interval.
//!
//! Import the commonly used types with `use shardpoll::prelude::*;`.

pub mod app;
pub mod client;
pub mod codec;
pub mod domain;
pub mod engine;
pub mod poller;
pub mod prelude;
pub mod supervisor;
