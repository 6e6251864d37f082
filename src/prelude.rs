//! Prelude module for convenient imports
//!
//! Import everything you need with: `use shardpoll::prelude::*;`

// Domain types
pub use crate::domain::{Assignment, AssignmentError, Event};

// Codec
pub use crate::codec::{DecodeError, decode, encode};

// Client boundary
pub use crate::client::{
    CheckpointError, CheckpointStore, ClientError, InMemoryCheckpointStore, InMemoryStreamClient,
    Record, RecordBatch, StartPosition, StreamClient,
};

// Engine types
pub use crate::engine::{CollectingProcessor, EventProcessor, LoggingProcessor, ProcessError};

// Poller types
pub use crate::poller::{
    PollerConfig, PollerError, PollerReport, PollerState, PollerStatus, ShardCursor, ShardPoller,
    StopCause,
};

// Supervisor types
pub use crate::supervisor::{PollerFailure, RunError, RunSummary, Supervisor};

// App types
pub use crate::app::{AppError, AssignmentMode, CliApp, Config};
