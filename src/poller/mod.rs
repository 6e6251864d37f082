pub mod cursor;
pub mod error;
pub mod shard;
pub mod state;

// Re-export commonly used types
pub use cursor::ShardCursor;
pub use error::PollerError;
pub use shard::{PollerConfig, ShardPoller};
pub use state::{PollerReport, PollerState, PollerStatus, StopCause};
