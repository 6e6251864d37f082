pub mod error;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use error::{CheckpointError, ClientError};
pub use memory::{InMemoryCheckpointStore, InMemoryStreamClient};
pub use traits::{CheckpointStore, Record, RecordBatch, StartPosition, StreamClient};
