pub mod error;
pub mod processor;

// Re-export commonly used types
pub use error::ProcessError;
pub use processor::{CollectingProcessor, EventProcessor, LoggingProcessor};
