pub mod cli;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use cli::CliApp;
pub use config::{AssignmentMode, Config, ConsumerSettings, StreamSettings};
pub use error::AppError;
