use std::io;
use thiserror::Error;

use crate::codec::DecodeError;
use crate::supervisor::RunError;

/// Top-level application errors unifying all layer errors
#[derive(Error, Debug)]
pub enum AppError {
    #[error("failed to read config file {path}: {source}")]
    ConfigRead {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("assignment_mode {0} is not supported by this worker")]
    UnsupportedMode(String),

    #[error("codec error: {0}")]
    Codec(#[from] DecodeError),

    #[error("run failed: {0}")]
    Run(#[from] RunError),
}
