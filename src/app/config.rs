use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::error::AppError;
use crate::client::StartPosition;
use crate::domain::Assignment;
use crate::poller::PollerConfig;

/// How shards are mapped to workers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMode {
    /// A fixed, externally specified shard list (the only mode this
    /// worker runs)
    Manual,
    /// Lease-based rebalancing handled by an external coordinator
    Automatic,
}

/// Connection settings for the stream service
#[derive(Debug, Clone, Deserialize)]
pub struct StreamSettings {
    pub region: String,
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub stream_name: String,
}

/// Consumer-side settings
#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerSettings {
    pub assignment_mode: AssignmentMode,
    /// Used only for logging and labeling, never for coordination
    pub worker_id: String,
    #[serde(default)]
    pub assigned_shards: Vec<String>,
    pub max_records: usize,
    pub poll_interval_ms: u64,
    #[serde(default = "default_start_position")]
    pub start_position: StartPosition,
}

fn default_start_position() -> StartPosition {
    StartPosition::Earliest
}

/// Application configuration, loaded once at startup
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub stream: StreamSettings,
    pub consumer: ConsumerSettings,
}

impl Config {
    /// Load from the path named by `CONFIG_FILE`, falling back to
    /// `config.json` in the working directory
    pub fn load() -> Result<Self, AppError> {
        let path =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.json".to_string());
        Self::from_file(path)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| AppError::ConfigRead {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Poller settings shared by every shard task in a run
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            stream: self.stream.stream_name.clone(),
            batch_limit: self.consumer.max_records,
            poll_interval: Duration::from_millis(self.consumer.poll_interval_ms),
            start_position: self.consumer.start_position,
        }
    }

    /// The shard assignment this worker was configured with
    pub fn assignment(&self) -> Assignment {
        Assignment::new(
            &self.consumer.worker_id,
            self.consumer.assigned_shards.iter().cloned(),
        )
    }
}
