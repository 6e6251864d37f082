use thiserror::Error;

/// Pre-flight assignment validation errors. Fatal: a run aborts before
/// any poller is spawned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AssignmentError {
    #[error("assigned shard {0} does not exist in stream")]
    UnknownShard(String),
}
