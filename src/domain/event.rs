use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single data event as carried on the stream.
///
/// Events are immutable once constructed. The producer side writes them
/// as JSON payloads; the consumer decodes them via [`crate::codec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub action: String,
    pub value: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}
