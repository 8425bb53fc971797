use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scheduler payload. Only `time` is read; anything else the scheduler sends is ignored.
/// `time` is kept as raw JSON so a non-string value is a malformed trigger, not a
/// rejected payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerEvent {
    #[serde(default)]
    pub time: Option<Value>,
}
