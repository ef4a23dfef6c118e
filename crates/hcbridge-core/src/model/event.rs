// ── Event records ──

use hcbridge_api::models::KeyValue;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::HaId;

/// One decoded item of a stream payload (or REST snapshot).
///
/// Produced by the normalizer, consumed once by the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub ha_id: HaId,
    /// Dot-delimited vendor key, e.g. `BSH.Common.Status.OperationState`.
    pub key: String,
    pub raw_value: Value,
    pub display_value: Option<String>,
}

impl NormalizedEvent {
    pub fn new(ha_id: HaId, key: impl Into<String>, raw_value: Value) -> Self {
        Self {
            ha_id,
            key: key.into(),
            raw_value,
            display_value: None,
        }
    }

    /// Lift a REST status/setting/option entry into the event pipeline.
    pub fn from_key_value(ha_id: HaId, kv: KeyValue) -> Self {
        Self {
            ha_id,
            key: kv.key,
            raw_value: kv.value,
            display_value: kv.display_value,
        }
    }
}

/// A resolved attribute write: stable name plus transformed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeUpdate {
    pub name: String,
    pub value: Value,
}
