//! Stream payload decoding and vendor-key → attribute mapping.
//!
//! [`normalize`] turns one `data:` line into [`NormalizedEvent`]s;
//! [`AttributeMap`] turns each event into an attribute write for a given
//! appliance type. Neither step ever fails: malformed payloads decode to
//! nothing and unknown keys resolve to [`Resolution::Unknown`].

mod attributes;
pub mod tables;
mod transform;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, trace};

use crate::model::{HaId, NormalizedEvent};

pub use attributes::{AttributeMap, Resolution};
pub use tables::AttributeSpec;
pub use transform::{ValueTransform, enum_suffix, format_duration};

#[derive(Debug, Deserialize)]
struct Payload {
    #[serde(default)]
    items: Vec<PayloadItem>,
}

#[derive(Debug, Deserialize)]
struct PayloadItem {
    key: String,
    #[serde(default)]
    value: Value,
    #[serde(default, rename = "displayvalue")]
    display_value: Option<String>,
}

/// Decode one stream chunk into events for `ha_id`.
///
/// Only chunks framed as `data: …` are parsed. Anything else, and any
/// payload that is not JSON with an `items` list, yields no events.
pub fn normalize(ha_id: &HaId, chunk: &str) -> Vec<NormalizedEvent> {
    let Some(body) = chunk.trim_start().strip_prefix("data:") else {
        trace!(%ha_id, "ignoring non-data chunk");
        return Vec::new();
    };
    let body = body.trim();
    if body.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Payload>(body) {
        Ok(payload) => payload
            .items
            .into_iter()
            .map(|item| NormalizedEvent {
                ha_id: ha_id.clone(),
                key: item.key,
                raw_value: item.value,
                display_value: item.display_value,
            })
            .collect(),
        Err(e) => {
            debug!(%ha_id, error = %e, "dropping malformed event payload");
            Vec::new()
        }
    }
}
