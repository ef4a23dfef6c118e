// Per-appliance attribute map: resolves normalized events to attribute
// writes, including the stale remaining-time filter.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

use super::tables::{self, AttributeSpec};
use crate::model::{ApplianceType, AttributeUpdate, NormalizedEvent};

/// Operation states in which a zero remaining time is believable.
const IDLE_OPERATION_STATES: &[&str] = &["Finished", "Inactive", "Ready", "Error", "Aborting"];

const OPERATION_STATE_ATTR: &str = "operationState";
const POWER_STATE_ATTR: &str = "powerState";
const PROGRESS_ATTR: &str = "programProgress";

/// Outcome of resolving one event against an appliance's map.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Update(AttributeUpdate),
    /// Known key, but the value was filtered out.
    Suppressed,
    /// The key is not in this appliance type's table.
    Unknown,
}

/// Lookup table for one appliance type.
///
/// Built once per registered appliance.
#[derive(Debug, Clone)]
pub struct AttributeMap {
    kind: ApplianceType,
    by_key: HashMap<&'static str, AttributeSpec>,
}

impl AttributeMap {
    pub fn for_type(kind: ApplianceType) -> Self {
        let by_key = tables::COMMON
            .iter()
            .chain(tables::rows_for(kind).into_iter().flatten())
            .map(|spec| (spec.key, *spec))
            .collect();
        Self { kind, by_key }
    }

    pub fn kind(&self) -> ApplianceType {
        self.kind
    }

    pub fn get(&self, key: &str) -> Option<&AttributeSpec> {
        self.by_key.get(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Map `event` to an attribute write.
    ///
    /// `current` reads the appliance's last-known attribute values; it is
    /// consulted to decide whether a zero remaining time is plausible.
    pub fn resolve<F>(&self, event: &NormalizedEvent, current: F) -> Resolution
    where
        F: Fn(&str) -> Option<Value>,
    {
        let Some(spec) = self.by_key.get(event.key.as_str()) else {
            return Resolution::Unknown;
        };

        if spec.key == tables::REMAINING_PROGRAM_TIME
            && is_zero(&event.raw_value)
            && !zero_remaining_time_plausible(&current)
        {
            debug!(ha_id = %event.ha_id, "suppressing stale zero remaining time");
            return Resolution::Suppressed;
        }

        Resolution::Update(AttributeUpdate {
            name: spec.name.to_owned(),
            value: spec.transform.apply(&event.raw_value),
        })
    }
}

fn is_zero(value: &Value) -> bool {
    value.as_f64().is_some_and(|f| f.abs() < f64::EPSILON)
}

/// A zero is only accepted once the cycle is over, progress says done,
/// or the appliance is off. Unknown state counts as mid-cycle.
fn zero_remaining_time_plausible<F>(current: &F) -> bool
where
    F: Fn(&str) -> Option<Value>,
{
    let idle = current(OPERATION_STATE_ATTR)
        .as_ref()
        .and_then(Value::as_str)
        .is_some_and(|state| IDLE_OPERATION_STATES.contains(&state));
    let done = current(PROGRESS_ATTR)
        .as_ref()
        .and_then(Value::as_f64)
        .is_some_and(|p| p >= 100.0);
    let off = current(POWER_STATE_ATTR)
        .as_ref()
        .and_then(Value::as_str)
        .is_some_and(|p| p == "Off");
    idle || done || off
}
