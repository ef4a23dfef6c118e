// ── Event routing ──
//
// Dispatches normalized events to the sink registered for their haId.
// Each registration carries its appliance type's attribute map, resolved
// once when the appliance is registered.

use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{ApplianceType, AttributeUpdate, HaId, NormalizedEvent};
use crate::normalize::{AttributeMap, Resolution};

/// Capability every appliance state holder implements.
pub trait ApplianceSink: Send + Sync {
    /// Last-known value of an attribute.
    fn attribute(&self, name: &str) -> Option<Value>;

    /// Write an attribute.
    fn apply(&self, update: &AttributeUpdate);
}

/// What `route` did with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Applied(AttributeUpdate),
    /// Known key, value filtered (stale zero remaining time).
    Suppressed,
    /// Key not in the appliance's table.
    UnknownKey,
    /// No appliance registered under the event's haId.
    Unregistered,
}

struct Registration {
    sink: Arc<dyn ApplianceSink>,
    map: AttributeMap,
}

/// haId → sink dispatcher.
#[derive(Default)]
pub struct Router {
    sinks: DashMap<HaId, Registration>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the sink for `ha_id`.
    pub fn register(&self, ha_id: HaId, kind: ApplianceType, sink: Arc<dyn ApplianceSink>) {
        let map = AttributeMap::for_type(kind);
        debug!(%ha_id, %kind, attributes = map.len(), "registering appliance");
        self.sinks.insert(ha_id, Registration { sink, map });
    }

    /// Returns `true` if a sink was registered.
    pub fn unregister(&self, ha_id: &HaId) -> bool {
        self.sinks.remove(ha_id).is_some()
    }

    pub fn is_registered(&self, ha_id: &HaId) -> bool {
        self.sinks.contains_key(ha_id)
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Apply `event` to the sink owning its haId.
    pub fn route(&self, event: &NormalizedEvent) -> RouteOutcome {
        let Some(reg) = self.sinks.get(&event.ha_id) else {
            warn!(ha_id = %event.ha_id, key = %event.key, "event for unregistered appliance dropped");
            return RouteOutcome::Unregistered;
        };

        match reg.map.resolve(event, |name| reg.sink.attribute(name)) {
            Resolution::Update(update) => {
                reg.sink.apply(&update);
                RouteOutcome::Applied(update)
            }
            Resolution::Suppressed => RouteOutcome::Suppressed,
            Resolution::Unknown => {
                debug!(
                    ha_id = %event.ha_id,
                    key = %event.key,
                    kind = %reg.map.kind(),
                    "unmapped event key dropped"
                );
                RouteOutcome::UnknownKey
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AttributeState;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const HA: &str = "BOSCH-WAT28400-68A40E000001";

    fn setup() -> (Router, Arc<AttributeState>) {
        let router = Router::new();
        let state = Arc::new(AttributeState::new(HaId::from(HA)));
        router.register(
            HaId::from(HA),
            ApplianceType::Washer,
            Arc::clone(&state) as Arc<dyn ApplianceSink>,
        );
        (router, state)
    }

    fn event(key: &str, value: serde_json::Value) -> NormalizedEvent {
        NormalizedEvent::new(HaId::from(HA), key, value)
    }

    #[test]
    fn known_key_is_applied() {
        let (router, state) = setup();
        let outcome = router.route(&event(
            "BSH.Common.Status.DoorState",
            json!("BSH.Common.EnumType.DoorState.Locked"),
        ));
        assert_eq!(
            outcome,
            RouteOutcome::Applied(AttributeUpdate {
                name: "doorState".into(),
                value: json!("Locked"),
            })
        );
        assert_eq!(state.get("doorState"), Some(json!("Locked")));
    }

    #[test]
    fn unknown_key_leaves_state_untouched() {
        let (router, state) = setup();
        router.route(&event("BSH.Common.Setting.PowerState", json!("BSH.Common.EnumType.PowerState.On")));
        let before = state.snapshot();

        let outcome = router.route(&event("Vendor.Brand.New.Key", json!(7)));
        assert_eq!(outcome, RouteOutcome::UnknownKey);
        assert_eq!(state.snapshot(), before);
    }

    #[test]
    fn events_for_unregistered_appliances_are_dropped() {
        let (router, _state) = setup();
        let stray = NormalizedEvent::new(HaId::from("OTHER"), "BSH.Common.Status.DoorState", json!("x.Open"));
        assert_eq!(router.route(&stray), RouteOutcome::Unregistered);

        assert!(router.unregister(&HaId::from(HA)));
        assert!(!router.unregister(&HaId::from(HA)));
        assert_eq!(
            router.route(&event("BSH.Common.Status.DoorState", json!("x.Open"))),
            RouteOutcome::Unregistered
        );
    }

    #[test]
    fn stale_zero_remaining_time_uses_routed_state() {
        let (router, state) = setup();
        for (key, value) in [
            ("BSH.Common.Status.OperationState", json!("BSH.Common.EnumType.OperationState.Run")),
            ("BSH.Common.Setting.PowerState", json!("BSH.Common.EnumType.PowerState.On")),
            ("BSH.Common.Option.ProgramProgress", json!(45)),
            ("BSH.Common.Option.RemainingProgramTime", json!(1800)),
        ] {
            router.route(&event(key, value));
        }

        let zero = event("BSH.Common.Option.RemainingProgramTime", json!(0));
        assert_eq!(router.route(&zero), RouteOutcome::Suppressed);
        assert_eq!(state.get("remainingProgramTime"), Some(json!("00:30")));

        router.route(&event("BSH.Common.Option.ProgramProgress", json!(100)));
        assert!(matches!(router.route(&zero), RouteOutcome::Applied(_)));
        assert_eq!(state.get("remainingProgramTime"), Some(json!("00:00")));
    }
}
