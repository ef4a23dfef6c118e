// ── Per-appliance attribute state ──
//
// Concurrent attribute storage with push-based change notification via
// a `watch` snapshot. Written only through the router.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::watch;

use crate::model::{AttributeUpdate, HaId};
use crate::router::ApplianceSink;

/// Sorted attribute name → value snapshot.
pub type AttributeSnapshot = Arc<BTreeMap<String, Value>>;

/// Last-known attribute values of one appliance.
pub struct AttributeState {
    ha_id: HaId,
    values: DashMap<String, Value>,
    snapshot: watch::Sender<AttributeSnapshot>,
}

impl AttributeState {
    pub fn new(ha_id: HaId) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(BTreeMap::new()));
        Self {
            ha_id,
            values: DashMap::new(),
            snapshot,
        }
    }

    pub fn ha_id(&self) -> &HaId {
        &self.ha_id
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).map(|v| v.value().clone())
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> AttributeSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<AttributeSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn rebuild_snapshot(&self) {
        let values: BTreeMap<String, Value> = self
            .values
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect();
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
    }
}

impl ApplianceSink for AttributeState {
    fn attribute(&self, name: &str) -> Option<Value> {
        self.get(name)
    }

    fn apply(&self, update: &AttributeUpdate) {
        self.values.insert(update.name.clone(), update.value.clone());
        self.rebuild_snapshot();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn update(name: &str, value: Value) -> AttributeUpdate {
        AttributeUpdate {
            name: name.into(),
            value,
        }
    }

    #[test]
    fn apply_overwrites_and_publishes() {
        let state = AttributeState::new(HaId::from("HA-1"));
        let mut rx = state.subscribe();

        state.apply(&update("doorState", json!("Open")));
        state.apply(&update("doorState", json!("Closed")));

        assert!(rx.has_changed().unwrap());
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.get("doorState"), Some(&json!("Closed")));
        assert_eq!(state.len(), 1);
        assert_eq!(state.attribute("doorState"), Some(json!("Closed")));
    }

    #[test]
    fn snapshot_is_sorted_by_name() {
        let state = AttributeState::new(HaId::from("HA-1"));
        state.apply(&update("powerState", json!("On")));
        state.apply(&update("doorState", json!("Closed")));
        let names: Vec<String> = state.snapshot().keys().cloned().collect();
        assert_eq!(names, vec!["doorState", "powerState"]);
    }
}
