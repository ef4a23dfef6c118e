// ── Domain model ──
//
// Appliance identity and the event records that flow from the stream
// through the normalizer into per-appliance attribute state.

pub mod appliance;
pub mod event;

pub use appliance::{Appliance, ApplianceType, HaId};
pub use event::{AttributeUpdate, NormalizedEvent};
