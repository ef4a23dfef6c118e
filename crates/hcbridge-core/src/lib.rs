//! Appliance state layer between `hcbridge-api` and hosts (CLI, hubs).
//!
//! - **[`Bridge`]**: lifecycle facade. Discovers appliances, seeds their
//!   state from REST, keeps one event stream per appliance, and runs
//!   [`Command`]s.
//!
//! - **[`normalize`]**: decodes `data:` payloads into
//!   [`NormalizedEvent`]s and maps vendor keys onto stable attribute names
//!   through per-type [`AttributeMap`]s.
//!
//! - **[`Router`]**: dispatches events to the [`ApplianceSink`] registered
//!   for their haId. [`AttributeState`] is the sink the bridge uses.

pub mod bridge;
pub mod command;
pub mod config;
pub mod error;
pub mod model;
pub mod normalize;
pub mod router;
pub mod state;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::{ApplianceUpdate, Bridge};
pub use command::{Command, CommandResult, KeyValue, PowerState};
pub use config::{BridgeConfig, DEFAULT_API_URL, SIMULATOR_API_URL};
pub use error::CoreError;
pub use model::{Appliance, ApplianceType, AttributeUpdate, HaId, NormalizedEvent};
pub use normalize::{AttributeMap, Resolution, normalize};
pub use router::{ApplianceSink, RouteOutcome, Router};
pub use state::{AttributeSnapshot, AttributeState};

pub use hcbridge_api::StreamStatus;
