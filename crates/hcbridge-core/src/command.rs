// ── Command API ──
//
// All appliance write operations flow through a unified `Command` enum.
// The bridge routes each variant to the matching REST call.

use serde_json::Value;

pub use hcbridge_api::models::{KeyValue, PowerState};

use crate::model::HaId;

/// All possible write operations against an appliance.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Programs ─────────────────────────────────────────────────────
    StartProgram {
        ha_id: HaId,
        program: String,
        options: Vec<KeyValue>,
    },
    StopProgram {
        ha_id: HaId,
    },
    SelectProgram {
        ha_id: HaId,
        program: String,
    },
    /// Change an option of the running program.
    SetOption {
        ha_id: HaId,
        key: String,
        value: Value,
    },

    // ── Settings ─────────────────────────────────────────────────────
    SetSetting {
        ha_id: HaId,
        key: String,
        value: Value,
    },
    SetPower {
        ha_id: HaId,
        state: PowerState,
    },
}

impl Command {
    /// The appliance this command targets.
    pub fn ha_id(&self) -> &HaId {
        match self {
            Self::StartProgram { ha_id, .. }
            | Self::StopProgram { ha_id }
            | Self::SelectProgram { ha_id, .. }
            | Self::SetOption { ha_id, .. }
            | Self::SetSetting { ha_id, .. }
            | Self::SetPower { ha_id, .. } => ha_id,
        }
    }
}

/// Result of a successfully executed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
}
