// Wire types for the appliance REST API.
//
// Every response body is wrapped as `{"data": {...}}`; list endpoints nest
// the collection one level deeper (`{"data": {"status": [...]}}`). Values
// are loosely typed (strings, numbers, booleans, dotted enum strings), so
// they stay as `serde_json::Value` at this layer.

use serde::{Deserialize, Serialize};

/// `{"data": T}` envelope.
#[derive(Debug, Deserialize, Serialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// A paired appliance as reported by `GET /api/homeappliances`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeAppliance {
    #[serde(rename = "haId")]
    pub ha_id: String,
    pub name: String,
    /// Vendor type string (`"Dishwasher"`, `"FridgeFreezer"`, ...).
    #[serde(rename = "type")]
    pub appliance_type: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub vib: Option<String>,
    #[serde(default)]
    pub enumber: Option<String>,
    #[serde(default)]
    pub connected: bool,
}

/// A single status/setting/option entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    pub value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(
        default,
        rename = "displayvalue",
        skip_serializing_if = "Option::is_none"
    )]
    pub display_value: Option<String>,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            unit: None,
            display_value: None,
        }
    }
}

/// An entry of `GET .../programs/available`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramDefinition {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub constraints: Option<ProgramConstraints>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramConstraints {
    /// `selectonly`, `startonly` or `selectandstart`.
    #[serde(default)]
    pub execution: Option<String>,
}

/// The active or selected program with its options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub key: String,
    #[serde(default)]
    pub options: Vec<KeyValue>,
}

/// Appliance power state as accepted by `BSH.Common.Setting.PowerState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
    Standby,
}

impl PowerState {
    pub const SETTING_KEY: &'static str = "BSH.Common.Setting.PowerState";

    /// Fully qualified vendor enum value.
    pub fn vendor_value(self) -> &'static str {
        match self {
            Self::On => "BSH.Common.EnumType.PowerState.On",
            Self::Off => "BSH.Common.EnumType.PowerState.Off",
            Self::Standby => "BSH.Common.EnumType.PowerState.Standby",
        }
    }
}

// ── List payloads ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct ApplianceList {
    pub homeappliances: Vec<HomeAppliance>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusList {
    pub status: Vec<KeyValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SettingList {
    pub settings: Vec<KeyValue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProgramList {
    pub programs: Vec<ProgramDefinition>,
}

// ── Error body ───────────────────────────────────────────────────────

/// `{"error": {"key": "...", "description": "..."}}`
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorDetail {
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
}
