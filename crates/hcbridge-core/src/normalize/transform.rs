// Value transforms applied when a vendor key maps onto an attribute.

use serde_json::Value;

/// How a raw vendor value becomes an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTransform {
    /// Pass the value through unchanged.
    Identity,
    /// `Namespace.Type.Value` → `Value`.
    EnumSuffix,
    /// Seconds → zero-padded `HH:MM`.
    Duration,
}

impl ValueTransform {
    /// Apply the transform. Values of an unexpected JSON type pass through.
    pub fn apply(self, raw: &Value) -> Value {
        match self {
            Self::Identity => raw.clone(),
            Self::EnumSuffix => match raw.as_str() {
                Some(s) => Value::String(enum_suffix(s).to_owned()),
                None => raw.clone(),
            },
            Self::Duration => match seconds(raw) {
                Some(secs) => Value::String(format_duration(secs)),
                None => raw.clone(),
            },
        }
    }
}

/// Text after the final `.` of a dotted enum value.
pub fn enum_suffix(value: &str) -> &str {
    value.rsplit_once('.').map_or(value, |(_, suffix)| suffix)
}

/// `HH:MM` with sub-minute precision discarded.
pub fn format_duration(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 3600, (secs % 3600) / 60)
}

/// Non-negative whole seconds from a JSON number.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::as_conversions
)]
fn seconds(raw: &Value) -> Option<u64> {
    raw.as_u64().or_else(|| {
        raw.as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0)
            .map(|f| f.trunc() as u64)
    })
}
