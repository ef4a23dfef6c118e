//! Shared helpers for command handlers.

use hcbridge_core::{HaId, KeyValue};
use serde_json::Value;

use crate::error::CliError;

/// Parse a command-line value: JSON when it parses, otherwise a bare string.
///
/// `true`, `42` and `"x"` become JSON values; `Dishwasher.Program.Eco50`
/// stays a string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Parse a `key=value` program option.
pub fn parse_option(raw: &str) -> Result<KeyValue, CliError> {
    let (key, value) = raw.split_once('=').ok_or_else(|| CliError::Validation {
        field: "option".into(),
        reason: format!("expected KEY=VALUE, got '{raw}'"),
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::Validation {
            field: "option".into(),
            reason: format!("missing key in '{raw}'"),
        });
    }
    Ok(KeyValue::new(key, parse_value(value.trim())))
}

pub fn ha_id(raw: &str) -> HaId {
    HaId::from(raw.trim())
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_prefer_json() {
        assert_eq!(parse_value("true"), json!(true));
        assert_eq!(parse_value("1200"), json!(1200));
        assert_eq!(parse_value("\"quoted\""), json!("quoted"));
        assert_eq!(
            parse_value("LaundryCare.Washer.EnumType.Temperature.GC40"),
            json!("LaundryCare.Washer.EnumType.Temperature.GC40")
        );
    }

    #[test]
    fn options_split_on_first_equals() {
        let kv = parse_option("BSH.Common.Option.StartInRelative=3600").unwrap();
        assert_eq!(kv.key, "BSH.Common.Option.StartInRelative");
        assert_eq!(kv.value, json!(3600));

        let kv = parse_option("k=a=b").unwrap();
        assert_eq!(kv.value, json!("a=b"));
    }

    #[test]
    fn malformed_options_are_usage_errors() {
        assert!(matches!(
            parse_option("no-equals"),
            Err(CliError::Validation { .. })
        ));
        assert!(matches!(
            parse_option("=5"),
            Err(CliError::Validation { .. })
        ));
    }
}
