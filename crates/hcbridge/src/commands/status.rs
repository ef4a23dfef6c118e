//! Status and settings handlers.

use hcbridge_core::{Bridge, KeyValue};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct AttributeRow {
    #[tabled(rename = "Attribute")]
    name: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Unit")]
    unit: String,
}

#[derive(Serialize)]
struct Attribute<'a> {
    name: &'a str,
    value: &'a serde_json::Value,
}

/// Normalized attributes, read once from REST through the same mapping
/// the event stream uses.
pub async fn status(bridge: &Bridge, ha_id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let appliance = bridge.fetch_appliance(&util::ha_id(ha_id)).await?;
    let snapshot = bridge.fetch_attributes(&appliance).await?;

    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => {
            let attributes: Vec<Attribute<'_>> = snapshot
                .iter()
                .map(|(name, value)| Attribute { name, value })
                .collect();
            output::render_list(
                &global.output,
                &attributes,
                |a| AttributeRow {
                    name: output::paint_key(a.name, color),
                    value: output::paint_value(&output::display_value(a.value), color),
                },
                |a| format!("{}={}", a.name, output::display_value(a.value)),
            )
        }
        // Structured formats keep the name → value map shape.
        _ => output::render_single(&global.output, &*snapshot, |_| String::new(), |_| String::new()),
    };

    if snapshot.is_empty() && !global.quiet {
        eprintln!("No attributes reported (is the appliance offline?)");
    }
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Raw vendor settings.
pub async fn settings(bridge: &Bridge, ha_id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let settings = bridge.client().get_settings(util::ha_id(ha_id).as_str()).await?;
    let out = render_key_values(&global.output, &settings, color);
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Key/value/unit table shared by settings and program options.
pub fn render_key_values(
    format: &OutputFormat,
    entries: &[KeyValue],
    color: bool,
) -> String {
    output::render_list(
        format,
        entries,
        |kv| SettingRow {
            key: output::paint_key(&kv.key, color),
            value: kv
                .display_value
                .clone()
                .unwrap_or_else(|| output::display_value(&kv.value)),
            unit: kv.unit.clone().unwrap_or_default(),
        },
        |kv| format!("{}={}", kv.key, output::display_value(&kv.value)),
    )
}
