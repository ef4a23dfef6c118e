//! Appliance command handlers.

use hcbridge_api::models::HomeAppliance;
use hcbridge_core::{Appliance, Bridge};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::{AppliancesArgs, AppliancesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ────────────────────────────────────────────────────────

#[derive(Tabled)]
struct ApplianceRow {
    #[tabled(rename = "haId")]
    ha_id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Brand")]
    brand: String,
    #[tabled(rename = "Cloud")]
    connected: String,
}

/// One listing entry; `--all` includes types the bridge does not model.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Listed {
    ha_id: String,
    name: String,
    #[serde(rename = "type")]
    kind: String,
    brand: Option<String>,
    connected: bool,
    supported: bool,
}

impl From<&Appliance> for Listed {
    fn from(a: &Appliance) -> Self {
        Self {
            ha_id: a.ha_id.to_string(),
            name: a.display_name.clone(),
            kind: a.kind.to_string(),
            brand: a.brand.clone(),
            connected: a.connected,
            supported: true,
        }
    }
}

impl From<&HomeAppliance> for Listed {
    fn from(ha: &HomeAppliance) -> Self {
        let supported = Appliance::try_from(ha).is_ok();
        Self {
            ha_id: ha.ha_id.clone(),
            name: ha.name.clone(),
            kind: ha.appliance_type.clone(),
            brand: ha.brand.clone(),
            connected: ha.connected,
            supported,
        }
    }
}

fn to_row(item: &Listed, color: bool) -> ApplianceRow {
    ApplianceRow {
        ha_id: output::paint_key(&item.ha_id, color),
        name: item.name.clone(),
        kind: if item.supported {
            item.kind.clone()
        } else {
            format!("{} (unsupported)", item.kind)
        },
        brand: item.brand.clone().unwrap_or_default(),
        connected: output::paint_connected(item.connected, color),
    }
}

fn detail(a: &Appliance, color: bool) -> String {
    output::detail_lines(
        &[
            ("haId", a.ha_id.to_string()),
            ("Name", a.display_name.clone()),
            ("Type", a.kind.to_string()),
            ("Brand", a.brand.clone().unwrap_or_else(|| "-".into())),
            ("Cloud", output::paint_connected(a.connected, color)),
        ],
        color,
    )
}

// ── Handler ──────────────────────────────────────────────────────────

pub async fn handle(
    bridge: &Bridge,
    args: AppliancesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        AppliancesCommand::List { all } => {
            let listed: Vec<Listed> = if all {
                bridge
                    .client()
                    .list_appliances()
                    .await?
                    .iter()
                    .map(Listed::from)
                    .collect()
            } else {
                bridge.discover().await?.iter().map(Listed::from).collect()
            };
            let out = output::render_list(
                &global.output,
                &listed,
                |item| to_row(item, color),
                |item| item.ha_id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppliancesCommand::Show(arg) => {
            let appliance = bridge.fetch_appliance(&util::ha_id(&arg.ha_id)).await?;
            let out = output::render_single(
                &global.output,
                &appliance,
                |a| detail(a, color),
                |a| a.ha_id.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
