//! Live attribute streaming.

use chrono::Local;
use hcbridge_core::{Appliance, ApplianceUpdate, Bridge};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;
use crate::session::Session;

use super::util;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateLine<'a> {
    ha_id: &'a str,
    attribute: &'a str,
    value: &'a serde_json::Value,
}

/// One line per update. Structured formats emit one document per line.
fn render(ha_id: &str, attribute: &str, value: &serde_json::Value, global: &GlobalOpts) -> String {
    let line = UpdateLine {
        ha_id,
        attribute,
        value,
    };
    match global.output {
        OutputFormat::Table => {
            let color = output::should_color(&global.color);
            format!(
                "{} {} {} = {}",
                output::paint_dim(&Local::now().format("%H:%M:%S").to_string(), color),
                ha_id,
                output::paint_key(attribute, color),
                output::paint_value(&output::display_value(value), color),
            )
        }
        OutputFormat::Plain => format!("{ha_id} {attribute}={}", output::display_value(value)),
        _ => output::render_json(&line, true),
    }
}

async fn targets(bridge: &Bridge, ha_ids: &[String]) -> Result<Vec<Appliance>, CliError> {
    if ha_ids.is_empty() {
        return Ok(bridge.discover().await?);
    }
    let mut found = Vec::with_capacity(ha_ids.len());
    for raw in ha_ids {
        found.push(bridge.fetch_appliance(&util::ha_id(raw)).await?);
    }
    Ok(found)
}

pub async fn handle(session: &Session, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let bridge = &session.bridge;
    let appliances = targets(bridge, &args.ha_ids).await?;
    if appliances.is_empty() {
        if !global.quiet {
            eprintln!("No appliances to watch");
        }
        return Ok(());
    }

    let persister = session.spawn_token_persister();
    let mut updates = bridge.subscribe_updates();

    for appliance in appliances {
        let ha_id = appliance.ha_id.clone();
        if let Err(e) = bridge.add_appliance(appliance).await {
            bridge.shutdown().await;
            persister.abort();
            return Err(e.into());
        }

        // Seeded state first, then live updates.
        if let Some(snapshot) = bridge.attributes(&ha_id) {
            for (name, value) in snapshot.iter() {
                output::print_output(&render(ha_id.as_str(), name, value, global), global.quiet);
            }
        }
    }
    if !global.quiet {
        eprintln!("Watching {} appliance(s), Ctrl-C to stop", bridge.appliances().len());
    }

    let result = stream_updates(&mut updates, global).await;

    bridge.shutdown().await;
    persister.abort();
    result
}

async fn stream_updates(
    updates: &mut broadcast::Receiver<ApplianceUpdate>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                debug!("interrupted, shutting down");
                return Ok(());
            }
            received = updates.recv() => match received {
                Ok(ApplianceUpdate { ha_id, update }) => {
                    output::print_output(
                        &render(ha_id.as_str(), &update.name, &update.value, global),
                        global.quiet,
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "output fell behind, updates dropped");
                }
                Err(broadcast::error::RecvError::Closed) => return Ok(()),
            },
        }
    }
}
