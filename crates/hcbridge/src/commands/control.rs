//! Program control and power handlers.

use hcbridge_core::{Bridge, Command as CoreCommand, KeyValue, PowerState};

use crate::cli::{GlobalOpts, OptionArgs, PowerArg, PowerArgs, StartArgs};
use crate::error::CliError;

use super::util;

fn done(message: &str, global: &GlobalOpts) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

pub async fn start(bridge: &Bridge, args: StartArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let options = args
        .options
        .iter()
        .map(|raw| util::parse_option(raw))
        .collect::<Result<Vec<KeyValue>, _>>()?;

    bridge
        .execute(CoreCommand::StartProgram {
            ha_id: util::ha_id(&args.ha_id),
            program: args.program,
            options,
        })
        .await?;
    done("Program started", global);
    Ok(())
}

pub async fn stop(bridge: &Bridge, ha_id: &str, global: &GlobalOpts) -> Result<(), CliError> {
    bridge
        .execute(CoreCommand::StopProgram {
            ha_id: util::ha_id(ha_id),
        })
        .await?;
    done("Program stopped", global);
    Ok(())
}

pub async fn option(bridge: &Bridge, args: OptionArgs, global: &GlobalOpts) -> Result<(), CliError> {
    bridge
        .execute(CoreCommand::SetOption {
            ha_id: util::ha_id(&args.ha_id),
            key: args.key,
            value: util::parse_value(&args.value),
        })
        .await?;
    done("Option updated", global);
    Ok(())
}

pub async fn power(bridge: &Bridge, args: PowerArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let state = match args.state {
        PowerArg::On => PowerState::On,
        PowerArg::Off => PowerState::Off,
        PowerArg::Standby => PowerState::Standby,
    };
    bridge
        .execute(CoreCommand::SetPower {
            ha_id: util::ha_id(&args.ha_id),
            state,
        })
        .await?;
    done("Power state changed", global);
    Ok(())
}
