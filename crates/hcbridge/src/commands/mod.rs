//! Command dispatch: bridges CLI args -> core Commands -> output formatting.

pub mod appliances;
pub mod auth;
pub mod config_cmd;
pub mod control;
pub mod programs;
pub mod status;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;
use crate::session::Session;

/// Dispatch a cloud-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let bridge = &session.bridge;
    match cmd {
        Command::Appliances(args) => appliances::handle(bridge, args, global).await,
        Command::Status(args) => status::status(bridge, &args.ha_id, global).await,
        Command::Settings(args) => status::settings(bridge, &args.ha_id, global).await,
        Command::Programs(args) => programs::handle(bridge, args, global).await,
        Command::Start(args) => control::start(bridge, args, global).await,
        Command::Stop(args) => control::stop(bridge, &args.ha_id, global).await,
        Command::Option(args) => control::option(bridge, args, global).await,
        Command::Power(args) => control::power(bridge, args, global).await,
        Command::Watch(args) => watch::handle(session, args, global).await,
        // Config, Completions and Auth are handled before dispatch
        Command::Config(_) | Command::Completions(_) | Command::Auth(_) => Ok(()),
    }
}
