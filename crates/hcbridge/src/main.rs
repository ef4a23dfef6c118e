mod cli;
mod commands;
mod error;
mod output;
mod session;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::session::Session;

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup tracing based on verbosity
    init_tracing(cli.global.verbose);

    // Dispatch and handle errors with proper exit codes
    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need the cloud
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        // Shell completions generation
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "hcbridge", &mut std::io::stdout());
            Ok(())
        }

        // Auth builds its own session: login runs before a token exists
        Command::Auth(args) => commands::auth::handle(args, &cli.global).await,

        // Everything else needs an authorized bridge
        cmd => {
            let session = Session::open(&cli.global)?;

            tracing::debug!(command = ?cmd, profile = %session.profile, "dispatching command");
            let result = commands::dispatch(cmd, &session, &cli.global).await;

            if let Err(e) = session.persist_token() {
                tracing::warn!(error = %e, "could not persist refreshed token");
            }
            result.map_err(|e| e.for_profile(&session.profile))
        }
    }
}
