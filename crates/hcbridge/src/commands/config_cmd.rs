//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Password, Select};
use hcbridge_config::{Config, Profile, config_path, load_config_or_default, save_config};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const REDACTED: &str = "********";

/// Blank out plaintext secrets before printing.
fn redacted(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.client_secret.is_some() {
            profile.client_secret = Some(REDACTED.into());
        }
    }
    cfg
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => init(global),

        // ── Show: resolved config, secrets redacted ─────────────────
        ConfigCommand::Show => {
            let cfg = redacted(load_config_or_default());
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => {
                    toml::to_string_pretty(&cfg).map_err(|e| CliError::Config {
                        message: format!("failed to render config: {e}"),
                    })?
                }
                _ => output::render_single(&global.output, &cfg, |_| String::new(), |_| {
                    String::new()
                }),
            };
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string(), false);
            Ok(())
        }
    }
}

fn init(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config_path();
    eprintln!("hcbridge configuration wizard");
    eprintln!("   Config path: {}\n", path.display());

    // 1. Profile name
    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default(global.profile.clone().unwrap_or_else(|| "default".into()))
        .interact_text()
        .map_err(prompt_err)?;

    // 2. Environment
    let envs = &["Production (api.home-connect.com)", "Simulator"];
    let simulator = Select::new()
        .with_prompt("API environment")
        .items(envs)
        .default(0)
        .interact()
        .map_err(prompt_err)?
        == 1;

    // 3. OAuth application
    let client_id: String = Input::new()
        .with_prompt("Client ID")
        .interact_text()
        .map_err(prompt_err)?;
    let mut profile = Profile::new(client_id);
    profile.simulator = simulator;

    profile.redirect_uri = Input::new()
        .with_prompt("Redirect URI")
        .default(profile.redirect_uri.clone())
        .interact_text()
        .map_err(prompt_err)?;

    let secret = Password::new()
        .with_prompt("Client secret")
        .interact()
        .map_err(prompt_err)?;
    if secret.is_empty() {
        return Err(CliError::Validation {
            field: "client_secret".into(),
            reason: "client secret cannot be empty".into(),
        });
    }

    // 4. Where to keep the secret
    let store_choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let store_selection = Select::new()
        .with_prompt("Where to store the client secret?")
        .items(store_choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if store_selection == 0 {
        hcbridge_config::store_client_secret(&profile_name, &secret)?;
        eprintln!("   ✓ Client secret stored in system keyring");
    } else {
        profile.client_secret = Some(secret);
    }

    // 5. Save
    let mut cfg = load_config_or_default();
    if cfg.profiles.contains_key(&profile_name)
        && !Confirm::new()
            .with_prompt(format!("Overwrite existing profile '{profile_name}'?"))
            .default(false)
            .interact()
            .map_err(prompt_err)?
    {
        return Ok(());
    }

    let make_default = cfg.profiles.is_empty()
        || Confirm::new()
            .with_prompt("Make this the default profile?")
            .default(true)
            .interact()
            .map_err(prompt_err)?;
    if make_default {
        cfg.default_profile = Some(profile_name.clone());
    }

    cfg.profiles.insert(profile_name.clone(), profile);
    save_config(&cfg)?;

    eprintln!("\n   ✓ Profile '{profile_name}' saved to {}", path.display());
    eprintln!("   Next: hcbridge auth login --profile {profile_name}");
    Ok(())
}
