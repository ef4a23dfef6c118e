//! Authorization handlers: login, status, logout.

use chrono::{DateTime, Utc};
use dialoguer::Input;
use hcbridge_api::auth::now_ms;
use hcbridge_config::load_config_or_default;
use serde::Serialize;

use crate::cli::{AuthArgs, AuthCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;
use crate::session::Session;

use super::util;

#[derive(Serialize)]
struct AuthStatus {
    profile: String,
    authorized: bool,
    expires_at: Option<DateTime<Utc>>,
    expired: bool,
}

fn detail(status: &AuthStatus, color: bool) -> String {
    let state = match (status.authorized, status.expired) {
        (false, _) => "not authorized".to_string(),
        (true, true) => "authorized (access token expired, will refresh)".to_string(),
        (true, false) => "authorized".to_string(),
    };
    output::detail_lines(
        &[
            ("Profile", status.profile.clone()),
            ("State", state),
            (
                "Expires",
                status
                    .expires_at
                    .map_or_else(|| "-".into(), |t| t.to_rfc3339()),
            ),
        ],
        color,
    )
}

pub async fn handle(args: AuthArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Login: authorization code flow ──────────────────────────
        AuthCommand::Login { callback } => {
            let session = Session::unauthorized(global)?;
            let tokens = session.bridge.tokens();
            let oauth = tokens.oauth();

            let state = oauth.new_state(now_ms())?;
            let url = oauth.authorization_url(&state)?;
            eprintln!("Open this URL in a browser and grant access:\n");
            eprintln!("  {url}\n");

            let callback = match callback {
                Some(c) => c,
                None => Input::<String>::new()
                    .with_prompt("Paste the URL you were redirected to")
                    .interact_text()
                    .map_err(util::prompt_err)?,
            };

            tokens
                .complete_callback(callback.trim())
                .await
                .map_err(|e| CliError::from(e).for_profile(&session.profile))?;
            session.persist_token()?;

            if !global.quiet {
                eprintln!("✓ Profile '{}' authorized", session.profile);
            }
            Ok(())
        }

        // ── Status: is a token stored? ──────────────────────────────
        AuthCommand::Status => {
            let cfg = load_config_or_default();
            let profile = cfg.profile_name(global.profile.as_deref());
            let token = hcbridge_config::load_token(&profile)?;

            let status = AuthStatus {
                authorized: token.is_some(),
                expires_at: token
                    .as_ref()
                    .and_then(|t| DateTime::from_timestamp_millis(t.expires_at_ms)),
                expired: token.as_ref().is_some_and(|t| t.is_expired(now_ms())),
                profile,
            };
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &status,
                |s| detail(s, color),
                |s| s.authorized.to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Logout: forget the token ────────────────────────────────
        AuthCommand::Logout => {
            let cfg = load_config_or_default();
            let profile = cfg.profile_name(global.profile.as_deref());
            if !util::confirm(
                &format!("Delete the stored token for '{profile}'?"),
                global.yes,
            )? {
                return Ok(());
            }

            let removed = hcbridge_config::delete_token(&profile)?;
            if !global.quiet {
                if removed {
                    eprintln!("Token for '{profile}' deleted");
                } else {
                    eprintln!("No token stored for '{profile}'");
                }
            }
            Ok(())
        }
    }
}
