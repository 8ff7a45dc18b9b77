//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to the action for the chosen subcommand.

use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use secrecy::SecretString;
use std::time::Duration;

use crate::{
    cli::{
        actions::{Action, check, flows, watch},
        commands::{self, backend},
        globals::GlobalArgs,
    },
    models::Role,
};

fn globals(matches: &ArgMatches) -> Result<GlobalArgs> {
    let opts = backend::Options::parse(matches)?;

    let mut globals = GlobalArgs::new(opts.url, SecretString::from(opts.api_key));
    if let Some(token) = opts.access_token {
        globals.set_access_token(SecretString::from(token));
    }
    globals.intent_file = opts.intent_file;
    globals.request_timeout = Duration::from_secs(opts.timeout_seconds);

    Ok(globals)
}

fn role(matches: &ArgMatches) -> Result<Option<Role>> {
    matches
        .get_one::<String>(commands::ARG_ROLE)
        .map(|role| role.parse::<Role>())
        .transpose()
        .map_err(|e| anyhow!(e))
}

fn location(matches: &ArgMatches, role: Option<Role>) -> String {
    matches
        .get_one::<String>(commands::ARG_PATH)
        .cloned()
        .unwrap_or_else(|| check::default_location(role))
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let globals = globals(matches)?;

    match matches.subcommand() {
        Some((commands::CMD_CHECK, sub)) => {
            let role = role(sub)?;
            Ok(Action::Check(check::Args {
                globals,
                role,
                location: location(sub, role),
            }))
        }
        Some((commands::CMD_WATCH, sub)) => {
            let role = role(sub)?;
            let poll_seconds = sub
                .get_one::<u64>(commands::ARG_POLL_INTERVAL)
                .copied()
                .unwrap_or(30);
            Ok(Action::Watch(watch::Args {
                globals,
                role,
                location: location(sub, role),
                poll_interval: Duration::from_secs(poll_seconds),
            }))
        }
        Some((commands::CMD_VERIFY_COMPLETE, _)) => {
            Ok(Action::VerifyComplete(flows::VerifyArgs { globals }))
        }
        Some((commands::CMD_SELECT_ROLE, sub)) => {
            let role = role(sub)?.context("missing required argument: <ROLE>")?;
            Ok(Action::SelectRole(flows::SelectRoleArgs { globals, role }))
        }
        _ => Err(anyhow!("unknown subcommand")),
    }
}
