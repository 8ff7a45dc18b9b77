use anyhow::{Result, bail};
use serde::Serialize;
use tracing::info;

use crate::{
    cli::{actions::Wiring, globals::GlobalArgs},
    guard::{AccessGuard, GuardState, Verdict},
    models::Role,
};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub role: Option<Role>,
    pub location: String,
}

/// Printed on stdout after a single run.
#[derive(Debug, Serialize)]
pub struct Report {
    pub verdict: Verdict,
    pub state: GuardState,
    pub redirect: Option<String>,
}

/// Path a guard protects when none is given on the command line.
#[must_use]
pub fn default_location(role: Option<Role>) -> String {
    role.map_or_else(|| "/".to_string(), Role::portal_path)
}

/// Execute the check action.
/// # Errors
/// Returns an error if the backend cannot be reached, or if the caller may not
/// proceed (denied or indeterminate).
pub async fn execute(args: Args) -> Result<()> {
    let wiring = Wiring::new(&args.globals)?;
    let guard = AccessGuard::new(wiring.ports.clone(), args.role, args.location);

    let verdict = guard.verify().await;
    info!(?verdict, "check finished");

    let report = Report {
        verdict,
        state: guard.snapshot(),
        redirect: wiring.navigator.last(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    match verdict {
        Verdict::Authorized | Verdict::Resolved => Ok(()),
        Verdict::Denied(reason) => bail!("access denied: {reason:?}"),
        Verdict::Indeterminate | Verdict::Superseded => {
            bail!("access could not be determined, see logs")
        }
    }
}
