use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::{
    cli::{actions::Wiring, globals::GlobalArgs},
    flows,
    guard::GuardConfig,
    models::Role,
};

#[derive(Debug)]
pub struct VerifyArgs {
    pub globals: GlobalArgs,
}

#[derive(Debug)]
pub struct SelectRoleArgs {
    pub globals: GlobalArgs,
    pub role: Role,
}

/// Execute the verify-complete action.
/// # Errors
/// Returns an error if the backend client cannot be built.
pub async fn verify_complete(args: VerifyArgs) -> Result<()> {
    let wiring = Wiring::new(&args.globals)?;
    let target = flows::complete_verification(&wiring.ports, &GuardConfig::default()).await;
    println!("{target}");
    Ok(())
}

/// Execute the select-role action for the signed-in caller.
/// # Errors
/// Returns an error if nobody is signed in or the role cannot be saved.
pub async fn select_role(args: SelectRoleArgs) -> Result<()> {
    let wiring = Wiring::new(&args.globals)?;

    let session = wiring
        .ports
        .sessions
        .current_session()
        .await
        .context("failed to load session")?
        .ok_or_else(|| anyhow!("not signed in: set --access-token"))?;

    let saved = flows::select_role(&wiring.ports, &session.identity_id, args.role)
        .await
        .context("failed to save role")?;
    info!(role = %saved.role, "role saved");

    if let Some(target) = wiring.navigator.last() {
        println!("{target}");
    }
    Ok(())
}
