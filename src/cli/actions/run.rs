use crate::cli::actions::{Action, check, flows, watch};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Check(args) => check::execute(args).await,
        Action::Watch(args) => watch::execute(args).await,
        Action::VerifyComplete(args) => flows::verify_complete(args).await,
        Action::SelectRole(args) => flows::select_role(args).await,
    }
}
