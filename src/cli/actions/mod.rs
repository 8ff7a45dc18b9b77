pub mod check;
pub mod flows;
pub mod watch;

mod run;
mod wiring;

pub use wiring::Wiring;

#[derive(Debug)]
pub enum Action {
    Check(check::Args),
    Watch(watch::Args),
    VerifyComplete(flows::VerifyArgs),
    SelectRole(flows::SelectRoleArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
