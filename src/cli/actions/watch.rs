use anyhow::{Context, Result};
use std::{future::Future, io::Write, time::Duration};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::{
    cli::{actions::Wiring, globals::GlobalArgs},
    guard::{AccessGuard, GuardState},
    models::Role,
};

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub role: Option<Role>,
    pub location: String,
    pub poll_interval: Duration,
}

/// Execute the watch action: keep the guard active and print every state
/// change as one JSON line until interrupted.
/// # Errors
/// Returns an error if the backend cannot be configured or output fails.
pub async fn execute(args: Args) -> Result<()> {
    let wiring = Wiring::new(&args.globals)?;
    let guard = AccessGuard::new(wiring.ports.clone(), args.role, args.location);
    // Subscribe before the first run can commit.
    let state = guard.state();
    let active = guard.activate()?;
    let poller = wiring.backend.watch_session(args.poll_interval);
    info!(poll_interval = ?args.poll_interval, "watching session");

    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {e}");
        }
        info!("interrupted, releasing guard");
    };
    let result = write_states(state, &mut std::io::stdout(), interrupted).await;

    poller.abort();
    active.deactivate().await;
    result
}

/// Writes each settled state as one JSON line until `shutdown` completes or
/// the guard is gone.
///
/// # Errors
/// Returns an error if a state cannot be encoded or written.
pub async fn write_states<W: Write>(
    mut state: watch::Receiver<GuardState>,
    out: &mut W,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let current = state.borrow_and_update().clone();
                if current.loading {
                    continue;
                }
                serde_json::to_writer(&mut *out, &current)
                    .context("failed to encode guard state")?;
                writeln!(out).context("failed to write guard state")?;
            }
            () = &mut shutdown => return Ok(()),
        }
    }
}
