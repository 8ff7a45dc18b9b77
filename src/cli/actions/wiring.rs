use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::debug;

use crate::{
    backend::RestBackend,
    cli::{
        globals::GlobalArgs,
        terminal::{TerminalNavigator, TerminalNotifier},
    },
    intent::FileIntentStore,
    ports::Ports,
};

/// Collaborators for one CLI invocation.
pub struct Wiring {
    pub backend: RestBackend,
    pub navigator: Arc<TerminalNavigator>,
    pub ports: Ports,
}

impl Wiring {
    /// # Errors
    /// Returns an error if the backend client cannot be built.
    pub fn new(globals: &GlobalArgs) -> Result<Self> {
        debug!(?globals, "wiring collaborators");

        let backend =
            RestBackend::new(globals.backend_config()).context("invalid backend configuration")?;
        let navigator = Arc::new(TerminalNavigator::new());
        let backend_port = Arc::new(backend.clone());

        let ports = Ports {
            sessions: backend_port.clone(),
            profiles: backend_port.clone(),
            roles: backend_port,
            navigator: navigator.clone(),
            notifier: Arc::new(TerminalNotifier),
            intent: Arc::new(FileIntentStore::new(globals.intent_file.clone())),
        };

        Ok(Self {
            backend,
            navigator,
            ports,
        })
    }
}
