//! Navigation and notification sinks for a terminal session.
//!
//! Both write to stderr; stdout carries only command output.

use std::sync::Mutex;
use tracing::info;

use crate::{
    models::NoticeKind,
    ports::{Navigator, Notifier},
};

/// Prints each navigation and remembers the latest target.
#[derive(Debug, Default)]
pub struct TerminalNavigator {
    last: Mutex<Option<String>>,
}

impl TerminalNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.last.lock().ok().and_then(|last| last.clone())
    }
}

impl Navigator for TerminalNavigator {
    fn go_to(&self, path: &str) {
        info!(target_path = %path, "navigate");
        eprintln!("-> {path}");
        if let Ok(mut last) = self.last.lock() {
            *last = Some(path.to_string());
        }
    }
}

#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn show(&self, message: &str, kind: NoticeKind) {
        let label = match kind {
            NoticeKind::Info => "info",
            NoticeKind::Error => "error",
        };
        eprintln!("[{label}] {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigator_remembers_last_target() {
        let navigator = TerminalNavigator::new();
        assert_eq!(navigator.last(), None);

        navigator.go_to("/");
        navigator.go_to("/verify-email");
        assert_eq!(navigator.last().as_deref(), Some("/verify-email"));
    }
}
