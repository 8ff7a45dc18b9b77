use serde::Serialize;

use crate::models::Role;

/// Live result of a guard, re-published after every committed run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuardState {
    pub is_authenticated: bool,
    pub is_email_verified: bool,
    pub is_profile_complete: bool,
    pub role: Option<Role>,
    pub identity_id: Option<String>,
    pub loading: bool,
}

impl Default for GuardState {
    fn default() -> Self {
        Self::loading()
    }
}

impl GuardState {
    /// State of a freshly activated guard.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            is_authenticated: false,
            is_email_verified: false,
            is_profile_complete: false,
            role: None,
            identity_id: None,
            loading: true,
        }
    }

    /// Settled state for a caller without a session.
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            loading: false,
            ..Self::loading()
        }
    }

    /// Checks that no flag is set past an unmet prerequisite.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.is_authenticated
            || (!self.is_email_verified
                && !self.is_profile_complete
                && self.role.is_none()
                && self.identity_id.is_none())
    }
}
