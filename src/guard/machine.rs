//! Pure decision logic of a single guard run.
//!
//! The driver in [`super::runner`] performs the fetches and side effects; this
//! module only maps `(machine, input)` to `(machine, effect)`. Steps are
//! strictly ordered and the first failing step ends the run.

use serde::Serialize;
use std::sync::Arc;

use super::{config::GuardConfig, state::GuardState};
use crate::models::{NoticeKind, Profile, Role, RoleAssignment, Session};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    Unauthenticated,
    Unverified,
    IncompleteProfile,
    RoleMismatch,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Init,
    CheckingSession,
    CheckingVerification,
    CheckingProfile,
    CheckingRole,
    /// Gating run whose every check passed.
    Authorized,
    /// Observational run that finished without blocking.
    Resolved,
    Denied(DenyReason),
    /// A fetch failed in a way that leaves no verdict.
    Indeterminate,
}

impl Phase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Authorized | Self::Resolved | Self::Denied(_) | Self::Indeterminate
        )
    }
}

/// What happens to the pending-intent slot when a run redirects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntentAction {
    Store(String),
    Clear,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirect {
    pub reason: DenyReason,
    pub target: String,
    pub message: String,
    pub kind: NoticeKind,
    pub intent: Option<IntentAction>,
}

/// A collaborator failure as seen by the machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchFailure(pub String);

pub type Fetched<T> = Result<T, FetchFailure>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Input {
    Start,
    SessionLoaded(Fetched<Option<Session>>),
    /// Continue after a step that needs no I/O.
    Proceed,
    ProfileLoaded(Fetched<Option<Profile>>),
    RoleLoaded(Fetched<Option<RoleAssignment>>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    FetchSession,
    Verify,
    FetchProfile(String),
    FetchRole(String),
    /// Terminal: commit the state, then apply the redirect.
    Redirect(Redirect),
    /// Terminal: commit the state, no side effect.
    Settle,
    /// Terminal: stop loading, keep whatever state was visible before.
    Abandon,
}

#[derive(Clone, Debug)]
pub struct Machine {
    phase: Phase,
    requirement: Option<Role>,
    location: String,
    config: Arc<GuardConfig>,
    state: GuardState,
}

impl Machine {
    #[must_use]
    pub fn new(
        requirement: Option<Role>,
        location: impl Into<String>,
        config: Arc<GuardConfig>,
    ) -> Self {
        Self {
            phase: Phase::Init,
            requirement,
            location: location.into(),
            config,
            state: GuardState::loading(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Working state of this run. Only meaningful to commit once terminal.
    #[must_use]
    pub fn state(&self) -> &GuardState {
        &self.state
    }

    fn enter(mut self, phase: Phase) -> Self {
        self.phase = phase;
        if phase.is_terminal() {
            self.state.loading = false;
        }
        self
    }

    fn identity(&self) -> String {
        self.state.identity_id.clone().unwrap_or_default()
    }

    fn finish(self) -> (Self, Effect) {
        let phase = if self.requirement.is_some() {
            Phase::Authorized
        } else {
            Phase::Resolved
        };
        (self.enter(phase), Effect::Settle)
    }

    fn deny(self, reason: DenyReason) -> (Self, Effect) {
        let location = self.location.clone();
        let (target, message, kind, intent) = match reason {
            DenyReason::Unauthenticated => (
                self.config.entry_route().to_string(),
                "Please sign in to access this portal".to_string(),
                NoticeKind::Error,
                Some(IntentAction::Store(location)),
            ),
            DenyReason::Unverified => (
                self.config.verify_email_route().to_string(),
                "Please verify your email address".to_string(),
                NoticeKind::Info,
                None,
            ),
            DenyReason::IncompleteProfile => (
                self.config.complete_profile_route().to_string(),
                "Please complete your profile".to_string(),
                NoticeKind::Info,
                Some(IntentAction::Store(location)),
            ),
            DenyReason::RoleMismatch => (
                self.config.entry_route().to_string(),
                format!(
                    "You need a {} account to access this portal",
                    self.requirement
                        .map_or_else(String::new, |role| role.to_string())
                ),
                NoticeKind::Error,
                Some(IntentAction::Clear),
            ),
        };

        let redirect = Redirect {
            reason,
            target,
            message,
            kind,
            intent,
        };
        (self.enter(Phase::Denied(reason)), Effect::Redirect(redirect))
    }
}

/// Advances a run by one step.
#[must_use]
pub fn transition(machine: Machine, input: Input) -> (Machine, Effect) {
    let gating = machine.requirement.is_some();

    match (machine.phase, input) {
        (Phase::Init, Input::Start) => (machine.enter(Phase::CheckingSession), Effect::FetchSession),

        (Phase::CheckingSession, Input::SessionLoaded(Err(_))) => {
            (machine.enter(Phase::Indeterminate), Effect::Abandon)
        }

        (Phase::CheckingSession, Input::SessionLoaded(Ok(None))) => {
            let mut machine = machine;
            machine.state = GuardState::signed_out();
            if gating {
                machine.deny(DenyReason::Unauthenticated)
            } else {
                (machine.enter(Phase::Resolved), Effect::Settle)
            }
        }

        (Phase::CheckingSession, Input::SessionLoaded(Ok(Some(session)))) => {
            let mut machine = machine;
            machine.state.is_authenticated = true;
            machine.state.is_email_verified = session.is_email_verified();
            machine.state.identity_id = Some(session.identity_id);
            (machine.enter(Phase::CheckingVerification), Effect::Verify)
        }

        (Phase::CheckingVerification, Input::Proceed) => {
            if gating && !machine.state.is_email_verified {
                machine.deny(DenyReason::Unverified)
            } else {
                let identity = machine.identity();
                (
                    machine.enter(Phase::CheckingProfile),
                    Effect::FetchProfile(identity),
                )
            }
        }

        (Phase::CheckingProfile, Input::ProfileLoaded(result)) => {
            let mut machine = machine;
            // An unreadable profile counts as incomplete but never blocks.
            let readable = result.is_ok();
            machine.state.is_profile_complete = result
                .ok()
                .flatten()
                .as_ref()
                .is_some_and(Profile::is_complete);
            if gating && readable && !machine.state.is_profile_complete {
                machine.deny(DenyReason::IncompleteProfile)
            } else {
                let identity = machine.identity();
                (machine.enter(Phase::CheckingRole), Effect::FetchRole(identity))
            }
        }

        (Phase::CheckingRole, Input::RoleLoaded(Err(_))) => {
            (machine.enter(Phase::Indeterminate), Effect::Abandon)
        }

        (Phase::CheckingRole, Input::RoleLoaded(Ok(assignment))) => {
            let mut machine = machine;
            machine.state.role = assignment.map(|assignment| assignment.role);
            match machine.requirement {
                Some(required) if machine.state.role != Some(required) => {
                    machine.deny(DenyReason::RoleMismatch)
                }
                _ => machine.finish(),
            }
        }

        // Inputs out of order leave nothing to decide on.
        _ => (machine.enter(Phase::Indeterminate), Effect::Abandon),
    }
}
