//! Drives the verification machine against the collaborators.
//!
//! Flow Overview: each run takes a generation ticket, feeds fetch results into
//! [`transition`] until a terminal effect, and commits the result only if no
//! newer run has started meanwhile. An activated guard starts one run on
//! activation and one per session-change notification.

use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        watch,
    },
    task::{JoinHandle, JoinSet},
};
use tracing::{debug, error, instrument, warn};

use super::{
    config::GuardConfig,
    generation::{Generations, Ticket},
    machine::{
        DenyReason, Effect, FetchFailure, Fetched, Input, IntentAction, Machine, Phase, Redirect,
        transition,
    },
    state::GuardState,
};
use crate::{
    error::GuardError,
    models::{Profile, Role, RoleAssignment, Session, SessionEvent},
    ports::Ports,
};

/// Outcome of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Authorized,
    Resolved,
    Denied(DenyReason),
    Indeterminate,
    /// A newer run started before this one finished; nothing was committed.
    Superseded,
}

impl Verdict {
    fn from_phase(phase: Phase) -> Self {
        match phase {
            Phase::Authorized => Self::Authorized,
            Phase::Resolved => Self::Resolved,
            Phase::Denied(reason) => Self::Denied(reason),
            _ => Self::Indeterminate,
        }
    }
}

#[derive(Clone)]
pub struct AccessGuard {
    ports: Ports,
    config: Arc<GuardConfig>,
    requirement: Option<Role>,
    location: String,
    generations: Generations,
    state: Arc<watch::Sender<GuardState>>,
    active: Arc<AtomicBool>,
}

impl AccessGuard {
    /// Builds a guard for the caller at `location`. `requirement` switches the
    /// guard between gating and observational mode.
    #[must_use]
    pub fn new(ports: Ports, requirement: Option<Role>, location: impl Into<String>) -> Self {
        let (state, _) = watch::channel(GuardState::loading());
        Self {
            ports,
            config: Arc::new(GuardConfig::default()),
            requirement,
            location: location.into(),
            generations: Generations::new(),
            state: Arc::new(state),
            active: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: GuardConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    /// Live view of the guard state.
    #[must_use]
    pub fn state(&self) -> watch::Receiver<GuardState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn snapshot(&self) -> GuardState {
        self.state.borrow().clone()
    }

    /// Runs the protocol once, superseding any run still in flight.
    pub async fn verify(&self) -> Verdict {
        let ticket = self.generations.begin();
        self.run(ticket).await
    }

    /// Subscribes to session changes and runs the protocol now and on every
    /// notification until the returned handle is deactivated or dropped.
    ///
    /// A guard and its clones hold at most one subscription at a time.
    ///
    /// # Errors
    /// Returns [`GuardError::AlreadyActive`] while an earlier activation of
    /// this guard is still live.
    pub fn activate(self) -> Result<ActiveGuard, GuardError> {
        if self.active.swap(true, Ordering::SeqCst) {
            warn!("guard already active, keeping the existing subscription");
            return Err(GuardError::AlreadyActive);
        }
        let events = self.ports.sessions.subscribe();
        let listener = tokio::spawn(listen(self.clone(), events));
        Ok(ActiveGuard {
            guard: self,
            listener,
        })
    }

    #[instrument(skip_all, fields(run = ticket.number(), requirement = ?self.requirement, location = %self.location))]
    async fn run(&self, ticket: Ticket) -> Verdict {
        let mut machine = Machine::new(
            self.requirement,
            self.location.clone(),
            Arc::clone(&self.config),
        );
        let mut input = Input::Start;

        loop {
            let (next, effect) = transition(machine, input);
            machine = next;
            debug!(phase = ?machine.phase(), "guard transition");

            input = match effect {
                Effect::FetchSession => Input::SessionLoaded(self.fetch_session().await),
                Effect::Verify => Input::Proceed,
                Effect::FetchProfile(identity_id) => {
                    Input::ProfileLoaded(self.fetch_profile(&identity_id).await)
                }
                Effect::FetchRole(identity_id) => {
                    Input::RoleLoaded(self.fetch_role(&identity_id).await)
                }
                Effect::Redirect(redirect) => {
                    return self.redirect(&ticket, &machine, redirect).await;
                }
                Effect::Settle => {
                    if !self.commit(&ticket, machine.state()) {
                        return Verdict::Superseded;
                    }
                    return Verdict::from_phase(machine.phase());
                }
                Effect::Abandon => {
                    // Commit only what this run confirmed.
                    if !self.commit(&ticket, machine.state()) {
                        return Verdict::Superseded;
                    }
                    error!("guard run ended without a verdict");
                    return Verdict::Indeterminate;
                }
            };

            if !ticket.is_current() {
                debug!("guard run superseded");
                return Verdict::Superseded;
            }
        }
    }

    /// Publishes `state` unless a newer run has started.
    fn commit(&self, ticket: &Ticket, state: &GuardState) -> bool {
        self.state.send_if_modified(|current| {
            if ticket.is_current() {
                *current = state.clone();
                true
            } else {
                false
            }
        })
    }

    async fn redirect(&self, ticket: &Ticket, machine: &Machine, redirect: Redirect) -> Verdict {
        if !ticket.is_current() {
            return Verdict::Superseded;
        }

        match &redirect.intent {
            Some(IntentAction::Store(path)) => {
                if let Err(e) = self.ports.intent.save(path).await {
                    warn!("Failed to store pending intent: {e}");
                }
            }
            Some(IntentAction::Clear) => {
                if let Err(e) = self.ports.intent.clear().await {
                    warn!("Failed to clear pending intent: {e}");
                }
            }
            None => {}
        }

        if !self.commit(ticket, machine.state()) {
            return Verdict::Superseded;
        }

        debug!(reason = ?redirect.reason, target = %redirect.target, "guard redirect");
        self.ports.notifier.show(&redirect.message, redirect.kind);
        self.ports.navigator.go_to(&redirect.target);

        Verdict::from_phase(machine.phase())
    }

    async fn fetch_session(&self) -> Fetched<Option<Session>> {
        self.ports.sessions.current_session().await.map_err(|e| {
            error!("Error fetching session: {e}");
            FetchFailure(e.to_string())
        })
    }

    async fn fetch_profile(&self, identity_id: &str) -> Fetched<Option<Profile>> {
        self.ports.profiles.profile(identity_id).await.map_err(|e| {
            warn!("Error fetching profile, treating it as incomplete: {e}");
            FetchFailure(e.to_string())
        })
    }

    async fn fetch_role(&self, identity_id: &str) -> Fetched<Option<RoleAssignment>> {
        self.ports.roles.role(identity_id).await.map_err(|e| {
            error!("Error fetching role: {e}");
            FetchFailure(e.to_string())
        })
    }
}

async fn listen(guard: AccessGuard, mut events: broadcast::Receiver<SessionEvent>) {
    let mut runs = JoinSet::new();
    spawn_run(&guard, &mut runs, SessionEvent::InitialSession);

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => spawn_run(&guard, &mut runs, event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Missed {skipped} session events, re-checking access");
                    spawn_run(&guard, &mut runs, SessionEvent::UserUpdated);
                }
                Err(RecvError::Closed) => {
                    debug!("session provider closed its change stream");
                    break;
                }
            },
            Some(_) = runs.join_next(), if !runs.is_empty() => {}
        }
    }

    while runs.join_next().await.is_some() {}
}

fn spawn_run(guard: &AccessGuard, runs: &mut JoinSet<Verdict>, event: SessionEvent) {
    // The ticket is taken here so the newest notification always holds the
    // newest generation, whatever order the tasks get polled in.
    let ticket = guard.generations.begin();
    debug!(?event, run = ticket.number(), "session change, re-checking access");
    let guard = guard.clone();
    runs.spawn(async move { guard.run(ticket).await });
}

/// Handle of an activated guard. Dropping it releases the subscription.
pub struct ActiveGuard {
    guard: AccessGuard,
    listener: JoinHandle<()>,
}

impl ActiveGuard {
    #[must_use]
    pub fn state(&self) -> watch::Receiver<GuardState> {
        self.guard.state()
    }

    #[must_use]
    pub fn snapshot(&self) -> GuardState {
        self.guard.snapshot()
    }

    /// Waits until the first run has settled and returns that state.
    pub async fn settled(&self) -> GuardState {
        let mut state = self.guard.state();
        match state.wait_for(|state| !state.loading).await {
            Ok(settled) => settled.clone(),
            Err(_) => self.guard.snapshot(),
        }
    }

    /// Stops listening and waits until the subscription is released.
    pub async fn deactivate(mut self) {
        self.listener.abort();
        let _ = (&mut self.listener).await;
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.listener.abort();
        self.guard.active.store(false, Ordering::SeqCst);
    }
}
