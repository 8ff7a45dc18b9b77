//! In-process collaborators.
//!
//! Used to embed the guard without a backend and to drive it in tests: every
//! store counts its calls and can be told to fail or to answer slowly.

use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{
        Mutex, RwLock,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::broadcast;

use crate::{
    error::StoreError,
    models::{NoticeKind, Profile, Role, RoleAssignment, Session, SessionEvent},
    ports::{Navigator, Notifier, ProfileStore, RoleStore, SessionProvider},
};

const EVENT_CAPACITY: usize = 16;

#[derive(Debug, Default)]
struct Faults {
    failure: Mutex<Option<String>>,
    latency: Mutex<Duration>,
    calls: AtomicUsize,
}

impl Faults {
    async fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = self.latency.lock().map(|l| *l).unwrap_or_default();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let failure = self.failure.lock().ok().and_then(|f| f.clone());
        match failure {
            Some(message) => Err(StoreError::Unavailable(message)),
            None => Ok(()),
        }
    }

    fn fail_with(&self, message: &str) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(message.to_string());
        }
    }

    fn recover(&self) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = None;
        }
    }

    fn set_latency(&self, latency: Duration) {
        if let Ok(mut current) = self.latency.lock() {
            *current = latency;
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct MemorySessionProvider {
    session: RwLock<Option<Session>>,
    events: broadcast::Sender<SessionEvent>,
    faults: Faults,
}

impl Default for MemorySessionProvider {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            session: RwLock::new(None),
            events,
            faults: Faults::default(),
        }
    }
}

impl MemorySessionProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session(session: Session) -> Self {
        let provider = Self::default();
        provider.replace(Some(session));
        provider
    }

    fn replace(&self, session: Option<Session>) {
        if let Ok(mut current) = self.session.write() {
            *current = session;
        }
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    pub fn sign_in(&self, session: Session) {
        self.replace(Some(session));
        self.emit(SessionEvent::SignedIn);
    }

    pub fn sign_out(&self) {
        self.replace(None);
        self.emit(SessionEvent::SignedOut);
    }

    /// Replaces the session (e.g. after email verification).
    pub fn update(&self, session: Session) {
        self.replace(Some(session));
        self.emit(SessionEvent::UserUpdated);
    }

    pub fn refresh_token(&self) {
        self.emit(SessionEvent::TokenRefreshed);
    }

    pub fn fail_with(&self, message: &str) {
        self.faults.fail_with(message);
    }

    pub fn recover(&self) {
        self.faults.recover();
    }

    pub fn set_latency(&self, latency: Duration) {
        self.faults.set_latency(latency);
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.faults.calls()
    }

    /// Number of live change subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }
}

#[async_trait]
impl SessionProvider for MemorySessionProvider {
    async fn current_session(&self) -> Result<Option<Session>, StoreError> {
        self.faults.enter().await?;
        self.session
            .read()
            .map(|session| session.clone())
            .map_err(|_| StoreError::Unavailable("session lock poisoned".to_string()))
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, Profile>>,
    faults: Faults,
}

impl MemoryProfileStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, identity_id: &str, profile: Profile) {
        if let Ok(mut profiles) = self.profiles.write() {
            profiles.insert(identity_id.to_string(), profile);
        }
    }

    pub fn fail_with(&self, message: &str) {
        self.faults.fail_with(message);
    }

    pub fn recover(&self) {
        self.faults.recover();
    }

    pub fn set_latency(&self, latency: Duration) {
        self.faults.set_latency(latency);
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.faults.calls()
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn profile(&self, identity_id: &str) -> Result<Option<Profile>, StoreError> {
        self.faults.enter().await?;
        self.profiles
            .read()
            .map(|profiles| profiles.get(identity_id).cloned())
            .map_err(|_| StoreError::Unavailable("profile lock poisoned".to_string()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryRoleStore {
    roles: RwLock<HashMap<String, RoleAssignment>>,
    faults: Faults,
}

impl MemoryRoleStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&self, identity_id: &str, role: Role) {
        if let Ok(mut roles) = self.roles.write() {
            roles.insert(
                identity_id.to_string(),
                RoleAssignment {
                    identity_id: identity_id.to_string(),
                    role,
                    updated_at: Utc::now(),
                },
            );
        }
    }

    pub fn fail_with(&self, message: &str) {
        self.faults.fail_with(message);
    }

    pub fn recover(&self) {
        self.faults.recover();
    }

    pub fn set_latency(&self, latency: Duration) {
        self.faults.set_latency(latency);
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.faults.calls()
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn role(&self, identity_id: &str) -> Result<Option<RoleAssignment>, StoreError> {
        self.faults.enter().await?;
        self.roles
            .read()
            .map(|roles| roles.get(identity_id).cloned())
            .map_err(|_| StoreError::Unavailable("role lock poisoned".to_string()))
    }

    async fn upsert_role(
        &self,
        identity_id: &str,
        role: Role,
    ) -> Result<RoleAssignment, StoreError> {
        self.faults.enter().await?;
        let assignment = RoleAssignment {
            identity_id: identity_id.to_string(),
            role,
            updated_at: Utc::now(),
        };
        let mut roles = self
            .roles
            .write()
            .map_err(|_| StoreError::Unavailable("role lock poisoned".to_string()))?;
        roles.insert(identity_id.to_string(), assignment.clone());
        Ok(assignment)
    }
}

#[derive(Debug, Default)]
pub struct RecordingNavigator {
    visits: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn visits(&self) -> Vec<String> {
        self.visits.lock().map(|v| v.clone()).unwrap_or_default()
    }

    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.visits().pop()
    }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, path: &str) {
        if let Ok(mut visits) = self.visits.lock() {
            visits.push(path.to_string());
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, message: &str, kind: NoticeKind) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(Notice {
                message: message.to_string(),
                kind,
            });
        }
    }
}
