//! Collaborator traits the guard is wired against.
//!
//! Every collaborator is injected; the guard never reaches for ambient state.
//! Implementations live in [`crate::memory`], [`crate::intent`] and
//! [`crate::backend`].

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::{
    error::StoreError,
    models::{NoticeKind, Profile, Role, RoleAssignment, Session, SessionEvent},
};

#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Current session, `None` when nobody is signed in.
    async fn current_session(&self) -> Result<Option<Session>, StoreError>;

    /// Change notifications. Dropping the receiver unsubscribes.
    fn subscribe(&self) -> broadcast::Receiver<SessionEvent>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Single-row lookup; a missing row is `Ok(None)`.
    async fn profile(&self, identity_id: &str) -> Result<Option<Profile>, StoreError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn role(&self, identity_id: &str) -> Result<Option<RoleAssignment>, StoreError>;

    /// Replaces any existing assignment for the identity.
    async fn upsert_role(&self, identity_id: &str, role: Role)
    -> Result<RoleAssignment, StoreError>;
}

pub trait Navigator: Send + Sync {
    fn go_to(&self, path: &str);
}

pub trait Notifier: Send + Sync {
    fn show(&self, message: &str, kind: NoticeKind);
}

/// The single pending-intent slot in client-local storage.
#[async_trait]
pub trait IntentStore: Send + Sync {
    async fn save(&self, path: &str) -> Result<(), StoreError>;

    async fn peek(&self) -> Result<Option<String>, StoreError>;

    /// Reads and clears the slot.
    async fn take(&self) -> Result<Option<String>, StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;
}

/// Bundle of collaborators shared by guards and flows.
#[derive(Clone)]
pub struct Ports {
    pub sessions: Arc<dyn SessionProvider>,
    pub profiles: Arc<dyn ProfileStore>,
    pub roles: Arc<dyn RoleStore>,
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
    pub intent: Arc<dyn IntentStore>,
}
