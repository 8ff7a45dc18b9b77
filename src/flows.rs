//! Downstream flows that consume the pending intent after the guard has
//! redirected the caller.

use tracing::{info, instrument, warn};

use crate::{
    error::StoreError,
    guard::GuardConfig,
    models::{NoticeKind, Role, RoleAssignment},
    ports::Ports,
};

async fn take_intent(ports: &Ports) -> Option<String> {
    match ports.intent.take().await {
        Ok(intent) => intent,
        Err(e) => {
            warn!("Failed to read pending intent: {e}");
            None
        }
    }
}

/// Called once the caller has confirmed their email: resume the pending
/// intent, or continue to role selection. Returns the navigation target.
#[instrument(skip_all)]
pub async fn complete_verification(ports: &Ports, config: &GuardConfig) -> String {
    let target = take_intent(ports)
        .await
        .unwrap_or_else(|| config.select_role_route().to_string());

    info!(%target, "email verified, resuming");
    ports.navigator.go_to(&target);
    target
}

/// Stores the caller's chosen role, then resumes the pending intent or lands
/// on the role's portal.
///
/// # Errors
/// Returns the store error if the role could not be saved; the pending intent
/// is left untouched in that case.
#[instrument(skip(ports))]
pub async fn select_role(
    ports: &Ports,
    identity_id: &str,
    role: Role,
) -> Result<RoleAssignment, StoreError> {
    let assignment = match ports.roles.upsert_role(identity_id, role).await {
        Ok(assignment) => assignment,
        Err(e) => {
            warn!("Failed to save role: {e}");
            ports
                .notifier
                .show("Could not save your role, please try again", NoticeKind::Error);
            return Err(e);
        }
    };

    let target = take_intent(ports)
        .await
        .unwrap_or_else(|| role.portal_path());

    ports.notifier.show("Role saved", NoticeKind::Info);
    ports.navigator.go_to(&target);

    Ok(assignment)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::{
        intent::MemoryIntentStore,
        memory::{
            MemoryProfileStore, MemoryRoleStore, MemorySessionProvider, RecordingNavigator,
            RecordingNotifier,
        },
        ports::{IntentStore, RoleStore},
    };
    use std::sync::Arc;

    struct Fixture {
        ports: Ports,
        roles: Arc<MemoryRoleStore>,
        intent: Arc<MemoryIntentStore>,
        navigator: Arc<RecordingNavigator>,
        notifier: Arc<RecordingNotifier>,
    }

    fn fixture() -> Fixture {
        let roles = Arc::new(MemoryRoleStore::new());
        let intent = Arc::new(MemoryIntentStore::new());
        let navigator = Arc::new(RecordingNavigator::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let ports = Ports {
            sessions: Arc::new(MemorySessionProvider::new()),
            profiles: Arc::new(MemoryProfileStore::new()),
            roles: roles.clone(),
            navigator: navigator.clone(),
            notifier: notifier.clone(),
            intent: intent.clone(),
        };
        Fixture {
            ports,
            roles,
            intent,
            navigator,
            notifier,
        }
    }

    #[tokio::test]
    async fn verification_resumes_pending_intent() {
        let f = fixture();
        f.intent.save("/portal/research").await.unwrap();

        let target = complete_verification(&f.ports, &GuardConfig::default()).await;
        assert_eq!(target, "/portal/research");
        assert_eq!(f.navigator.visits(), vec!["/portal/research"]);
        assert_eq!(f.intent.peek().await.unwrap(), None);
    }

    #[tokio::test]
    async fn verification_without_intent_goes_to_role_selection() {
        let f = fixture();
        let target = complete_verification(&f.ports, &GuardConfig::default()).await;
        assert_eq!(target, "/select-role");
    }

    #[tokio::test]
    async fn select_role_upserts_and_resumes() {
        let f = fixture();
        f.roles.assign("user-1", Role::Citizen);
        f.intent.save("/portal/ngo").await.unwrap();

        let saved = select_role(&f.ports, "user-1", Role::Ngo).await.unwrap();
        assert_eq!(saved.role, Role::Ngo);
        assert_eq!(
            f.roles.role("user-1").await.unwrap().map(|a| a.role),
            Some(Role::Ngo)
        );
        assert_eq!(f.navigator.last().as_deref(), Some("/portal/ngo"));
        assert_eq!(f.intent.peek().await.unwrap(), None);
    }

    #[tokio::test]
    async fn select_role_without_intent_lands_on_portal() {
        let f = fixture();
        select_role(&f.ports, "user-1", Role::Government).await.unwrap();
        assert_eq!(f.navigator.last().as_deref(), Some("/portal/government"));
        assert_eq!(f.notifier.notices()[0].kind, NoticeKind::Info);
    }

    #[tokio::test]
    async fn failed_upsert_keeps_intent_and_does_not_navigate() {
        let f = fixture();
        f.intent.save("/portal/ngo").await.unwrap();
        f.roles.fail_with("role store offline");

        assert!(select_role(&f.ports, "user-1", Role::Ngo).await.is_err());
        assert!(f.navigator.visits().is_empty());
        assert_eq!(f.notifier.notices()[0].kind, NoticeKind::Error);
        assert_eq!(
            f.intent.peek().await.unwrap().as_deref(),
            Some("/portal/ngo")
        );
    }
}
