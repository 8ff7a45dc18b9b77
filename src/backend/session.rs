use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tokio::{sync::broadcast, task::JoinHandle, time::sleep};
use tracing::{Instrument, debug, info_span, instrument, warn};

use super::{RestBackend, endpoint_url};
use crate::{
    error::StoreError,
    models::{Session, SessionEvent},
    ports::SessionProvider,
};

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
    #[serde(default)]
    email_confirmed_at: Option<DateTime<Utc>>,
}

/// Event to broadcast when the polled session moves from `previous` to `next`.
#[must_use]
pub fn classify_change(previous: Option<&Session>, next: Option<&Session>) -> Option<SessionEvent> {
    match (previous, next) {
        (None, None) => None,
        (None, Some(_)) => Some(SessionEvent::SignedIn),
        (Some(_), None) => Some(SessionEvent::SignedOut),
        (Some(before), Some(after)) if before.identity_id != after.identity_id => {
            Some(SessionEvent::SignedIn)
        }
        (Some(before), Some(after)) if before != after => Some(SessionEvent::UserUpdated),
        _ => None,
    }
}

impl RestBackend {
    /// Polls the session every `every` (with jitter) and broadcasts changes.
    ///
    /// The first poll only sets the baseline; guards run on activation anyway.
    /// Failed polls are logged and skipped.
    #[must_use]
    pub fn watch_session(&self, every: Duration) -> JoinHandle<()> {
        let backend = self.clone();

        tokio::spawn(async move {
            let mut last = match backend.current_session().await {
                Ok(session) => session,
                Err(e) => {
                    warn!("Initial session poll failed: {e}");
                    None
                }
            };

            loop {
                let jittered = every.mul_f64(rand::thread_rng().gen_range(0.9..1.1));
                sleep(jittered).await;

                match backend.current_session().await {
                    Ok(session) => {
                        if let Some(event) = classify_change(last.as_ref(), session.as_ref()) {
                            debug!(?event, "session changed");
                            // No subscribers is fine.
                            let _ = backend.inner.events.send(event);
                        }
                        last = session;
                    }
                    Err(e) => warn!("Session poll failed: {e}"),
                }
            }
        })
    }
}

#[async_trait]
impl SessionProvider for RestBackend {
    #[instrument(skip(self))]
    async fn current_session(&self) -> Result<Option<Session>, StoreError> {
        if !self.has_access_token() {
            debug!("no access token, no session");
            return Ok(None);
        }

        let url = endpoint_url(&self.inner.base_url, "/auth/v1/user")?;
        let span = info_span!("backend.session", http.method = "GET", url = %url);
        let response = self
            .request(Method::GET, url)
            .send()
            .instrument(span)
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            debug!("access token rejected, no session");
            return Ok(None);
        }

        let response = Self::check(response).await?;
        let body = response.bytes().await?;
        let user: UserRecord = serde_json::from_slice(&body)?;

        Ok(Some(Session::new(user.id, user.email_confirmed_at)))
    }

    fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }
}
