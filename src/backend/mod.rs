//! REST adapter for the platform backend (GoTrue-style auth endpoint plus
//! PostgREST tables).
//!
//! Flow Overview:
//! - `GET /auth/v1/user` resolves the bearer token into a session.
//! - `GET /rest/v1/profiles` and `GET /rest/v1/user_roles` are single-row
//!   lookups filtered by identity id.
//! - `POST /rest/v1/user_roles?on_conflict=user_id` upserts a role.
//!
//! Every request carries the project `apikey`; the access token, when present,
//! is sent as the bearer credential. Neither is ever logged.

mod profiles;
mod roles;
mod session;

pub use session::classify_change;

use reqwest::{Client, Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tokio::sync::broadcast;
use tracing::debug;
use url::Url;

use crate::{APP_USER_AGENT, error::StoreError, models::SessionEvent};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const EVENT_CAPACITY: usize = 16;

#[derive(Clone, Debug)]
pub struct BackendConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub access_token: Option<SecretString>,
    pub request_timeout: Duration,
}

impl BackendConfig {
    #[must_use]
    pub fn new(base_url: String, api_key: SecretString) -> Self {
        Self {
            base_url,
            api_key,
            access_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_access_token(mut self, token: SecretString) -> Self {
        self.access_token = Some(token);
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Session provider, profile store and role store backed by the REST API.
#[derive(Clone, Debug)]
pub struct RestBackend {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    client: Client,
    base_url: String,
    api_key: SecretString,
    access_token: Option<SecretString>,
    events: broadcast::Sender<SessionEvent>,
}

/// Builds `{base}{path}`, validating the scheme and host.
///
/// # Errors
/// Returns an error if `base` cannot be parsed, has no host, or uses an unsupported scheme.
pub fn endpoint_url(base: &str, path: &str) -> Result<Url, StoreError> {
    let url = Url::parse(base).map_err(|e| StoreError::Url(format!("{base}: {e}")))?;

    let scheme = url.scheme();

    let host = url
        .host_str()
        .ok_or_else(|| StoreError::Url(format!("{base}: no host specified")))?;

    let port = match url.port() {
        Some(p) => p,
        None => match scheme {
            "http" => 80,
            "https" => 443,
            _ => return Err(StoreError::Url(format!("unsupported scheme {scheme}"))),
        },
    };

    let prefix = url.path().trim_end_matches('/');
    let endpoint = format!("{scheme}://{host}:{port}{prefix}{path}");

    debug!("endpoint URL: {}", endpoint);

    Url::parse(&endpoint).map_err(|e| StoreError::Url(format!("{endpoint}: {e}")))
}

fn error_message(body: &Value) -> &str {
    ["message", "error_description", "msg", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(Value::as_str))
        .unwrap_or("")
}

impl RestBackend {
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn new(config: BackendConfig) -> Result<Self, StoreError> {
        // Validate early so a bad URL fails at startup, not on first check.
        endpoint_url(&config.base_url, "/")?;

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.request_timeout)
            .build()?;

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(Inner {
                client,
                base_url: config.base_url,
                api_key: config.api_key,
                access_token: config.access_token,
                events,
            }),
        })
    }

    fn has_access_token(&self) -> bool {
        self.inner.access_token.is_some()
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .inner
            .access_token
            .as_ref()
            .unwrap_or(&self.inner.api_key);

        self.inner
            .client
            .request(method, url)
            .header("apikey", self.inner.api_key.expose_secret())
            .bearer_auth(bearer.expose_secret())
    }

    fn table_url(&self, table: &str, query: &[(&str, String)]) -> Result<Url, StoreError> {
        let mut url = endpoint_url(&self.inner.base_url, &format!("/rest/v1/{table}"))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    /// Turns a non-success response into [`StoreError::Status`].
    async fn check(response: Response) -> Result<Response, StoreError> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let url = response.url().to_string();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        Err(StoreError::Status {
            url,
            status: status.as_u16(),
            message: error_message(&body).to_string(),
        })
    }

    async fn rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let url = self.table_url(table, query)?;
        let response = self.request(Method::GET, url).send().await?;
        let response = Self::check(response).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
