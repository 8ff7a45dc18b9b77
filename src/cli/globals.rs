use secrecy::{ExposeSecret, SecretString};
use std::{fmt, path::PathBuf, time::Duration};

use crate::backend::BackendConfig;

/// Connection settings shared by every subcommand.
#[derive(Clone)]
pub struct GlobalArgs {
    pub backend_url: String,
    pub api_key: SecretString,
    pub access_token: Option<SecretString>,
    pub intent_file: PathBuf,
    pub request_timeout: Duration,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(backend_url: String, api_key: SecretString) -> Self {
        Self {
            backend_url,
            api_key,
            access_token: None,
            intent_file: PathBuf::from(".terraguard/storage.json"),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn set_access_token(&mut self, token: SecretString) {
        if !token.expose_secret().is_empty() {
            self.access_token = Some(token);
        }
    }

    #[must_use]
    pub fn backend_config(&self) -> BackendConfig {
        let config = BackendConfig::new(self.backend_url.clone(), self.api_key.clone())
            .with_request_timeout(self.request_timeout);
        match &self.access_token {
            Some(token) => config.with_access_token(token.clone()),
            None => config,
        }
    }
}

impl fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("backend_url", &self.backend_url)
            .field("api_key", &"***")
            .field("access_token", &self.access_token.as_ref().map(|_| "***"))
            .field("intent_file", &self.intent_file)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args() {
        let args = GlobalArgs::new(
            "https://api.terraguard.dev".to_string(),
            SecretString::from("anon-key".to_string()),
        );
        assert_eq!(args.backend_url, "https://api.terraguard.dev");
        assert_eq!(args.api_key.expose_secret(), "anon-key");
        assert!(args.access_token.is_none());
    }

    #[test]
    fn test_empty_access_token_is_ignored() {
        let mut args = GlobalArgs::new(
            "https://api.terraguard.dev".to_string(),
            SecretString::from("anon-key".to_string()),
        );
        args.set_access_token(SecretString::from(String::new()));
        assert!(args.access_token.is_none());

        args.set_access_token(SecretString::from("user-token".to_string()));
        assert_eq!(
            args.backend_config()
                .access_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
            Some("user-token".to_string())
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut args = GlobalArgs::new(
            "https://api.terraguard.dev".to_string(),
            SecretString::from("anon-key".to_string()),
        );
        args.set_access_token(SecretString::from("user-token".to_string()));

        let rendered = format!("{args:?}");
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("anon-key"));
        assert!(!rendered.contains("user-token"));
    }
}
