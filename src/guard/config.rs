//! Redirect targets used by the guard and the downstream flows.

const DEFAULT_ENTRY_ROUTE: &str = "/";
const DEFAULT_VERIFY_EMAIL_ROUTE: &str = "/verify-email";
const DEFAULT_COMPLETE_PROFILE_ROUTE: &str = "/complete-profile";
const DEFAULT_SELECT_ROLE_ROUTE: &str = "/select-role";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardConfig {
    entry_route: String,
    verify_email_route: String,
    complete_profile_route: String,
    select_role_route: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            entry_route: DEFAULT_ENTRY_ROUTE.to_string(),
            verify_email_route: DEFAULT_VERIFY_EMAIL_ROUTE.to_string(),
            complete_profile_route: DEFAULT_COMPLETE_PROFILE_ROUTE.to_string(),
            select_role_route: DEFAULT_SELECT_ROLE_ROUTE.to_string(),
        }
    }
}

impl GuardConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entry_route(mut self, route: String) -> Self {
        self.entry_route = route;
        self
    }

    #[must_use]
    pub fn with_verify_email_route(mut self, route: String) -> Self {
        self.verify_email_route = route;
        self
    }

    #[must_use]
    pub fn with_complete_profile_route(mut self, route: String) -> Self {
        self.complete_profile_route = route;
        self
    }

    #[must_use]
    pub fn with_select_role_route(mut self, route: String) -> Self {
        self.select_role_route = route;
        self
    }

    #[must_use]
    pub fn entry_route(&self) -> &str {
        &self.entry_route
    }

    #[must_use]
    pub fn verify_email_route(&self) -> &str {
        &self.verify_email_route
    }

    #[must_use]
    pub fn complete_profile_route(&self) -> &str {
        &self.complete_profile_route
    }

    #[must_use]
    pub fn select_role_route(&self) -> &str {
        &self.select_role_route
    }
}

#[cfg(test)]
mod tests {
    use super::GuardConfig;

    #[test]
    fn guard_config_defaults_and_overrides() {
        let config = GuardConfig::new();
        assert_eq!(config.entry_route(), super::DEFAULT_ENTRY_ROUTE);
        assert_eq!(config.verify_email_route(), super::DEFAULT_VERIFY_EMAIL_ROUTE);
        assert_eq!(
            config.complete_profile_route(),
            super::DEFAULT_COMPLETE_PROFILE_ROUTE
        );
        assert_eq!(config.select_role_route(), super::DEFAULT_SELECT_ROLE_ROUTE);

        let config = config
            .with_entry_route("/welcome".to_string())
            .with_verify_email_route("/auth/verify".to_string())
            .with_complete_profile_route("/onboarding".to_string())
            .with_select_role_route("/onboarding/role".to_string());

        assert_eq!(config.entry_route(), "/welcome");
        assert_eq!(config.verify_email_route(), "/auth/verify");
        assert_eq!(config.complete_profile_route(), "/onboarding");
        assert_eq!(config.select_role_route(), "/onboarding/role");
    }
}
