//! Records exchanged with the session, profile and role stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Portal roles. The guard only compares them for equality.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Government,
    Ngo,
    Research,
    Citizen,
}

impl Role {
    pub const ALL: [Self; 4] = [Self::Government, Self::Ngo, Self::Research, Self::Citizen];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Government => "government",
            Self::Ngo => "ngo",
            Self::Research => "research",
            Self::Citizen => "citizen",
        }
    }

    /// Landing page of the role's portal.
    #[must_use]
    pub fn portal_path(self) -> String {
        format!("/portal/{}", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "government" => Ok(Self::Government),
            "ngo" => Ok(Self::Ngo),
            "research" => Ok(Self::Research),
            "citizen" => Ok(Self::Citizen),
            _ => Err(UnknownRole(value.to_string())),
        }
    }
}

/// Snapshot of the authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity_id: String,
    pub email_verified_at: Option<DateTime<Utc>>,
}

impl Session {
    #[must_use]
    pub fn new(identity_id: impl Into<String>, email_verified_at: Option<DateTime<Utc>>) -> Self {
        Self {
            identity_id: identity_id.into(),
            email_verified_at,
        }
    }

    #[must_use]
    pub fn is_email_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub name: Option<String>,
    pub bio: Option<String>,
}

impl Profile {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            bio: None,
        }
    }

    /// A profile is complete once it carries a non-empty display name.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.name.as_deref().is_some_and(|name| !name.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    #[serde(rename = "user_id")]
    pub identity_id: String,
    pub role: Role,
    pub updated_at: DateTime<Utc>,
}

/// Session-change notification kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    InitialSession,
    SignedIn,
    SignedOut,
    TokenRefreshed,
    UserUpdated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Error,
}
