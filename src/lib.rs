//! # Terraguard (portal access guard)
//!
//! `terraguard` decides whether the current caller may enter one of the
//! role-specific portals of the environmental monitoring dashboard
//! (`government`, `ngo`, `research`, `citizen`).
//!
//! ## Verification protocol
//!
//! A guard runs an ordered chain of dependent checks, each short-circuiting on
//! failure:
//!
//! 1. a session exists,
//! 2. the session's email is verified,
//! 3. the profile is complete (has a display name),
//! 4. a role assignment can be resolved,
//! 5. the resolved role matches the required one.
//!
//! A failing check produces one notification and one navigation, and may store
//! the path the caller wanted (the pending intent) so the downstream flows in
//! [`flows`] can resume there.
//!
//! ## Re-entrancy
//!
//! An activated guard re-runs the protocol on every session-change
//! notification. Runs are tagged with a generation number so a slow, stale run
//! never overwrites the state committed by a newer one.
//!
//! ## Collaborators
//!
//! Sessions, profiles, roles, navigation, notifications and the pending intent
//! are reached through the traits in [`ports`]. [`memory`] and [`intent`]
//! provide in-process implementations; [`backend`] talks to the platform's
//! REST API.

pub mod backend;
pub mod cli;
pub mod error;
pub mod flows;
pub mod guard;
pub mod intent;
pub mod memory;
pub mod models;
pub mod ports;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
