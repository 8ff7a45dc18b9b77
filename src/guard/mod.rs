//! Portal access guard.
//!
//! [`AccessGuard`] evaluates whether the caller may enter a portal. With a
//! required role it gates (redirects on the first failing check); without one
//! it only observes and publishes what it found. [`machine`] holds the pure
//! decision logic, [`runner`] the I/O and side effects.

pub mod config;
pub mod generation;
pub mod machine;
pub mod runner;
pub mod state;

pub use config::GuardConfig;
pub use machine::{DenyReason, Phase};
pub use runner::{AccessGuard, ActiveGuard, Verdict};
pub use state::GuardState;
