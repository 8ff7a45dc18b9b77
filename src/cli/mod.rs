pub mod actions;
pub mod commands;
pub mod dispatch;
pub mod globals;
pub mod start;
pub mod telemetry;
pub mod terminal;

pub use self::start::start;
