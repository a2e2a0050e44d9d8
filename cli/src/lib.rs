//! Library side of the `exambank` binary: configuration, the restart hook
//! and the command implementations, kept here so they can be tested without
//! spawning the binary.

pub mod commands;
pub mod config;
pub mod hook;

pub use config::AppConfig;
pub use hook::RelaunchHook;
