//! Startup core of the engine tweaks plugin.
//!
//! Before the plugin does anything inside its host process it must know
//! that the host is the one game build it was compiled against, and it must
//! have a complete settings document to work from.
//!
//! The public API is organised into these layers:
//!
//! - **[`host`]**: read the host's version resource and gate on identity and version
//! - **[`settings`]**: typed sections persisted as one JSON document
//! - **[`paths`]**: on-disk layout of the host and the plugin
//! - **[`logging`]**: the process-wide `tracing` subscriber and its log file
//! - **[`bootstrap`]**: the startup sequence tying the above together
//! - **[`commands`]**: subcommands of the `tweaks` front end
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod error;
pub mod host;
pub mod logging;
pub mod paths;
pub mod settings;

/// Commit this build was made from, or `unknown`.
pub const BUILD_COMMIT: &str = match option_env!("TWEAKS_BUILD_COMMIT") {
    Some(commit) => commit,
    None => "unknown",
};

/// Branch this build was made from, or `unknown`.
pub const BUILD_BRANCH: &str = match option_env!("TWEAKS_BUILD_BRANCH") {
    Some(branch) => branch,
    None => "unknown",
};
