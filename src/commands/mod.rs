//! Subcommands of the `tweaks` front end.

pub mod bootstrap;
pub mod reset;
pub mod show;
pub mod validate;
pub mod version;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::paths::Paths;

/// Resolve the host and plugin layout from the global options.
///
/// # Errors
///
/// Returns an error if no `--exe` is given and the running executable's
/// path cannot be determined.
pub fn resolve_paths(global: &GlobalOpts) -> Result<Paths> {
    let paths = match &global.exe {
        Some(exe) => Paths::from_executable(exe),
        None => Paths::current().context("cannot determine the running executable")?,
    };
    Ok(match &global.root {
        Some(root) => paths.with_own_root(root),
        None => paths,
    })
}
