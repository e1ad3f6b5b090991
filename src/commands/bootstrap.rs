//! Command: run the full startup sequence.
use std::io::Write;

use anyhow::Result;

use crate::bootstrap::{self as startup, Environment};
use crate::cli::GlobalOpts;

/// Validate the host, start logging, then load and save settings.
///
/// # Errors
///
/// Returns the [`StartupError`](crate::error::StartupError) that aborted
/// startup, or an error if the layout cannot be resolved or the summary
/// cannot be written.
pub fn run(global: &GlobalOpts, verbose: bool, out: &mut dyn Write) -> Result<()> {
    let paths = super::resolve_paths(global)?;
    let env = Environment::new(paths).verbose(verbose);
    let started = startup::run(&env)?;

    let identity = &started.identity;
    writeln!(
        out,
        "{} {} (matched by {})",
        identity.executable.display(),
        identity.version,
        identity.matched_by
    )?;
    writeln!(out, "settings: {}", started.settings.paths().config().display())?;
    if let Some(log_file) = &started.log_file {
        writeln!(out, "log: {}", log_file.display())?;
    }
    Ok(())
}
