//! Command: reset settings to their defaults.
use std::io::Write;

use anyhow::{Result, bail};

use crate::cli::GlobalOpts;
use crate::settings::Settings;

/// Reset every section and write the document.
///
/// # Errors
///
/// Returns an error if the document cannot be written.
pub fn run(global: &GlobalOpts, out: &mut dyn Write) -> Result<()> {
    let mut settings = Settings::new(super::resolve_paths(global)?);
    settings.load();
    if !settings.reset_to_defaults() {
        bail!(
            "Cannot write settings to {}",
            settings.paths().config().display()
        );
    }
    writeln!(out, "settings reset: {}", settings.paths().config().display())?;
    Ok(())
}
