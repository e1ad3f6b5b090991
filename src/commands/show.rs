//! Command: print the effective settings document.
use std::io::Write;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::settings::Settings;

/// Load settings and print them as they would be saved.
///
/// # Errors
///
/// Returns an error if the layout cannot be resolved or output fails.
pub fn run(global: &GlobalOpts, out: &mut dyn Write) -> Result<()> {
    let mut settings = Settings::new(super::resolve_paths(global)?);
    settings.load();
    write!(out, "{}", settings.render()?)?;
    Ok(())
}
