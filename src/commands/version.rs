//! Command: print version information.
use std::io::Write;

use anyhow::Result;

use crate::bootstrap::BuildInfo;

/// Print the crate version and build identifier.
///
/// # Errors
///
/// Returns an error if output fails.
pub fn run(out: &mut dyn Write) -> Result<()> {
    writeln!(
        out,
        "tweaks {} ({})",
        env!("CARGO_PKG_VERSION"),
        BuildInfo::current()
    )?;
    Ok(())
}
