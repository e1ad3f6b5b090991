//! Command: check the host without side effects.
use std::io::Write;

use anyhow::Result;

use crate::bootstrap::Environment;
use crate::cli::GlobalOpts;

/// Run identification and the version gate only.
///
/// # Errors
///
/// Returns the [`StartupError`](crate::error::StartupError) describing why
/// the host was rejected.
pub fn run(global: &GlobalOpts, out: &mut dyn Write) -> Result<()> {
    let env = Environment::new(super::resolve_paths(global)?);
    let identity = env.validator().validate(env.paths.executable())?;
    writeln!(
        out,
        "{} is supported: {} (matched by {})",
        identity.executable.display(),
        identity.version,
        identity.matched_by
    )?;
    Ok(())
}
