//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the engine tweaks startup core.
#[derive(Parser, Debug)]
#[command(
    name = "tweaks",
    about = "Host validation and settings for the engine tweaks plugin",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Host executable to inspect (defaults to this executable)
    #[arg(long, global = true)]
    pub exe: Option<PathBuf>,

    /// Override the plugin root holding config.json and the log file
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Validate the host, start logging, then load and save settings
    Bootstrap,
    /// Validate the host only
    Validate,
    /// Reset settings to their defaults
    Reset,
    /// Print the settings document
    Show,
    /// Print version information
    Version,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_bootstrap() {
        let cli = Cli::parse_from(["tweaks", "bootstrap"]);
        assert_eq!(cli.command, Command::Bootstrap);
        assert!(!cli.verbose);
        assert_eq!(cli.global.exe, None);
        assert_eq!(cli.global.root, None);
    }

    #[test]
    fn parse_exe_override() {
        let cli = Cli::parse_from([
            "tweaks",
            "--exe",
            "/games/bin/x64/Cyberpunk2077.exe",
            "validate",
        ]);
        assert_eq!(cli.command, Command::Validate);
        assert_eq!(
            cli.global.exe,
            Some(PathBuf::from("/games/bin/x64/Cyberpunk2077.exe"))
        );
    }

    #[test]
    fn parse_root_after_subcommand() {
        let cli = Cli::parse_from(["tweaks", "show", "--root", "/tmp/tweaks"]);
        assert_eq!(cli.command, Command::Show);
        assert_eq!(cli.global.root, Some(PathBuf::from("/tmp/tweaks")));
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["tweaks", "-v", "reset"]);
        assert!(cli.verbose);
        assert_eq!(cli.command, Command::Reset);
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["tweaks", "version"]);
        assert_eq!(cli.command, Command::Version);
    }

    #[test]
    fn missing_subcommand_is_an_error() {
        assert!(Cli::try_parse_from(["tweaks"]).is_err());
    }
}
