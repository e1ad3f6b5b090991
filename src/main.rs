//! `tweaks`: command-line front end for the engine tweaks startup core.
use anyhow::Result;
use clap::Parser;

use engine_tweaks::cli::{Cli, Command};
use engine_tweaks::{commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    // `bootstrap` installs its own subscriber with a log file.
    if args.command != Command::Bootstrap {
        logging::init_console(args.verbose).ok();
    }

    let mut out = std::io::stdout().lock();
    match args.command {
        Command::Bootstrap => commands::bootstrap::run(&args.global, args.verbose, &mut out),
        Command::Validate => commands::validate::run(&args.global, &mut out),
        Command::Reset => commands::reset::run(&args.global, &mut out),
        Command::Show => commands::show::run(&args.global, &mut out),
        Command::Version => commands::version::run(&mut out),
    }
}
