#![allow(clippy::expect_used, clippy::unwrap_used)]
//! Integration test for the startup log file.
//!
//! Kept in its own test binary: installing the global subscriber is a
//! once-per-process operation.

mod common;

use common::{GameInstall, HOST_EXE, supported_host};
use engine_tweaks::bootstrap::{self, Environment};
use engine_tweaks::host::HostProfile;
use engine_tweaks::paths::LOG_FILE;

#[test]
fn startup_writes_diagnostics_to_log_file() {
    let game = GameInstall::new();
    let exe = game.install_host(HOST_EXE, &supported_host());
    let paths = game.paths(&exe);

    let startup = bootstrap::run(&Environment::new(paths.clone())).expect("startup");

    let log_file = startup.log_file.expect("logger installed");
    assert_eq!(log_file.file_name().and_then(|n| n.to_str()), Some(LOG_FILE));
    let log = std::fs::read_to_string(&log_file).expect("read log");
    assert!(log.starts_with("=========="));
    assert!(log.contains("Engine Tweaks is starting..."));
    let supported = HostProfile::default().supported;
    assert!(log.contains(&format!("] Game version {supported}\n")));
    assert!(log.contains(&format!("Root path: {}", paths.game_root().display())));
    assert!(log.contains("Mods search path:"));
    assert!(
        log.lines()
            .filter(|l| l.contains("] [info] ["))
            .count()
            >= 6
    );
}
