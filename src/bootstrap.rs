//! Process startup: host gate, logger, diagnostics, then settings.
//!
//! ```text
//! identify host ──▶ logger ──▶ "starting" ──▶ version gate ──▶ diagnostics
//!                                                                  │
//!                                   Startup ◀── save ◀── load ◀────┘
//! ```
//!
//! Each step only runs if the previous one succeeded. Nothing touches the
//! settings document before the host has been fully validated.
use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{LoggingError, StartupError};
use crate::host::{HostIdentity, HostIntrospector, HostProfile, HostValidator, PeIntrospector};
use crate::logging;
use crate::paths::{LOG_FILE, Paths};
use crate::settings::Settings;

/// Component name written to the log file header.
const COMPONENT: &str = "bootstrap";

/// Commit and branch the running build was made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    /// Short commit hash.
    pub commit: &'static str,
    /// Branch name.
    pub branch: &'static str,
}

impl BuildInfo {
    /// Build information stamped at compile time.
    #[must_use]
    pub const fn current() -> Self {
        Self {
            commit: crate::BUILD_COMMIT,
            branch: crate::BUILD_BRANCH,
        }
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.commit, self.branch)
    }
}

/// Everything the startup sequence needs from its embedder.
pub struct Environment {
    /// Host and plugin layout.
    pub paths: Paths,
    /// Host this build supports.
    pub profile: HostProfile,
    /// Source of the host's version metadata.
    pub introspector: Box<dyn HostIntrospector>,
    /// Build identifier logged at startup.
    pub build: BuildInfo,
    /// Show debug output on the console.
    pub verbose: bool,
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("paths", &self.paths)
            .field("profile", &self.profile)
            .field("introspector", &"<dyn HostIntrospector>")
            .field("build", &self.build)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl Environment {
    /// Environment for `paths` with the compiled-in host profile, the
    /// file-backed introspector and this build's identifier.
    #[must_use]
    pub fn new(paths: Paths) -> Self {
        Self {
            paths,
            profile: HostProfile::default(),
            introspector: Box::new(PeIntrospector::new()),
            build: BuildInfo::current(),
            verbose: false,
        }
    }

    /// Replace the host introspector.
    #[must_use]
    pub fn with_introspector(mut self, introspector: Box<dyn HostIntrospector>) -> Self {
        self.introspector = introspector;
        self
    }

    /// Replace the host profile.
    #[must_use]
    pub fn with_profile(mut self, profile: HostProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Set console verbosity.
    #[must_use]
    pub const fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validator over this environment's profile and introspector.
    #[must_use]
    pub fn validator(&self) -> HostValidator<'_> {
        HostValidator::new(&self.profile, self.introspector.as_ref())
    }
}

/// Result of a successful startup.
#[derive(Debug)]
pub struct Startup {
    /// The validated host.
    pub identity: HostIdentity,
    /// Loaded (and saved) settings.
    pub settings: Settings,
    /// Log file, when this startup installed the logger.
    pub log_file: Option<PathBuf>,
}

/// Run the startup sequence.
///
/// # Errors
///
/// Returns [`StartupError::UnrecognizedHost`] before any side effect if the
/// host is not recognised, [`StartupError::Logging`] if the log file cannot
/// be set up, and [`StartupError::UnknownVersion`] or
/// [`StartupError::UnsupportedVersion`] if the version gate fails.
pub fn run(env: &Environment) -> Result<Startup, StartupError> {
    let executable = env.paths.executable();
    let validator = env.validator();

    let matched_by = validator.identify(executable)?;

    let log_file = start_logging(env)?;
    info!("Engine Tweaks is starting...");

    let version = validator.check_version(executable)?;

    info!(matched_by = %matched_by, "Engine Tweaks version {}", env.build);
    info!("Game version {version}");
    info!("Root path: {}", env.paths.game_root().display());
    info!("Engine Tweaks path: {}", env.paths.own_root().display());
    info!("Mods search path: {}", env.paths.mods_root().display());

    let mut settings = Settings::new(env.paths.clone());
    settings.load();
    settings.save();

    Ok(Startup {
        identity: HostIdentity {
            executable: executable.to_path_buf(),
            matched_by,
            version,
        },
        settings,
        log_file,
    })
}

/// Install the logger at `<own root>/engine_tweaks.log`.
///
/// An already-installed subscriber is left in place and yields `None`.
fn start_logging(env: &Environment) -> Result<Option<PathBuf>, StartupError> {
    let own_root = env.paths.own_root();
    let path = env
        .paths
        .resolve(Path::new(LOG_FILE), own_root, true)
        .ok_or_else(|| LoggingError::Unresolved {
            path: own_root.join(LOG_FILE),
        })?;

    match logging::init_subscriber(&path, COMPONENT, env.verbose) {
        Ok(path) => Ok(Some(path)),
        Err(LoggingError::AlreadyInstalled) => {
            warn!(path = %path.display(), "a tracing subscriber is already installed, not opening the log file");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}
