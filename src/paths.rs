//! Resolved filesystem layout of the host and the plugin.
//!
//! The host executable lives at `<game root>/bin/x64/<exe>`; the plugin's
//! own root is `<game root>/bin/x64/plugins/engine_tweaks`, which holds the
//! settings document, the log file and the `mods` extension directory.
use std::path::{Path, PathBuf};

/// Plugin directory name under `bin/x64/plugins`.
pub const PLUGIN_DIR: &str = "engine_tweaks";
/// Settings document file name.
pub const CONFIG_FILE: &str = "config.json";
/// Log file name.
pub const LOG_FILE: &str = "engine_tweaks.log";
/// Extension-search directory name under the own root.
pub const MODS_DIR: &str = "mods";

/// Canonical paths used during startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    executable: PathBuf,
    game_root: PathBuf,
    own_root: PathBuf,
    mods_root: PathBuf,
}

impl Paths {
    /// Create paths with an explicit layout.
    #[must_use]
    pub const fn new(
        executable: PathBuf,
        game_root: PathBuf,
        own_root: PathBuf,
        mods_root: PathBuf,
    ) -> Self {
        Self {
            executable,
            game_root,
            own_root,
            mods_root,
        }
    }

    /// Derive the standard layout from the host executable's location.
    #[must_use]
    pub fn from_executable(executable: impl Into<PathBuf>) -> Self {
        let executable = absolute(executable.into());
        let game_root = executable
            .ancestors()
            .nth(3)
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let own_root = game_root
            .join("bin")
            .join("x64")
            .join("plugins")
            .join(PLUGIN_DIR);
        let mods_root = own_root.join(MODS_DIR);
        Self::new(executable, game_root, own_root, mods_root)
    }

    /// Layout derived from the running executable.
    ///
    /// # Errors
    ///
    /// Returns an error if the current executable path cannot be determined.
    pub fn current() -> std::io::Result<Self> {
        Ok(Self::from_executable(std::env::current_exe()?))
    }

    /// Replace the own root (and the `mods` directory beneath it).
    #[must_use]
    pub fn with_own_root(mut self, own_root: impl Into<PathBuf>) -> Self {
        self.own_root = absolute(own_root.into());
        self.mods_root = self.own_root.join(MODS_DIR);
        self
    }

    /// Host executable.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Game installation root.
    #[must_use]
    pub fn game_root(&self) -> &Path {
        &self.game_root
    }

    /// Plugin root holding settings and logs.
    #[must_use]
    pub fn own_root(&self) -> &Path {
        &self.own_root
    }

    /// Extension-search root.
    #[must_use]
    pub fn mods_root(&self) -> &Path {
        &self.mods_root
    }

    /// Settings document path.
    #[must_use]
    pub fn config(&self) -> PathBuf {
        self.own_root.join(CONFIG_FILE)
    }

    /// Resolve `path` for reading or writing.
    ///
    /// Relative paths are joined to `base`, or to the own root when `base`
    /// is empty. An existing path is canonicalized. A missing path resolves
    /// to `None` for reads; for writes its parent directories are created
    /// and the absolute path is returned (`None` if that fails).
    #[must_use]
    pub fn resolve(&self, path: &Path, base: &Path, for_write: bool) -> Option<PathBuf> {
        if path.as_os_str().is_empty() {
            return None;
        }

        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else if base.as_os_str().is_empty() {
            self.own_root.join(path)
        } else {
            base.join(path)
        };

        if joined.exists() {
            return dunce::canonicalize(&joined).ok();
        }
        if !for_write {
            return None;
        }

        if let Some(parent) = joined.parent()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            tracing::debug!(path = %parent.display(), error = %e, "cannot create directory");
            return None;
        }
        Some(absolute(joined))
    }
}

/// Make `path` absolute against the current directory without touching the
/// filesystem beyond that.
fn absolute(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn layout(root: &Path) -> Paths {
        Paths::from_executable(root.join("bin").join("x64").join("Cyberpunk2077.exe"))
    }

    #[test]
    fn from_executable_derives_roots() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = layout(dir.path());
        assert_eq!(paths.game_root(), dir.path());
        assert_eq!(
            paths.own_root(),
            dir.path().join("bin/x64/plugins").join(PLUGIN_DIR)
        );
        assert_eq!(paths.mods_root(), paths.own_root().join("mods"));
        assert_eq!(paths.config(), paths.own_root().join("config.json"));
    }

    #[test]
    fn with_own_root_moves_mods() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = layout(dir.path()).with_own_root(dir.path().join("custom"));
        assert_eq!(paths.own_root(), dir.path().join("custom"));
        assert_eq!(paths.mods_root(), dir.path().join("custom").join("mods"));
    }

    #[test]
    fn resolve_missing_for_read_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = layout(dir.path());
        assert_eq!(paths.resolve(&paths.config(), Path::new(""), false), None);
    }

    #[test]
    fn resolve_missing_for_write_creates_parents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = layout(dir.path());
        let resolved = paths
            .resolve(&paths.config(), Path::new(""), true)
            .expect("resolved");
        assert_eq!(resolved, paths.config());
        assert!(paths.own_root().is_dir());
        assert!(!resolved.exists(), "resolution must not create the file");
    }

    #[test]
    fn resolve_relative_uses_base() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = layout(dir.path());
        std::fs::write(dir.path().join("note.txt"), "x").expect("write");
        let resolved = paths
            .resolve(Path::new("note.txt"), dir.path(), false)
            .expect("resolved");
        assert_eq!(
            resolved,
            dunce::canonicalize(dir.path().join("note.txt")).expect("canonical")
        );
    }

    #[test]
    fn resolve_relative_defaults_to_own_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = layout(dir.path());
        let resolved = paths
            .resolve(Path::new(LOG_FILE), Path::new(""), true)
            .expect("resolved");
        assert_eq!(resolved, paths.own_root().join(LOG_FILE));
    }

    #[test]
    fn resolve_empty_path_is_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = layout(dir.path());
        assert_eq!(paths.resolve(Path::new(""), dir.path(), true), None);
    }
}
