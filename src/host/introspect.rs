//! Host introspection: reading version metadata out of the host executable.
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::FileVersion;
use super::pe;
use super::version_info::VersionInfo;

/// Source of version metadata for the host executable.
///
/// The validator only talks to this trait so that tests can substitute a
/// mock for real executables.
#[cfg_attr(test, mockall::automock)]
pub trait HostIntrospector {
    /// Parsed version resource of `executable`, or `None` when the file has
    /// no (readable) version resource.
    fn version_info(&self, executable: &Path) -> Option<VersionInfo>;

    /// Four-part runtime version of `executable`;
    /// [`FileVersion::UNKNOWN`] when it cannot be determined.
    fn runtime_version(&self, executable: &Path) -> FileVersion;
}

/// Production [`HostIntrospector`] that reads the PE image from disk.
///
/// The parsed resource of the last executable is kept, so identification
/// followed by the version check reads the image once.
#[derive(Debug, Default)]
pub struct PeIntrospector {
    last: Mutex<Option<(PathBuf, Option<VersionInfo>)>>,
}

impl PeIntrospector {
    /// Create an introspector with an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(executable: &Path) -> Option<VersionInfo> {
        let image = match std::fs::read(executable) {
            Ok(image) => image,
            Err(e) => {
                tracing::debug!(path = %executable.display(), error = %e, "cannot read host image");
                return None;
            }
        };

        let block = match pe::version_resource(&image) {
            Ok(Some(block)) if !block.is_empty() => block,
            Ok(_) => {
                tracing::debug!(path = %executable.display(), "host image has no version resource");
                return None;
            }
            Err(e) => {
                tracing::debug!(path = %executable.display(), error = %e, "cannot read PE resources");
                return None;
            }
        };

        VersionInfo::parse(block)
            .inspect_err(|e| {
                tracing::debug!(path = %executable.display(), error = %e, "malformed version resource");
            })
            .ok()
    }
}

impl HostIntrospector for PeIntrospector {
    fn version_info(&self, executable: &Path) -> Option<VersionInfo> {
        if let Ok(last) = self.last.lock()
            && let Some((path, info)) = last.as_ref()
            && path == executable
        {
            return info.clone();
        }
        let info = Self::read(executable);
        if let Ok(mut last) = self.last.lock() {
            *last = Some((executable.to_path_buf(), info.clone()));
        }
        info
    }

    fn runtime_version(&self, executable: &Path) -> FileVersion {
        self.version_info(executable)
            .map_or(FileVersion::UNKNOWN, |info| info.file_version())
    }
}
