//! Host executable identification and version gating.
//!
//! - **[`pe`]**: locate the version resource inside a PE image
//! - **[`version_info`]**: parse a `VS_VERSIONINFO` block
//! - **[`introspect`]**: the [`HostIntrospector`] seam and its file-backed implementation
//! - **[`validator`]**: the startup gate built on top of them

pub mod introspect;
pub mod pe;
pub mod validator;
pub mod version_info;

use std::fmt;
use std::path::PathBuf;

pub use introspect::{HostIntrospector, PeIntrospector};
pub use validator::{HostValidator, Verification};
pub use version_info::{Translation, VersionInfo};

/// Four-part file version: `major.minor.build.revision`.
///
/// A major component of zero means the version could not be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FileVersion {
    /// Major component.
    pub major: u16,
    /// Minor component.
    pub minor: u16,
    /// Build component.
    pub build: u16,
    /// Revision component.
    pub revision: u16,
}

impl FileVersion {
    /// Sentinel for "version not determined".
    pub const UNKNOWN: Self = Self::new(0, 0, 0, 0);

    /// Create a version from its four components.
    #[must_use]
    pub const fn new(major: u16, minor: u16, build: u16, revision: u16) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Build a version from the packed `MS`/`LS` double words of a
    /// `VS_FIXEDFILEINFO`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn from_packed(ms: u32, ls: u32) -> Self {
        Self::new(
            (ms >> 16) as u16,
            (ms & 0xFFFF) as u16,
            (ls >> 16) as u16,
            (ls & 0xFFFF) as u16,
        )
    }

    /// Whether the version was actually determined.
    #[must_use]
    pub const fn is_known(&self) -> bool {
        self.major != 0
    }
}

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.build, self.revision
        )
    }
}

/// Compiled-in description of the host this build supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProfile {
    /// Expected `ProductName` string in the version resource.
    pub product_name: String,
    /// Expected executable file name, used when the resource check fails.
    pub file_name: String,
    /// Whether the file-name fallback compares with exact case.
    pub file_name_case_sensitive: bool,
    /// Runtime version this build was compiled against.
    pub supported: FileVersion,
    /// Human-facing game patch (`major`, `minor`) matching [`Self::supported`].
    pub supported_patch: (u16, u16),
}

impl HostProfile {
    /// The host this build targets.
    #[must_use]
    pub fn cyberpunk() -> Self {
        Self {
            product_name: "Cyberpunk 2077".to_string(),
            file_name: "Cyberpunk2077.exe".to_string(),
            file_name_case_sensitive: true,
            supported: FileVersion::new(3, 0, 76, 64179),
            supported_patch: (2, 12),
        }
    }

    /// Patch label shown to users, e.g. `2.12`.
    #[must_use]
    pub fn supported_patch_label(&self) -> String {
        let (major, minor) = self.supported_patch;
        format!("{major}.{minor:02}")
    }
}

impl Default for HostProfile {
    fn default() -> Self {
        Self::cyberpunk()
    }
}

/// How the host executable was recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedBy {
    /// A `ProductName` string in the version resource matched.
    ProductName,
    /// The resource check failed but the file name matched.
    FileName,
}

impl fmt::Display for MatchedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProductName => write!(f, "product name"),
            Self::FileName => write!(f, "file name"),
        }
    }
}

/// Identity of a validated host, computed once per process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostIdentity {
    /// Path of the host executable.
    pub executable: PathBuf,
    /// Which check recognised the host.
    pub matched_by: MatchedBy,
    /// Runtime version read from the host.
    pub version: FileVersion,
}
