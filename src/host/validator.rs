//! Startup gate: is this the supported host, at the supported version?
//!
//! ```text
//! Start ──▶ version resource ──ProductName match──▶ Verified
//!                 │ absent / no match
//!                 ▼
//!        Unverified-By-Resource ──file name match──▶ Verified
//!                 │ no match
//!                 ▼
//!              Invalid (fatal)
//!
//! Verified ──▶ runtime version ──major == 0──▶ UnknownVersion (fatal)
//!                    │ != supported ─────────▶ UnsupportedVersion (fatal)
//!                    ▼
//!                  Ready
//! ```
//!
//! There are no retries: every failure is fatal to process startup.
use std::path::Path;

use tracing::{debug, error};

use super::introspect::HostIntrospector;
use super::{FileVersion, HostIdentity, HostProfile, MatchedBy};
use crate::error::StartupError;

/// Outcome of one identification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// The host was recognised.
    Verified(MatchedBy),
    /// The version resource was missing or did not name the host.
    UnverifiedByResource,
    /// Neither the resource nor the file name identified the host.
    Invalid,
}

/// Validates the host executable against a [`HostProfile`].
#[derive(Clone, Copy)]
pub struct HostValidator<'a> {
    profile: &'a HostProfile,
    introspector: &'a dyn HostIntrospector,
}

impl std::fmt::Debug for HostValidator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostValidator")
            .field("profile", self.profile)
            .field("introspector", &"<dyn HostIntrospector>")
            .finish()
    }
}

impl<'a> HostValidator<'a> {
    /// Create a validator for `profile` backed by `introspector`.
    #[must_use]
    pub const fn new(profile: &'a HostProfile, introspector: &'a dyn HostIntrospector) -> Self {
        Self {
            profile,
            introspector,
        }
    }

    /// Match the `ProductName` of every translation in the version resource.
    #[must_use]
    pub fn check_resource(&self, executable: &Path) -> Verification {
        let Some(info) = self.introspector.version_info(executable) else {
            debug!(path = %executable.display(), "no version resource on host");
            return Verification::UnverifiedByResource;
        };

        let matched = info.translations().iter().any(|&translation| {
            info.product_name(translation)
                .is_some_and(|name| name == self.profile.product_name)
        });
        if matched {
            Verification::Verified(MatchedBy::ProductName)
        } else {
            debug!(
                path = %executable.display(),
                translations = info.translations().len(),
                "no translation names the expected product"
            );
            Verification::UnverifiedByResource
        }
    }

    /// Compare the executable's file name with the expected one.
    #[must_use]
    pub fn check_file_name(&self, executable: &Path) -> Verification {
        let expected = self.profile.file_name.as_str();
        let matched = executable
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| {
                if self.profile.file_name_case_sensitive {
                    name == expected
                } else {
                    name.eq_ignore_ascii_case(expected)
                }
            });
        if matched {
            Verification::Verified(MatchedBy::FileName)
        } else {
            Verification::Invalid
        }
    }

    /// Identify the host: version resource first, file name as fallback.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::UnrecognizedHost`] when neither check matches.
    pub fn identify(&self, executable: &Path) -> Result<MatchedBy, StartupError> {
        let state = match self.check_resource(executable) {
            Verification::UnverifiedByResource => self.check_file_name(executable),
            verified => verified,
        };

        match state {
            Verification::Verified(by) => {
                debug!(path = %executable.display(), matched_by = %by, "host recognised");
                Ok(by)
            }
            Verification::UnverifiedByResource | Verification::Invalid => {
                Err(StartupError::UnrecognizedHost {
                    executable: executable.to_path_buf(),
                    expected: self.profile.file_name.clone(),
                })
            }
        }
    }

    /// Require the host's runtime version to equal the supported one.
    ///
    /// # Errors
    ///
    /// Returns [`StartupError::UnknownVersion`] when the version cannot be
    /// determined and [`StartupError::UnsupportedVersion`] when it differs
    /// from [`HostProfile::supported`] in any component.
    pub fn check_version(&self, executable: &Path) -> Result<FileVersion, StartupError> {
        let version = self.introspector.runtime_version(executable);

        if !version.is_known() {
            error!("Unknown game version, update the mod");
            return Err(StartupError::UnknownVersion {
                executable: executable.to_path_buf(),
            });
        }

        if version != self.profile.supported {
            error!(
                found = %version,
                "Unsupported game version! Only {} is supported.",
                self.profile.supported_patch_label()
            );
            return Err(StartupError::UnsupportedVersion {
                found: version,
                supported: self.profile.supported,
            });
        }

        Ok(version)
    }

    /// Run the full gate: identification, then the version check.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`StartupError`] encountered.
    pub fn validate(&self, executable: &Path) -> Result<HostIdentity, StartupError> {
        let matched_by = self.identify(executable)?;
        let version = self.check_version(executable)?;
        Ok(HostIdentity {
            executable: executable.to_path_buf(),
            matched_by,
            version,
        })
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::host::introspect::MockHostIntrospector;
    use crate::host::{Translation, VersionInfo};
    use std::path::PathBuf;

    const EN_US: Translation = Translation::new(0x0409, 0x04B0);
    const DE_DE: Translation = Translation::new(0x0407, 0x04E4);

    fn supported() -> FileVersion {
        HostProfile::cyberpunk().supported
    }

    fn exe(name: &str) -> PathBuf {
        PathBuf::from("games").join("bin").join("x64").join(name)
    }

    fn with_products(products: &[(Translation, &str)]) -> MockHostIntrospector {
        let translations: Vec<Translation> = products.iter().map(|(t, _)| *t).collect();
        let info = VersionInfo::with_products(supported(), &translations, products);
        let mut mock = MockHostIntrospector::new();
        mock.expect_version_info().return_const(Some(info));
        mock.expect_runtime_version().return_const(supported());
        mock
    }

    fn without_resource(version: FileVersion) -> MockHostIntrospector {
        let mut mock = MockHostIntrospector::new();
        mock.expect_version_info().return_const(None);
        mock.expect_runtime_version().return_const(version);
        mock
    }

    // -----------------------------------------------------------------------
    // Identification
    // -----------------------------------------------------------------------

    #[test]
    fn product_name_match_ignores_file_name() {
        let profile = HostProfile::cyberpunk();
        let mock = with_products(&[(EN_US, "Cyberpunk 2077")]);
        let validator = HostValidator::new(&profile, &mock);
        assert_eq!(
            validator.identify(&exe("renamed.exe")).unwrap(),
            MatchedBy::ProductName
        );
    }

    #[test]
    fn product_name_found_in_later_translation() {
        let profile = HostProfile::cyberpunk();
        let mock = with_products(&[(DE_DE, "Something Else"), (EN_US, "Cyberpunk 2077")]);
        let validator = HostValidator::new(&profile, &mock);
        assert_eq!(
            validator.check_resource(&exe("renamed.exe")),
            Verification::Verified(MatchedBy::ProductName)
        );
    }

    #[test]
    fn product_name_comparison_is_case_sensitive() {
        let profile = HostProfile::cyberpunk();
        let mock = with_products(&[(EN_US, "CYBERPUNK 2077")]);
        let validator = HostValidator::new(&profile, &mock);
        assert_eq!(
            validator.check_resource(&exe("renamed.exe")),
            Verification::UnverifiedByResource
        );
    }

    #[test]
    fn wrong_product_falls_back_to_file_name() {
        let profile = HostProfile::cyberpunk();
        let mock = with_products(&[(EN_US, "Notepad")]);
        let validator = HostValidator::new(&profile, &mock);
        assert_eq!(
            validator.identify(&exe("Cyberpunk2077.exe")).unwrap(),
            MatchedBy::FileName
        );
    }

    #[test]
    fn missing_resource_with_matching_file_name() {
        let profile = HostProfile::cyberpunk();
        let mock = without_resource(supported());
        let validator = HostValidator::new(&profile, &mock);
        assert_eq!(
            validator.identify(&exe("Cyberpunk2077.exe")).unwrap(),
            MatchedBy::FileName
        );
    }

    #[test]
    fn file_name_fallback_is_case_sensitive_by_default() {
        let profile = HostProfile::cyberpunk();
        let mock = without_resource(supported());
        let validator = HostValidator::new(&profile, &mock);
        assert_eq!(
            validator.check_file_name(&exe("cyberpunk2077.EXE")),
            Verification::Invalid
        );
    }

    #[test]
    fn file_name_fallback_can_ignore_case() {
        let profile = HostProfile {
            file_name_case_sensitive: false,
            ..HostProfile::cyberpunk()
        };
        let mock = without_resource(supported());
        let validator = HostValidator::new(&profile, &mock);
        assert_eq!(
            validator.check_file_name(&exe("cyberpunk2077.EXE")),
            Verification::Verified(MatchedBy::FileName)
        );
    }

    #[test]
    fn neither_check_matches_is_fatal() {
        let profile = HostProfile::cyberpunk();
        let mock = without_resource(supported());
        let validator = HostValidator::new(&profile, &mock);
        let err = validator.identify(&exe("notepad.exe")).unwrap_err();
        assert!(matches!(err, StartupError::UnrecognizedHost { .. }));
        assert!(err.to_string().starts_with("Not Cyberpunk2077.exe"));
    }

    #[test]
    fn invalid_host_never_reads_runtime_version() {
        let profile = HostProfile::cyberpunk();
        let mut mock = MockHostIntrospector::new();
        mock.expect_version_info().return_const(None);
        mock.expect_runtime_version().times(0);
        let validator = HostValidator::new(&profile, &mock);
        assert!(validator.validate(&exe("notepad.exe")).is_err());
    }

    // -----------------------------------------------------------------------
    // Version gate
    // -----------------------------------------------------------------------

    #[test]
    fn matching_version_is_ready() {
        let profile = HostProfile::cyberpunk();
        let mock = without_resource(supported());
        let validator = HostValidator::new(&profile, &mock);
        let identity = validator.validate(&exe("Cyberpunk2077.exe")).unwrap();
        assert_eq!(identity.version, supported());
        assert_eq!(identity.matched_by, MatchedBy::FileName);
        assert_eq!(identity.executable, exe("Cyberpunk2077.exe"));
    }

    #[test]
    fn zero_major_is_unknown_version() {
        let profile = HostProfile::cyberpunk();
        let mock = without_resource(FileVersion::new(0, 5, 6, 7));
        let validator = HostValidator::new(&profile, &mock);
        let err = validator.check_version(&exe("Cyberpunk2077.exe")).unwrap_err();
        assert!(matches!(err, StartupError::UnknownVersion { .. }));
    }

    #[test]
    fn any_differing_component_is_unsupported() {
        let profile = HostProfile::cyberpunk();
        let base = supported();
        let variants = [
            FileVersion { major: base.major + 1, ..base },
            FileVersion { minor: base.minor + 1, ..base },
            FileVersion { build: base.build - 1, ..base },
            FileVersion { revision: base.revision + 1, ..base },
        ];
        for found in variants {
            let mock = without_resource(found);
            let validator = HostValidator::new(&profile, &mock);
            let err = validator.check_version(&exe("Cyberpunk2077.exe")).unwrap_err();
            assert!(
                matches!(err, StartupError::UnsupportedVersion { found: f, supported: s } if f == found && s == base),
                "{found} should be rejected"
            );
        }
    }
}
