//! Section-based settings persisted as a JSON document.
//!
//! The document maps each section key to an object of fields:
//!
//! ```json
//! {
//!     "developer": { "enable_jit": true, ... },
//!     "font": { "base_size": 18.0, ... },
//!     "patches": { "disable_vignette": false, ... }
//! }
//! ```
//!
//! Loading tolerates missing, partial and corrupt documents: anything that
//! cannot be used leaves the in-memory value untouched. Saving always writes
//! the complete document.

pub mod developer;
pub mod font;
pub mod patches;
pub mod section;

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize as _;
use serde_json::Value;
use tracing::{debug, warn};

pub use developer::Developer;
pub use font::Font;
pub use patches::Patches;
pub use section::{Fragment, Section};
use section::json_type;

use crate::error::SettingsError;
use crate::paths::Paths;

/// Indentation of the written document.
const INDENT: &[u8] = b"    ";

/// Byte order mark some editors prepend to UTF-8 files.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// In-memory settings and the location of their document.
#[derive(Debug, Clone)]
pub struct Settings {
    paths: Paths,
    patches: Patches,
    font: Font,
    developer: Developer,
}

impl Settings {
    /// Create a store with every section at its defaults. Touches no files.
    #[must_use]
    pub fn new(paths: Paths) -> Self {
        Self {
            paths,
            patches: Patches::default(),
            font: Font::default(),
            developer: Developer::default(),
        }
    }

    /// Merge the on-disk document into the current values.
    ///
    /// A missing or unreadable file is not an error. An unparsable document
    /// logs a single warning and keeps the current values.
    pub fn load(&mut self) {
        let config = self.paths.config();
        let Some(path) = self.paths.resolve(&config, Path::new(""), false) else {
            debug!(path = %config.display(), "no settings document, keeping defaults");
            return;
        };

        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot read settings document");
                return;
            }
        };

        let text = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes.as_slice());
        let document = match serde_json::from_slice::<Value>(text) {
            Ok(Value::Object(document)) => document,
            Ok(other) => {
                warn!(
                    path = %path.display(),
                    found = json_type(&other),
                    "Failed to parse config.json, using default config instead."
                );
                return;
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse config.json, using default config instead."
                );
                return;
            }
        };

        load_section(&mut self.patches, &document);
        load_section(&mut self.font, &document);
        load_section(&mut self.developer, &document);
        debug!(path = %path.display(), "settings loaded");
    }

    /// The complete document for the current values.
    #[must_use]
    pub fn document(&self) -> Value {
        let mut document = Fragment::new();
        document.insert(Patches::KEY.into(), Value::Object(self.patches.save()));
        document.insert(Font::KEY.into(), Value::Object(self.font.save()));
        document.insert(Developer::KEY.into(), Value::Object(self.developer.save()));
        Value::Object(document)
    }

    /// Render the document as 4-space indented JSON with a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Serialize`] if serialization fails.
    pub fn render(&self) -> Result<String, SettingsError> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.document().serialize(&mut serializer)?;
        out.push(b'\n');
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Write the complete document, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Unresolved`] if no writable path can be
    /// produced, [`SettingsError::Serialize`] if rendering fails, and
    /// [`SettingsError::Io`] if the file cannot be written.
    pub fn try_save(&self) -> Result<PathBuf, SettingsError> {
        let config = self.paths.config();
        let path = self
            .paths
            .resolve(&config, Path::new(""), true)
            .ok_or(SettingsError::Unresolved { path: config })?;
        let text = self.render()?;
        fs::write(&path, text).map_err(|source| SettingsError::Io {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "settings saved");
        Ok(path)
    }

    /// Write the complete document, logging a warning on failure.
    ///
    /// Returns whether the document was written.
    pub fn save(&self) -> bool {
        match self.try_save() {
            Ok(_) => true,
            Err(e) => {
                warn!(path = %self.paths.config().display(), error = %e, "Failed to save settings");
                false
            }
        }
    }

    /// Reset every section to its defaults and save immediately.
    ///
    /// Returns whether the reset was written to disk.
    pub fn reset_to_defaults(&mut self) -> bool {
        self.patches.reset_to_defaults();
        self.font.reset_to_defaults();
        self.developer.reset_to_defaults();
        self.save()
    }

    /// Whether overlay assertions should abort instead of being ignored.
    #[must_use]
    pub const fn assertions_enabled(&self) -> bool {
        self.developer.enable_imgui_assertions
    }

    /// Paths used to locate the document.
    #[must_use]
    pub const fn paths(&self) -> &Paths {
        &self.paths
    }

    /// The `patches` section.
    #[must_use]
    pub const fn patches(&self) -> &Patches {
        &self.patches
    }

    /// The `font` section.
    #[must_use]
    pub const fn font(&self) -> &Font {
        &self.font
    }

    /// The `developer` section.
    #[must_use]
    pub const fn developer(&self) -> &Developer {
        &self.developer
    }

    /// Mutable `patches` section.
    pub const fn patches_mut(&mut self) -> &mut Patches {
        &mut self.patches
    }

    /// Mutable `font` section.
    pub const fn font_mut(&mut self) -> &mut Font {
        &mut self.font
    }

    /// Mutable `developer` section.
    pub const fn developer_mut(&mut self) -> &mut Developer {
        &mut self.developer
    }
}

/// Dispatch the fragment under `S::KEY` to `section`, if usable.
///
/// A fragment that is not an object, or is an empty object, is treated as
/// absent.
fn load_section<S: Section>(section: &mut S, document: &Fragment) {
    match document.get(S::KEY) {
        Some(Value::Object(fragment)) if !fragment.is_empty() => section.load(fragment),
        Some(Value::Object(_)) | None => {}
        Some(other) => debug!(
            section = S::KEY,
            found = json_type(other),
            "ignoring non-object section"
        ),
    }
}

#[cfg(test)]
#[allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::float_cmp,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::logging::{capture, count_at};
    use serde_json::json;

    struct Fixture {
        _dir: tempfile::TempDir,
        settings: Settings,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().expect("tempdir");
            let paths = Paths::from_executable(dir.path().join("bin/x64/Cyberpunk2077.exe"));
            Self {
                settings: Settings::new(paths),
                _dir: dir,
            }
        }

        fn write(&self, contents: impl AsRef<[u8]>) {
            let config = self.settings.paths().config();
            fs::create_dir_all(config.parent().expect("parent")).expect("mkdir");
            fs::write(config, contents).expect("write");
        }

        fn read(&self) -> String {
            fs::read_to_string(self.settings.paths().config()).expect("read")
        }
    }

    #[test]
    fn new_has_defaults_and_no_file() {
        let fx = Fixture::new();
        assert_eq!(fx.settings.patches(), &Patches::default());
        assert_eq!(fx.settings.font(), &Font::default());
        assert_eq!(fx.settings.developer(), &Developer::default());
        assert!(!fx.settings.paths().config().exists());
    }

    #[test]
    fn load_without_file_keeps_defaults() {
        let mut fx = Fixture::new();
        let (events, _guard) = capture();
        fx.settings.load();
        assert_eq!(fx.settings.developer(), &Developer::default());
        assert_eq!(count_at(&events, tracing::Level::WARN), 0);
    }

    #[test]
    fn invalid_document_warns_once() {
        let mut fx = Fixture::new();
        fx.write("{ this is not json");
        let (events, _guard) = capture();
        fx.settings.load();
        assert_eq!(count_at(&events, tracing::Level::WARN), 1);
        assert_eq!(fx.settings.font(), &Font::default());
    }

    #[test]
    fn empty_document_warns_once() {
        let mut fx = Fixture::new();
        fx.write("");
        let (events, _guard) = capture();
        fx.settings.load();
        assert_eq!(count_at(&events, tracing::Level::WARN), 1);
        assert_eq!(fx.settings.patches(), &Patches::default());
    }

    #[test]
    fn non_utf8_document_warns_once() {
        let mut fx = Fixture::new();
        fx.write([0xFF, 0xFE, b'{', b'}']);
        let (events, _guard) = capture();
        fx.settings.load();
        assert_eq!(count_at(&events, tracing::Level::WARN), 1);
        assert_eq!(fx.settings.patches(), &Patches::default());
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let mut fx = Fixture::new();
        fx.write([UTF8_BOM, br#"{"patches": {"disable_vignette": true}}"#.as_slice()].concat());
        let (events, _guard) = capture();
        fx.settings.load();
        assert_eq!(count_at(&events, tracing::Level::WARN), 0);
        assert!(fx.settings.patches().disable_vignette);
    }

    #[test]
    fn non_object_document_warns_once() {
        let mut fx = Fixture::new();
        fx.write("[1, 2, 3]");
        let (events, _guard) = capture();
        fx.settings.load();
        assert_eq!(count_at(&events, tracing::Level::WARN), 1);
    }

    #[test]
    fn partial_document_touches_only_named_fields() {
        let mut fx = Fixture::new();
        fx.write(r#"{"patches": {"disable_vignette": true}, "unknown": 1}"#);
        fx.settings.load();
        assert!(fx.settings.patches().disable_vignette);
        assert!(!fx.settings.patches().disable_antialiasing);
        assert_eq!(fx.settings.font(), &Font::default());
        assert_eq!(fx.settings.developer(), &Developer::default());
    }

    #[test]
    fn missing_section_leaves_current_values() {
        let mut fx = Fixture::new();
        fx.settings.font_mut().base_size = 30.0;
        fx.write(r#"{"developer": {"enable_jit": false}}"#);
        fx.settings.load();
        assert_eq!(fx.settings.font().base_size, 30.0);
        assert!(!fx.settings.developer().enable_jit);
    }

    #[test]
    fn non_object_and_empty_sections_are_ignored() {
        let mut fx = Fixture::new();
        fx.settings.patches_mut().disable_async_compute = true;
        fx.write(r#"{"patches": {}, "font": "big", "developer": [true]}"#);
        fx.settings.load();
        assert!(fx.settings.patches().disable_async_compute);
        assert_eq!(fx.settings.font(), &Font::default());
        assert_eq!(fx.settings.developer(), &Developer::default());
    }

    #[test]
    fn type_mismatch_keeps_value() {
        let mut fx = Fixture::new();
        fx.write(r#"{"developer": {"enable_jit": "no", "max_lines_console_history": 12}}"#);
        fx.settings.load();
        assert!(fx.settings.developer().enable_jit);
        assert_eq!(fx.settings.developer().max_lines_console_history, 12);
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut fx = Fixture::new();
        fx.settings.patches_mut().disable_boundary_teleport = true;
        fx.settings.font_mut().language = "Korean".to_string();
        fx.settings.developer_mut().max_lines_console_history = 50;
        assert!(fx.settings.save());

        let mut reloaded = Settings::new(fx.settings.paths().clone());
        reloaded.load();
        assert_eq!(reloaded.patches(), fx.settings.patches());
        assert_eq!(reloaded.font(), fx.settings.font());
        assert_eq!(reloaded.developer(), fx.settings.developer());
    }

    #[test]
    fn save_writes_four_space_indent_and_newline() {
        let fx = Fixture::new();
        let path = fx.settings.try_save().expect("save");
        assert_eq!(path, fx.settings.paths().config());
        let text = fx.read();
        assert!(text.ends_with("}\n"));
        assert!(text.contains("\n    \"developer\": {\n        \"dump_game_options\": false,"));
    }

    #[test]
    fn document_has_three_sections() {
        let fx = Fixture::new();
        let document = fx.settings.document();
        assert_eq!(document["patches"]["disable_vignette"], json!(false));
        assert_eq!(document["font"]["language"], json!("Default"));
        assert_eq!(document["developer"]["max_lines_console_history"], json!(1000));
    }

    #[test]
    fn reset_to_defaults_is_durable() {
        let mut fx = Fixture::new();
        fx.settings.developer_mut().enable_imgui_assertions = true;
        fx.settings.font_mut().oversample_vertical = 8;
        assert!(fx.settings.save());

        assert!(fx.settings.reset_to_defaults());
        let on_disk: Value = serde_json::from_str(&fx.read()).expect("json");
        assert_eq!(on_disk, Settings::new(fx.settings.paths().clone()).document());
    }

    #[test]
    fn assertions_flag_follows_developer_section() {
        let mut fx = Fixture::new();
        assert!(!fx.settings.assertions_enabled());
        fx.write(r#"{"developer": {"enable_imgui_assertions": true}}"#);
        fx.settings.load();
        assert!(fx.settings.assertions_enabled());
    }

    #[test]
    fn save_failure_warns_and_returns_false() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file, not a directory").expect("write");
        let paths = Paths::from_executable(dir.path().join("bin/x64/Cyberpunk2077.exe"))
            .with_own_root(blocker.join("plugin"));
        let settings = Settings::new(paths);

        let (events, _guard) = capture();
        assert!(!settings.save());
        assert_eq!(count_at(&events, tracing::Level::WARN), 1);
        assert!(matches!(
            settings.try_save(),
            Err(SettingsError::Unresolved { .. })
        ));
    }
}
