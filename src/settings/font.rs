//! Overlay font selection and rasterisation parameters.
use serde_json::Value;

use super::section::{Fragment, Section, read_field, read_float};

/// The `font` section.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    /// Font file; empty selects the bundled font.
    pub path: String,
    /// Glyph range preset, e.g. `Default` or `ChineseFull`.
    pub language: String,
    /// Base pixel size.
    pub base_size: f32,
    /// Horizontal oversampling factor.
    pub oversample_horizontal: i32,
    /// Vertical oversampling factor.
    pub oversample_vertical: i32,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            path: String::new(),
            language: "Default".to_string(),
            base_size: 18.0,
            oversample_horizontal: 3,
            oversample_vertical: 1,
        }
    }
}

impl Section for Font {
    const KEY: &'static str = "font";

    fn load(&mut self, fragment: &Fragment) {
        read_field(fragment, Self::KEY, "path", &mut self.path);
        read_field(fragment, Self::KEY, "language", &mut self.language);
        read_float(fragment, Self::KEY, "base_size", &mut self.base_size);
        read_field(fragment, Self::KEY, "oversample_horizontal", &mut self.oversample_horizontal);
        read_field(fragment, Self::KEY, "oversample_vertical", &mut self.oversample_vertical);
    }

    fn save(&self) -> Fragment {
        let mut fragment = Fragment::new();
        fragment.insert("path".into(), Value::from(self.path.as_str()));
        fragment.insert("language".into(), Value::from(self.language.as_str()));
        fragment.insert("base_size".into(), Value::from(self.base_size));
        fragment.insert(
            "oversample_horizontal".into(),
            Value::from(self.oversample_horizontal),
        );
        fragment.insert("oversample_vertical".into(), Value::from(self.oversample_vertical));
        fragment
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fragment(value: Value) -> Fragment {
        match value {
            Value::Object(map) => map,
            _ => Fragment::new(),
        }
    }

    #[test]
    fn defaults() {
        let font = Font::default();
        assert_eq!(font.path, "");
        assert_eq!(font.language, "Default");
        assert_eq!(font.base_size, 18.0);
        assert_eq!(font.oversample_horizontal, 3);
        assert_eq!(font.oversample_vertical, 1);
    }

    #[test]
    fn load_overrides_present_fields() {
        let mut font = Font::default();
        font.load(&fragment(json!({
            "path": "fonts/NotoSans.ttf",
            "base_size": 22.5,
            "oversample_vertical": 2,
        })));
        assert_eq!(font.path, "fonts/NotoSans.ttf");
        assert_eq!(font.base_size, 22.5);
        assert_eq!(font.oversample_vertical, 2);
        assert_eq!(font.language, "Default");
        assert_eq!(font.oversample_horizontal, 3);
    }

    #[test]
    fn mismatched_types_keep_values() {
        let mut font = Font::default();
        font.load(&fragment(json!({
            "language": 7,
            "base_size": "big",
            "oversample_horizontal": 1.5,
        })));
        assert_eq!(font, Font::default());
    }

    #[test]
    fn oversized_base_size_keeps_value() {
        let mut font = Font::default();
        font.load(&fragment(json!({"base_size": 1e39})));
        assert_eq!(font.base_size, 18.0);
        assert_eq!(font.save().get("base_size"), Some(&json!(18.0)));
    }

    #[test]
    fn save_writes_base_size_as_float() {
        let saved = Font::default().save();
        assert_eq!(saved.get("base_size"), Some(&json!(18.0)));
        assert_eq!(saved.get("oversample_horizontal"), Some(&json!(3)));
    }

    #[test]
    fn load_of_save_is_identity() {
        let font = Font {
            path: "custom.ttf".to_string(),
            language: "Japanese".to_string(),
            base_size: 14.0,
            oversample_horizontal: 1,
            oversample_vertical: 4,
        };
        let mut loaded = Font::default();
        loaded.load(&font.save());
        assert_eq!(loaded, font);
    }
}
