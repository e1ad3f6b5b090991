//! The [`Section`] contract and the typed field reader shared by all sections.
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A JSON object fragment holding one section's fields.
pub type Fragment = Map<String, Value>;

/// A named, independently loadable group of settings.
///
/// Implementations hold a fixed set of typed fields, each with a built-in
/// default given by [`Default`].
pub trait Section: Default {
    /// Top-level key of this section in the settings document.
    const KEY: &'static str;

    /// Overwrite every field present in `fragment` with a compatible value.
    ///
    /// Missing and mismatched fields keep their current value. Never fails.
    fn load(&mut self, fragment: &Fragment);

    /// Project every field into a fresh fragment.
    fn save(&self) -> Fragment;

    /// Reassign every field to its default.
    fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }
}

/// Assign `fragment[key]` to `field` if it deserializes into `T`.
///
/// An absent key is silently skipped. A value of the wrong shape (a string
/// for a boolean, a fraction or out-of-range number for an integer) keeps
/// the current value and is reported at debug level.
pub fn read_field<T: DeserializeOwned>(
    fragment: &Fragment,
    section: &str,
    key: &str,
    field: &mut T,
) {
    let Some(value) = fragment.get(key) else {
        return;
    };
    match T::deserialize(value) {
        Ok(parsed) => *field = parsed,
        Err(e) => tracing::debug!(
            section,
            key,
            found = json_type(value),
            error = %e,
            "ignoring incompatible setting"
        ),
    }
}

/// Like [`read_field`] for an `f32`, also rejecting numbers that do not fit
/// as a finite value.
pub fn read_float(fragment: &Fragment, section: &str, key: &str, field: &mut f32) {
    let mut parsed = *field;
    read_field(fragment, section, key, &mut parsed);
    if parsed.is_finite() {
        *field = parsed;
    } else {
        tracing::debug!(section, key, "ignoring non-finite setting");
    }
}

/// Name of the JSON type of `value`, for diagnostics.
#[must_use]
pub const fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
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
    fn present_compatible_value_is_assigned() {
        let mut flag = false;
        read_field(&fragment(json!({"flag": true})), "s", "flag", &mut flag);
        assert!(flag);
    }

    #[test]
    fn absent_key_keeps_value() {
        let mut flag = true;
        read_field(&fragment(json!({})), "s", "flag", &mut flag);
        assert!(flag);
    }

    #[test]
    fn string_for_bool_keeps_value() {
        let mut flag = false;
        read_field(&fragment(json!({"flag": "yes"})), "s", "flag", &mut flag);
        assert!(!flag);
    }

    #[test]
    fn fraction_for_integer_keeps_value() {
        let mut count: i32 = 3;
        read_field(&fragment(json!({"count": 2.5})), "s", "count", &mut count);
        assert_eq!(count, 3);
    }

    #[test]
    fn negative_for_unsigned_keeps_value() {
        let mut count: u64 = 1000;
        read_field(&fragment(json!({"count": -1})), "s", "count", &mut count);
        assert_eq!(count, 1000);
    }

    #[test]
    fn integer_for_float_is_accepted() {
        let mut size: f32 = 18.0;
        read_field(&fragment(json!({"size": 24})), "s", "size", &mut size);
        assert_eq!(size, 24.0);
    }

    #[test]
    fn float_overflow_keeps_value() {
        let mut size: f32 = 18.0;
        read_float(&fragment(json!({"size": 1e39})), "s", "size", &mut size);
        assert_eq!(size, 18.0);
    }

    #[test]
    fn float_in_range_is_accepted() {
        let mut size: f32 = 18.0;
        read_float(&fragment(json!({"size": 22.5})), "s", "size", &mut size);
        assert_eq!(size, 22.5);
    }

    #[test]
    fn null_keeps_string() {
        let mut name = "Default".to_string();
        read_field(&fragment(json!({"name": null})), "s", "name", &mut name);
        assert_eq!(name, "Default");
    }

    #[test]
    fn json_type_names() {
        assert_eq!(json_type(&json!(null)), "null");
        assert_eq!(json_type(&json!(1)), "number");
        assert_eq!(json_type(&json!([])), "array");
        assert_eq!(json_type(&json!({})), "object");
    }
}
