//! Field configuration options.

use serde_json::{Map, Value as JsonValue};

/// Loose truthiness used for configuration options.
///
/// `null`, `false`, `0`, `0.0`, `""`, `"0"` and empty arrays or objects are
/// falsy; everything else is truthy.
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        JsonValue::String(s) => !(s.is_empty() || s == "0"),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(map) => !map.is_empty(),
    }
}

/// String form of a scalar option as it appears in a rule directive.
fn scalar_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(true) => "1".to_string(),
        JsonValue::Bool(false) | JsonValue::Null => String::new(),
        JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                (f as i64).to_string()
            }
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

/// Options attached to a files field (`min`, `max`, `folders`, `related`,
/// `allowed_types`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldConfig {
    options: Map<String, JsonValue>,
}

impl FieldConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value. Anything but an object yields an empty config.
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(options) => Self { options },
            _ => Self::default(),
        }
    }

    /// Set an option.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Get a raw option.
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.options.get(key)
    }

    /// The option as a rule operand, if it is set and truthy.
    fn truthy_operand(&self, key: &str) -> Option<String> {
        self.get(key).filter(|v| is_truthy(v)).map(scalar_to_string)
    }

    /// `min` operand, if set and truthy.
    pub fn min(&self) -> Option<String> {
        self.truthy_operand("min")
    }

    /// `max` operand, if set and truthy.
    pub fn max(&self) -> Option<String> {
        self.truthy_operand("max")
    }

    /// Configured `related` identifier, if non-empty.
    pub fn related(&self) -> Option<&str> {
        self.get("related")
            .and_then(JsonValue::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// The `folders` option as a sequence.
    ///
    /// Missing or null becomes an empty array, a scalar becomes a one-element
    /// array, an object becomes the array of its values.
    pub fn folders_value(&self) -> Vec<JsonValue> {
        match self.get("folders") {
            None | Some(JsonValue::Null) => Vec::new(),
            Some(JsonValue::Array(items)) => items.clone(),
            Some(JsonValue::Object(map)) => map.values().cloned().collect(),
            Some(scalar) => vec![scalar.clone()],
        }
    }

    /// Folder identifiers (ids or slugs) from the `folders` option.
    pub fn folders(&self) -> Vec<String> {
        self.folders_value()
            .iter()
            .map(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Allowed extensions, lower-cased, in configured order.
    ///
    /// Read from `allowed_types`, falling back to `allowed`. Both arrays and
    /// comma-separated strings are accepted.
    pub fn allowed_types(&self) -> Vec<String> {
        let raw = self
            .get("allowed_types")
            .filter(|v| !v.is_null())
            .or_else(|| self.get("allowed"));

        let tokens: Vec<String> = match raw {
            Some(JsonValue::Array(items)) => items.iter().map(scalar_to_string).collect(),
            Some(JsonValue::String(s)) => s.split(',').map(str::to_string).collect(),
            _ => Vec::new(),
        };

        let mut types: Vec<String> = Vec::new();
        for token in tokens {
            let t = token.trim().trim_start_matches('.').to_lowercase();
            if !t.is_empty() && !types.contains(&t) {
                types.push(t);
            }
        }
        types
    }

    /// Copy of this config with `folders` normalized to an array.
    pub fn normalized(&self) -> Self {
        let mut options = self.options.clone();
        options.insert(
            "folders".to_string(),
            JsonValue::Array(self.folders_value()),
        );
        Self { options }
    }

    /// The config as a JSON object. Keys serialize in sorted order.
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Object(self.options.clone())
    }
}

impl From<Map<String, JsonValue>> for FieldConfig {
    fn from(options: Map<String, JsonValue>) -> Self {
        Self { options }
    }
}
