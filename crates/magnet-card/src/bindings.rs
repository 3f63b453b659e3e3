//! Externally supplied values seeded into a card's context.

use crate::error::BindingError;
use crate::loader::is_identifier;
use indexmap::IndexMap;
use rhai::{Dynamic, INT};

/// Named values provided by the caller before resolution starts, e.g. a path
/// to already computed benchmark output or a threshold constant.
#[derive(Debug, Clone, Default)]
pub struct Bindings {
    values: IndexMap<String, Dynamic>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a native value; returns the value it replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<Dynamic>,
    ) -> Result<Option<Dynamic>, BindingError> {
        let name = checked_name(name.into())?;
        Ok(self.values.insert(name, value.into()))
    }

    /// Builder form of [`Bindings::insert`].
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Dynamic>) -> Result<Self, BindingError> {
        self.insert(name, value)?;
        Ok(self)
    }

    /// Insert a JSON value, converting objects to maps and arrays to arrays.
    ///
    /// Integers must fit in [`INT`]; they are never widened to floats.
    pub fn insert_json(
        &mut self,
        name: impl Into<String>,
        value: &serde_json::Value,
    ) -> Result<Option<Dynamic>, BindingError> {
        let name = checked_name(name.into())?;
        if let Some(number) = integer_out_of_range(value) {
            return Err(BindingError::Conversion {
                name,
                reason: format!("integer {number} does not fit in a script integer"),
            });
        }
        let value = rhai::serde::to_dynamic(value).map_err(|err| BindingError::Conversion {
            name: name.clone(),
            reason: err.to_string(),
        })?;
        Ok(self.values.insert(name, value))
    }

    /// Build bindings from a JSON object; each key becomes one binding.
    pub fn from_json_object(document: &serde_json::Value) -> Result<Self, BindingError> {
        let object = document
            .as_object()
            .ok_or_else(|| BindingError::NotAnObject(json_kind(document).to_string()))?;
        let mut bindings = Self::new();
        for (name, value) in object {
            bindings.insert_json(name.clone(), value)?;
        }
        Ok(bindings)
    }

    /// Merge `other` into `self`; entries of `other` win.
    pub fn extend(&mut self, other: Bindings) {
        self.values.extend(other.values);
    }

    pub fn get(&self, name: &str) -> Option<&Dynamic> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Bindings in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Dynamic)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn checked_name(name: String) -> Result<String, BindingError> {
    if is_identifier(&name) {
        Ok(name)
    } else {
        Err(BindingError::InvalidName(name))
    }
}

fn integer_out_of_range(value: &serde_json::Value) -> Option<&serde_json::Number> {
    match value {
        serde_json::Value::Number(number) => {
            let fits = match (number.as_i64(), number.as_u64()) {
                (Some(value), _) => INT::try_from(value).is_ok(),
                (None, Some(value)) => INT::try_from(value).is_ok(),
                (None, None) => true,
            };
            (!fits).then_some(number)
        }
        serde_json::Value::Array(items) => items.iter().find_map(integer_out_of_range),
        serde_json::Value::Object(entries) => entries.values().find_map(integer_out_of_range),
        _ => None,
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhai::FLOAT;
    use serde_json::json;

    #[test]
    fn native_and_json_values() {
        let mut bindings = Bindings::new()
            .with("threshold", 0.1 as FLOAT)
            .expect("valid name");
        bindings
            .insert_json("scores", &json!({"m1": 0.51, "m2": 0.69}))
            .expect("json converts");
        bindings.insert_json("count", &json!(3)).expect("json converts");

        assert_eq!(bindings.len(), 3);
        assert_eq!(
            bindings.get("threshold").and_then(|v| v.as_float().ok()),
            Some(0.1)
        );
        assert_eq!(bindings.get("count").and_then(|v| v.as_int().ok()), Some(3 as INT));
        assert!(bindings.get("scores").is_some_and(|v| v.is_map()));
    }

    #[test]
    fn integers_beyond_script_range_are_rejected() {
        let mut bindings = Bindings::new();
        let err = bindings
            .insert_json("big", &json!(u64::MAX))
            .expect_err("u64::MAX does not fit");
        assert_eq!(
            err,
            BindingError::Conversion {
                name: "big".to_string(),
                reason: format!("integer {} does not fit in a script integer", u64::MAX),
            }
        );

        let err = bindings
            .insert_json("nested", &json!({"counts": [1, u64::MAX]}))
            .expect_err("nested u64::MAX does not fit");
        assert!(matches!(err, BindingError::Conversion { ref name, .. } if name == "nested"));
        assert!(bindings.is_empty());

        bindings
            .insert_json("edge", &json!(i64::MAX))
            .expect("i64::MAX fits");
        assert_eq!(bindings.get("edge").and_then(|v| v.as_int().ok()), Some(i64::MAX));
    }

    #[test]
    fn rejects_reserved_word_names() {
        let err = Bindings::new().with("this", 1 as INT).expect_err("reserved word");
        assert_eq!(err, BindingError::InvalidName("this".to_string()));
    }

    #[test]
    fn rejects_invalid_names() {
        let err = Bindings::new().with("data-path", "x").expect_err("invalid name");
        assert_eq!(err, BindingError::InvalidName("data-path".to_string()));
    }

    #[test]
    fn from_json_object_requires_object() {
        let err = Bindings::from_json_object(&json!([1, 2])).expect_err("not an object");
        assert_eq!(err, BindingError::NotAnObject("an array".to_string()));

        let bindings =
            Bindings::from_json_object(&json!({"results_path": "/tmp/run.json"})).expect("object");
        assert!(bindings.contains("results_path"));
    }

    #[test]
    fn extend_overrides_existing_entries() {
        let mut base = Bindings::new().with("x", 1 as INT).expect("valid");
        base.extend(Bindings::new().with("x", 2 as INT).expect("valid"));
        assert_eq!(base.get("x").and_then(|v| v.as_int().ok()), Some(2));
    }
}
