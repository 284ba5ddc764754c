use crate::error::OptionsError;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;
use std::ops::Index;

/// Ordered option mapping as returned by resolution.
pub type OptionMap = IndexMap<String, Value>;

/// Insertion-ordered key-value container for option values.
///
/// A key is present only while it holds a value; removal deletes the entry outright.
/// `store["key"]` reads; writes go through [`OptionStore::append`], which inserts or
/// overwrites, and [`OptionStore::get_mut`] edits an existing value in place.
///
/// ```rust
/// use knobs::{OptionStore, Value};
///
/// # fn main() -> Result<(), knobs::OptionsError> {
/// let mut store = OptionStore::new();
/// store.append("domain", "tokopedia.com")?;
/// store.append("port", 443)?;
///
/// assert_eq!(store["port"], Value::Int(443));
/// assert_eq!(store.get_or("schema", &Value::from("http")), &Value::from("http"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct OptionStore {
    options: OptionMap,
}

impl OptionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store by appending every pair in order.
    ///
    /// # Errors
    /// Returns [`OptionsError::InvalidArgument`] for the first unusable key.
    pub fn with_options<I, K, V>(options: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut store = Self::new();
        store.set(options)?;
        Ok(store)
    }

    /// Stores `value` under `key`, replacing any previous value in place.
    ///
    /// # Errors
    /// Returns [`OptionsError::InvalidArgument`] if the key is empty or whitespace only.
    pub fn append(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), OptionsError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(OptionsError::invalid_argument(format!(
                "Invalid options key \"{key}\", blank keys are not accepted by this store"
            )));
        }
        self.options.insert(key, value.into());
        Ok(())
    }

    /// Appends every pair in iteration order, stopping at the first invalid key.
    ///
    /// # Errors
    /// See [`OptionStore::append`].
    pub fn set<I, K, V>(&mut self, options: I) -> Result<(), OptionsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        options.into_iter().try_for_each(|(key, value)| self.append(key, value))
    }

    /// Removes `key`, keeping the relative order of the remaining options.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.options.shift_remove(key)
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    #[must_use]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.options.get_mut(key)
    }

    /// Returns the stored value, or `fallback` when the key is absent.
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, fallback: &'a Value) -> &'a Value {
        self.options.get(key).unwrap_or(fallback)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Value> {
        self.options.iter()
    }

    #[must_use]
    pub const fn as_map(&self) -> &OptionMap {
        &self.options
    }

    /// Snapshot of the current mapping.
    #[must_use]
    pub fn to_map(&self) -> OptionMap {
        self.options.clone()
    }

    #[must_use]
    pub fn into_map(self) -> OptionMap {
        self.options
    }
}

impl Index<&str> for OptionStore {
    type Output = Value;

    /// # Panics
    /// Panics if `key` is absent; use [`OptionStore::get`] for a fallible read.
    fn index(&self, key: &str) -> &Value {
        self.options
            .get(key)
            .unwrap_or_else(|| panic!("option \"{key}\" is not set"))
    }
}

impl<'a> IntoIterator for &'a OptionStore {
    type Item = (&'a String, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.iter()
    }
}

impl IntoIterator for OptionStore {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.into_iter()
    }
}

impl TryFrom<OptionMap> for OptionStore {
    type Error = OptionsError;

    fn try_from(map: OptionMap) -> Result<Self, Self::Error> {
        Self::with_options(map)
    }
}

impl TryFrom<serde_json::Value> for OptionStore {
    type Error = OptionsError;

    /// Accepts a JSON object; every other shape has no option keys and is rejected.
    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        let map = match value {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(OptionsError::invalid_argument(format!(
                    "Invalid options input, expect an object, {} given",
                    json_kind(&other)
                )));
            },
        };

        let mut store = Self::new();
        for (key, item) in map {
            let item = Value::try_from(item).map_err(|e| e.with_context(format!("key \"{key}\"")))?;
            store.append(key, item)?;
        }
        Ok(store)
    }
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn append_overwrites_in_place() {
        let mut store = OptionStore::with_options([("a", 1), ("b", 2)]).unwrap();
        store.append("a", 10).unwrap();

        assert_eq!(store.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(store["a"], Value::Int(10));
    }

    #[test]
    fn append_rejects_blank_keys() {
        let mut store = OptionStore::new();
        let err = store.append("  ", true).unwrap_err();

        assert!(matches!(err, OptionsError::InvalidArgument { .. }));
        assert_eq!(
            err.to_string(),
            "Invalid argument: Invalid options key \"  \", blank keys are not accepted by this store"
        );
        assert!(store.is_empty());
    }

    #[test]
    fn set_stops_at_first_invalid_key() {
        let mut store = OptionStore::new();
        let result = store.set([("first", 1), ("", 2), ("third", 3)]);

        assert!(result.is_err());
        assert_eq!(store.keys().collect::<Vec<_>>(), ["first"]);
    }

    #[test]
    fn remove_is_a_noop_for_absent_keys() {
        let mut store = OptionStore::with_options([("a", 1), ("b", 2), ("c", 3)]).unwrap();

        assert_eq!(store.remove("missing"), None);
        assert_eq!(store.remove("b"), Some(Value::Int(2)));
        assert_eq!(store.keys().collect::<Vec<_>>(), ["a", "c"]);
        assert!(!store.has("b"));
    }

    #[test]
    fn get_mut_edits_in_place() {
        let mut store = OptionStore::with_options([("port", 80), ("schema", 1)]).unwrap();
        if let Some(port) = store.get_mut("port") {
            *port = Value::Int(8080);
        }
        assert_eq!(store.get("port"), Some(&Value::Int(8080)));
        assert!(store.get_mut("missing").is_none());
    }

    #[test]
    #[should_panic(expected = "option \"missing\" is not set")]
    fn index_read_panics_on_absent_key() {
        let store = OptionStore::new();
        let _ = &store["missing"];
    }

    #[test]
    fn json_input_must_be_an_object() {
        let store = OptionStore::try_from(json!({ "domain": "tokopedia.com", "port": 443 })).unwrap();
        assert_eq!(store.len(), 2);

        let err = OptionStore::try_from(json!(["domain"])).unwrap_err();
        assert!(matches!(err, OptionsError::InvalidArgument { .. }));
        assert!(err.to_string().contains("array given"));
    }

    #[test]
    fn null_json_values_carry_the_key_as_context() {
        let err = OptionStore::try_from(json!({ "port": null })).unwrap_err();
        assert_eq!(err.context_message(), Some("key \"port\""));
    }
}
