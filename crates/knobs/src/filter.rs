use crate::error::OptionsError;
use crate::store::OptionStore;
use crate::value::Value;
use fxhash::FxHashMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Predicate deciding whether a value belongs to a semantic type.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

const BUILTIN_FILTERS: [(&str, fn(&Value) -> bool); 5] = [
    ("string", Value::is_str),
    ("bool", Value::is_bool),
    ("object", Value::is_object),
    ("int", Value::is_int),
    ("float", Value::is_float),
];

/// Named type filters, keyed by lowercase name.
///
/// [`FilterRegistry::default`] is pre-seeded with `string`, `bool`, `object`, `int` and
/// `float`. Registrations are case-insensitive and may overwrite built-ins.
///
/// ```rust
/// use knobs::{FilterRegistry, OptionStore, Value};
///
/// # fn main() -> Result<(), knobs::OptionsError> {
/// let mut filters = FilterRegistry::default();
/// filters.register("Port", |v: &Value| v.as_i64().is_some_and(|p| (1..=65_535).contains(&p)))?;
///
/// let store = OptionStore::with_options([("port", 443)])?;
/// assert!(filters.check(&store, "port", "PORT")?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FilterRegistry {
    filters: FxHashMap<String, Predicate>,
}

impl FilterRegistry {
    /// Registry without any filters.
    #[must_use]
    pub fn empty() -> Self {
        Self { filters: FxHashMap::default() }
    }

    /// Registers `predicate` under the lowercased `name`, replacing any previous filter.
    ///
    /// # Errors
    /// Returns [`OptionsError::UnexpectedValue`] if the name is empty or whitespace only.
    pub fn register<F>(&mut self, name: impl AsRef<str>, predicate: F) -> Result<(), OptionsError>
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        let raw = name.as_ref();
        if raw.trim().is_empty() {
            return Err(OptionsError::unexpected_value(format!(
                "Invalid filter name \"{raw}\", expect a non-empty string"
            )));
        }

        let name = raw.to_lowercase();
        let replaced = self.filters.insert(name.clone(), Arc::new(predicate)).is_some();
        trace!(filter = %name, replaced, "Registered type filter");
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.filters.contains_key(&name.to_lowercase())
    }

    /// Registered filter names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.keys().map(String::as_str)
    }

    /// Applies the named filter to `value`.
    ///
    /// # Errors
    /// Returns [`OptionsError::UnexpectedValue`] if no filter is registered under `name`.
    pub fn test(&self, name: &str, value: &Value) -> Result<bool, OptionsError> {
        let name = name.to_lowercase();
        let predicate = self.filters.get(&name).ok_or_else(|| {
            OptionsError::unexpected_value(format!("Unknown filter for type \"{name}\""))
        })?;
        Ok(predicate(value))
    }

    /// Applies the named filter to the value stored under `key`.
    ///
    /// An absent key never satisfies a filter and is reported as `false` before the filter
    /// name is looked up.
    ///
    /// # Errors
    /// Returns [`OptionsError::UnexpectedValue`] if the key is present and no filter is
    /// registered under `name`.
    pub fn check(&self, store: &OptionStore, key: &str, name: &str) -> Result<bool, OptionsError> {
        match store.get(key) {
            Some(value) => self.test(name, value),
            None => Ok(false),
        }
    }
}

impl Default for FilterRegistry {
    fn default() -> Self {
        let filters = BUILTIN_FILTERS
            .into_iter()
            .map(|(name, predicate)| (name.to_owned(), Arc::new(predicate) as Predicate))
            .collect();
        Self { filters }
    }
}

impl fmt::Debug for FilterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.names().collect();
        names.sort_unstable();
        f.debug_struct("FilterRegistry").field("filters", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> OptionStore {
        let mut store = OptionStore::new();
        store
            .set([
                ("name", Value::from("knobs")),
                ("debug", Value::from(true)),
                ("port", Value::from(443)),
                ("ratio", Value::from(0.5)),
            ])
            .unwrap();
        store
    }

    #[test]
    fn builtins_cover_primitive_types() {
        let filters = FilterRegistry::default();
        let store = store();

        assert!(filters.check(&store, "name", "string").unwrap());
        assert!(filters.check(&store, "debug", "bool").unwrap());
        assert!(filters.check(&store, "port", "int").unwrap());
        assert!(filters.check(&store, "ratio", "float").unwrap());
        assert!(!filters.check(&store, "port", "float").unwrap());
        assert!(filters.test("object", &Value::object(7_u8)).unwrap());
    }

    #[test]
    fn absent_key_is_false_even_for_unknown_filter() {
        let filters = FilterRegistry::default();
        assert!(!filters.check(&store(), "missing", "nope").unwrap());
    }

    #[test]
    fn unknown_filter_is_unexpected_value() {
        let err = FilterRegistry::default().check(&store(), "name", "uuid").unwrap_err();
        assert!(matches!(err, OptionsError::UnexpectedValue { .. }));
        assert!(err.to_string().contains("Unknown filter for type \"uuid\""));
    }

    #[test]
    fn registration_is_case_insensitive_and_overwrites() {
        let mut filters = FilterRegistry::default();
        filters.register("STRING", |v: &Value| v.as_str().is_some_and(|s| !s.is_empty())).unwrap();

        assert!(filters.contains("String"));
        assert!(!filters.test("string", &Value::from("")).unwrap());
        assert_eq!(filters.names().count(), BUILTIN_FILTERS.len());
    }

    #[test]
    fn blank_filter_name_is_rejected() {
        let mut filters = FilterRegistry::empty();
        let err = filters.register("", |_: &Value| true).unwrap_err();
        assert!(matches!(err, OptionsError::UnexpectedValue { .. }));
    }
}
