//! Declarative option schemas.
//!
//! A [`SchemaMap`] lists the options a consumer understands, in the order they are
//! validated. Each option is described by a [`FieldSpec`] whose flags are all optional.

use crate::store::OptionStore;
use crate::value::Value;
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;

/// Computes the replacement value of an option during resolution.
///
/// Receives the live store (so it may read or write other options) and the option's current
/// value, `None` if it is absent. Returning `None` removes the option.
pub type Normalizer = Arc<dyn Fn(&mut OptionStore, Option<Value>) -> Option<Value> + Send + Sync>;

/// Validation, default and normalization rules for one option.
///
/// ```rust
/// use knobs::{FieldSpec, Value};
///
/// let spec = FieldSpec::new()
///     .required(true)
///     .allow_value(["tokopedia.com", "bukalapak.com"])
///     .allow_type(["string"])
///     .normalize(|_, value| match value {
///         Some(Value::Str(host)) if host == "bukalapak.com" => Some("tokopedia.com".into()),
///         other => other,
///     });
///
/// assert!(spec.is_required());
/// assert_eq!(spec.allowed_types(), Some(&["string".to_owned()][..]));
/// ```
#[derive(Clone, Default)]
pub struct FieldSpec {
    default: Option<Value>,
    required: bool,
    allow_value: Option<Vec<Value>>,
    allow_type: Option<Vec<String>>,
    normalize: Option<Normalizer>,
}

impl FieldSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value written into the store when the option is absent before validation.
    #[must_use = "FieldSpec setters return the updated spec"]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use = "FieldSpec setters return the updated spec"]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Values the option may take. A single value is passed as a one-element collection.
    #[must_use = "FieldSpec setters return the updated spec"]
    pub fn allow_value<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.allow_value = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Names of type filters; the value must satisfy at least one.
    #[must_use = "FieldSpec setters return the updated spec"]
    pub fn allow_type<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allow_type = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use = "FieldSpec setters return the updated spec"]
    pub fn normalize<F>(mut self, normalizer: F) -> Self
    where
        F: Fn(&mut OptionStore, Option<Value>) -> Option<Value> + Send + Sync + 'static,
    {
        self.normalize = Some(Arc::new(normalizer));
        self
    }

    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    #[must_use]
    pub const fn is_required(&self) -> bool {
        self.required
    }

    #[must_use]
    pub fn allowed_values(&self) -> Option<&[Value]> {
        self.allow_value.as_deref()
    }

    #[must_use]
    pub fn allowed_types(&self) -> Option<&[String]> {
        self.allow_type.as_deref()
    }

    #[must_use]
    pub const fn normalizer(&self) -> Option<&Normalizer> {
        self.normalize.as_ref()
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("default", &self.default)
            .field("required", &self.required)
            .field("allow_value", &self.allow_value)
            .field("allow_type", &self.allow_type)
            .field("normalize", &self.normalize.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Ordered mapping from option key to its [`FieldSpec`].
#[derive(Debug, Clone, Default)]
pub struct SchemaMap {
    fields: IndexMap<String, FieldSpec>,
}

impl SchemaMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a field, keeping its first position.
    #[must_use = "SchemaMap::field returns the extended schema"]
    pub fn field(mut self, key: impl Into<String>, spec: FieldSpec) -> Self {
        self.insert(key, spec);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, spec: FieldSpec) -> Option<FieldSpec> {
        self.fields.insert(key.into(), spec)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields.get(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, FieldSpec> {
        self.fields.iter()
    }
}

impl<'a> IntoIterator for &'a SchemaMap {
    type Item = (&'a String, &'a FieldSpec);
    type IntoIter = indexmap::map::Iter<'a, String, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<K: Into<String>> FromIterator<(K, FieldSpec)> for SchemaMap {
    fn from_iter<I: IntoIterator<Item = (K, FieldSpec)>>(iter: I) -> Self {
        Self { fields: iter.into_iter().map(|(key, spec)| (key.into(), spec)).collect() }
    }
}

/// A consumer that declares which options it understands.
///
/// The resolver calls [`OptionsAware::options_map`] once per resolution.
pub trait OptionsAware {
    fn options_map(&self) -> SchemaMap;
}

impl OptionsAware for SchemaMap {
    fn options_map(&self) -> SchemaMap {
        self.clone()
    }
}

impl<F> OptionsAware for F
where
    F: Fn() -> SchemaMap,
{
    fn options_map(&self) -> SchemaMap {
        self()
    }
}
