use crate::error::OptionsError;
use crate::resolver::Resolver;
use crate::schema::OptionsAware;
use crate::store::{OptionMap, OptionStore};
use crate::value::Value;
use std::ops::{Deref, DerefMut};

/// An [`OptionStore`] bundled with the [`Resolver`] that validates it.
///
/// Dereferences to the store, so `append`, `get`, indexing and the other store operations
/// are available directly.
///
/// ```rust
/// use knobs::{FieldSpec, Options, SchemaMap, Value};
///
/// # fn main() -> Result<(), knobs::OptionsError> {
/// let mut options = Options::with_options([("domain", "bukalapak.com")])?;
/// options.register_filter("Host", |v: &Value| v.as_str().is_some_and(|s| s.contains('.')))?;
///
/// let schema = SchemaMap::new().field(
///     "domain",
///     FieldSpec::new().required(true).allow_type(["host"]),
/// );
///
/// let resolved = options.resolve_with(&schema)?;
/// assert_eq!(resolved["domain"], Value::from("bukalapak.com"));
/// assert!(options.valid_type("domain", "HOST")?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Options {
    store: OptionStore,
    resolver: Resolver,
}

impl Options {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store from key-value pairs.
    ///
    /// # Errors
    /// Returns [`OptionsError::InvalidArgument`] for the first unusable key.
    pub fn with_options<I, K, V>(options: I) -> Result<Self, OptionsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Ok(Self { store: OptionStore::with_options(options)?, resolver: Resolver::new() })
    }

    #[must_use]
    pub const fn from_parts(store: OptionStore, resolver: Resolver) -> Self {
        Self { store, resolver }
    }

    #[must_use]
    pub fn into_parts(self) -> (OptionStore, Resolver) {
        (self.store, self.resolver)
    }

    #[must_use]
    pub const fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// # Errors
    /// Returns [`OptionsError::UnexpectedValue`] if the name is empty or whitespace only.
    pub fn register_filter<F>(&mut self, name: impl AsRef<str>, predicate: F) -> Result<(), OptionsError>
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.resolver.register_filter(name, predicate)
    }

    /// Checks the stored value of `key` against the named filter.
    ///
    /// # Errors
    /// Returns [`OptionsError::UnexpectedValue`] if the key is present and the filter unknown.
    pub fn valid_type(&self, key: &str, filter: &str) -> Result<bool, OptionsError> {
        self.resolver.filters().check(&self.store, key, filter)
    }

    /// # Errors
    /// See [`Resolver::resolve`].
    pub fn resolve(&mut self, provider: Option<&dyn OptionsAware>) -> Result<OptionMap, OptionsError> {
        self.resolver.resolve(&mut self.store, provider)
    }

    /// # Errors
    /// See [`Resolver::resolve_with`].
    pub fn resolve_with<P>(&mut self, provider: &P) -> Result<OptionMap, OptionsError>
    where
        P: OptionsAware + ?Sized,
    {
        self.resolver.resolve_with(&mut self.store, provider)
    }
}

impl Deref for Options {
    type Target = OptionStore;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl DerefMut for Options {
    fn deref_mut(&mut self) -> &mut OptionStore {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, SchemaMap};

    #[test]
    fn store_operations_are_reachable_through_deref() {
        let mut options = Options::new();
        options.append("port", 443).unwrap();

        assert!(options.has("port"));
        assert_eq!(options["port"], Value::Int(443));

        options.append("port", 80).unwrap();
        assert_eq!(options["port"], Value::Int(80));
        options.remove("port");
        assert!(options.is_empty());
    }

    #[test]
    fn filters_registered_on_facade_apply_to_resolution() {
        let mut options = Options::with_options([("flag", "yes")]).unwrap();
        options
            .register_filter("yesno", |v: &Value| matches!(v.as_str(), Some("yes" | "no")))
            .unwrap();

        let schema = SchemaMap::new().field("flag", FieldSpec::new().allow_type(["YesNo"]));
        assert!(options.resolve_with(&schema).is_ok());
    }

    #[test]
    fn resolve_without_provider_returns_store() {
        let mut options = Options::with_options([("a", 1), ("b", 2)]).unwrap();
        let resolved = options.resolve(None).unwrap();
        assert_eq!(resolved.keys().collect::<Vec<_>>(), ["a", "b"]);
    }
}
