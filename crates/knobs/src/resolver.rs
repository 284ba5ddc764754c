//! Schema-driven option resolution.
//!
//! For every schema entry, in schema order, the [`Resolver`] runs a fixed sequence:
//!
//! 1. **Default**: an absent option receives the field's default value.
//! 2. **Required**: a required option that is still absent fails with
//!    [`OptionsError::MissingRequired`].
//! 3. **Allow-value**: a present option must loosely equal one of the allowed values
//!    ([`OptionsError::InvalidValue`]).
//! 4. **Allow-type**: the option must satisfy at least one listed type filter
//!    ([`OptionsError::InvalidType`]); every listed filter is evaluated so unknown names
//!    surface as [`OptionsError::UnexpectedValue`].
//! 5. **Normalize**: the normalizer's result replaces the stored value before the next
//!    entry is visited.
//!
//! The first failure ends the pass. Work already committed to the store (defaults and
//! normalized values of earlier entries) is not rolled back.

use crate::error::OptionsError;
use crate::filter::FilterRegistry;
use crate::schema::{FieldSpec, OptionsAware, SchemaMap};
use crate::store::{OptionMap, OptionStore};
use crate::value::Value;
use tracing::{debug, trace, trace_span};

/// Validates and normalizes an [`OptionStore`] against schemas, using its own filter registry.
///
/// ```rust
/// use knobs::{FieldSpec, OptionStore, Resolver, SchemaMap, Value};
///
/// # fn main() -> Result<(), knobs::OptionsError> {
/// let schema = SchemaMap::new()
///     .field("schema", FieldSpec::new().with_default("http").allow_value(["http", "https"]))
///     .field("port", FieldSpec::new().normalize(|store, port| {
///         port.or_else(|| match store.get("schema")?.as_str()? {
///             "https" => Some(Value::Int(443)),
///             _ => Some(Value::Int(80)),
///         })
///     }));
///
/// let resolver = Resolver::new();
///
/// let mut store = OptionStore::with_options([("schema", "https")])?;
/// assert_eq!(resolver.resolve_with(&mut store, &schema)?["port"], Value::Int(443));
///
/// let mut store = OptionStore::new();
/// let resolved = resolver.resolve_with(&mut store, &schema)?;
/// assert_eq!(resolved["schema"], Value::from("http"));
/// assert_eq!(resolved["port"], Value::Int(80));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    filters: FilterRegistry,
}

impl Resolver {
    /// Resolver with the built-in type filters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_filters(filters: FilterRegistry) -> Self {
        Self { filters }
    }

    #[must_use]
    pub const fn filters(&self) -> &FilterRegistry {
        &self.filters
    }

    pub const fn filters_mut(&mut self) -> &mut FilterRegistry {
        &mut self.filters
    }

    /// Shorthand for [`FilterRegistry::register`] on the owned registry.
    ///
    /// # Errors
    /// Returns [`OptionsError::UnexpectedValue`] if the name is empty or whitespace only.
    pub fn register_filter<F>(&mut self, name: impl AsRef<str>, predicate: F) -> Result<(), OptionsError>
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.filters.register(name, predicate)
    }

    /// Resolves `store` against the provider's schema, or passes it through untouched when
    /// no provider is given.
    ///
    /// # Errors
    /// Returns the first failure of the pass; no later option is visited.
    pub fn resolve(
        &self,
        store: &mut OptionStore,
        provider: Option<&dyn OptionsAware>,
    ) -> Result<OptionMap, OptionsError> {
        match provider {
            Some(provider) => self.resolve_with(store, provider),
            None => {
                trace!(options = store.len(), "No schema provider, passing options through");
                Ok(store.to_map())
            },
        }
    }

    /// Resolves `store` against the schema declared by `provider`.
    ///
    /// # Errors
    /// Returns the first failure of the pass; no later option is visited.
    pub fn resolve_with<P>(&self, store: &mut OptionStore, provider: &P) -> Result<OptionMap, OptionsError>
    where
        P: OptionsAware + ?Sized,
    {
        self.resolve_schema(store, &provider.options_map())
    }

    /// Walks `schema` in order, validating and normalizing each option in place.
    ///
    /// Returns the store's full mapping, including options the schema does not mention.
    ///
    /// # Errors
    /// Returns the first failure of the pass; no later option is visited.
    pub fn resolve_schema(
        &self,
        store: &mut OptionStore,
        schema: &SchemaMap,
    ) -> Result<OptionMap, OptionsError> {
        debug!(fields = schema.len(), options = store.len(), "Resolving options");

        for (key, spec) in schema {
            let _span = trace_span!("option", key = %key).entered();

            apply_default(store, key, spec)?;
            ensure_required(store, key, spec)?;
            ensure_allowed_value(store, key, spec)?;
            self.ensure_allowed_type(store, key, spec)?;
            apply_normalizer(store, key, spec)?;
        }

        debug!(options = store.len(), "Options resolved");
        Ok(store.to_map())
    }

    fn ensure_allowed_type(
        &self,
        store: &OptionStore,
        key: &str,
        spec: &FieldSpec,
    ) -> Result<(), OptionsError> {
        let Some(types) = spec.allowed_types().filter(|types| !types.is_empty()) else {
            return Ok(());
        };

        let mut matched = false;
        for name in types {
            matched |= self.filters.check(store, key, name)?;
        }
        if matched {
            return Ok(());
        }

        Err(OptionsError::InvalidType {
            key: key.to_owned(),
            expected: types.join(", "),
            given: store.get(key).map_or("nothing", Value::type_name).to_owned(),
            context: None,
        })
    }
}

fn apply_default(store: &mut OptionStore, key: &str, spec: &FieldSpec) -> Result<(), OptionsError> {
    if store.has(key) {
        return Ok(());
    }
    if let Some(default) = spec.default_value() {
        trace!(value = %default, "Applying default");
        store.append(key, default.clone())?;
    }
    Ok(())
}

fn ensure_required(store: &OptionStore, key: &str, spec: &FieldSpec) -> Result<(), OptionsError> {
    if spec.is_required() && !store.has(key) {
        return Err(OptionsError::MissingRequired { key: key.to_owned(), context: None });
    }
    Ok(())
}

fn ensure_allowed_value(
    store: &OptionStore,
    key: &str,
    spec: &FieldSpec,
) -> Result<(), OptionsError> {
    let (Some(allowed), Some(value)) = (spec.allowed_values(), store.get(key)) else {
        return Ok(());
    };
    if allowed.iter().any(|candidate| value.loose_eq(candidate)) {
        return Ok(());
    }

    Err(OptionsError::InvalidValue {
        key: key.to_owned(),
        value: value.to_string(),
        allowed: allowed.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
        context: None,
    })
}

fn apply_normalizer(store: &mut OptionStore, key: &str, spec: &FieldSpec) -> Result<(), OptionsError> {
    let Some(normalize) = spec.normalizer() else {
        return Ok(());
    };

    let current = store.get(key).cloned();
    match normalize(&mut *store, current) {
        Some(value) => {
            trace!(value = %value, "Normalized");
            store.append(key, value)?;
        },
        None => {
            trace!("Normalizer cleared the option");
            store.remove(key);
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_provider_passes_through() {
        let mut store = OptionStore::with_options([("extra", 1)]).unwrap();
        let resolved = Resolver::new().resolve(&mut store, None).unwrap();
        assert_eq!(&resolved, store.as_map());
    }

    #[test]
    fn default_is_applied_before_required_check() {
        let schema = SchemaMap::new().field("mode", FieldSpec::new().required(true).with_default("fast"));
        let mut store = OptionStore::new();

        let resolved = Resolver::new().resolve_schema(&mut store, &schema).unwrap();
        assert_eq!(resolved["mode"], Value::from("fast"));
    }

    #[test]
    fn existing_value_wins_over_default() {
        let schema = SchemaMap::new().field("mode", FieldSpec::new().with_default("fast"));
        let mut store = OptionStore::with_options([("mode", "slow")]).unwrap();

        let resolved = Resolver::new().resolve_schema(&mut store, &schema).unwrap();
        assert_eq!(resolved["mode"], Value::from("slow"));
    }

    #[test]
    fn allow_value_is_skipped_for_absent_option() {
        let schema = SchemaMap::new().field("mode", FieldSpec::new().allow_value(["fast"]));
        let mut store = OptionStore::new();

        assert!(Resolver::new().resolve_schema(&mut store, &schema).unwrap().is_empty());
    }

    #[test]
    fn allow_value_uses_loose_equality() {
        let schema = SchemaMap::new().field("port", FieldSpec::new().allow_value([80, 443]));
        let mut store = OptionStore::with_options([("port", "443")]).unwrap();

        assert!(Resolver::new().resolve_schema(&mut store, &schema).is_ok());
    }

    #[test]
    fn allow_type_accepts_any_listed_filter() {
        let schema = SchemaMap::new().field("port", FieldSpec::new().allow_type(["string", "int"]));
        let mut store = OptionStore::with_options([("port", 443)]).unwrap();

        assert!(Resolver::new().resolve_schema(&mut store, &schema).is_ok());
    }

    #[test]
    fn allow_type_reports_expected_and_given_types() {
        let schema = SchemaMap::new().field("port", FieldSpec::new().allow_type(["string", "float"]));
        let mut store = OptionStore::with_options([("port", 443)]).unwrap();

        let err = Resolver::new().resolve_schema(&mut store, &schema).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid type for option \"port\", expect type to be one of (string, float), int given"
        );
    }

    #[test]
    fn allow_type_fails_for_absent_option() {
        let schema = SchemaMap::new().field("port", FieldSpec::new().allow_type(["int"]));
        let err = Resolver::new().resolve_schema(&mut OptionStore::new(), &schema).unwrap_err();

        assert!(matches!(err, OptionsError::InvalidType { ref given, .. } if given == "nothing"));
    }

    #[test]
    fn unknown_filter_surfaces_even_after_a_match() {
        let schema = SchemaMap::new().field("port", FieldSpec::new().allow_type(["int", "port"]));
        let mut store = OptionStore::with_options([("port", 443)]).unwrap();

        let err = Resolver::new().resolve_schema(&mut store, &schema).unwrap_err();
        assert!(matches!(err, OptionsError::UnexpectedValue { .. }));
    }

    #[test]
    fn empty_type_list_is_unconstrained() {
        let schema = SchemaMap::new().field("port", FieldSpec::new().allow_type(Vec::<String>::new()));
        let mut store = OptionStore::new();

        assert!(Resolver::new().resolve_schema(&mut store, &schema).is_ok());
    }

    #[test]
    fn normalizer_returning_none_removes_option() {
        let schema = SchemaMap::new().field("legacy", FieldSpec::new().normalize(|_, _| None));
        let mut store = OptionStore::with_options([("legacy", true), ("kept", true)]).unwrap();

        let resolved = Resolver::new().resolve_schema(&mut store, &schema).unwrap();
        assert!(!resolved.contains_key("legacy"));
        assert!(!store.has("legacy"));
        assert!(resolved.contains_key("kept"));
    }

    #[test]
    fn normalizer_sees_absent_option_as_none() {
        let schema = SchemaMap::new()
            .field("retries", FieldSpec::new().normalize(|_, v| v.or(Some(Value::Int(3)))));
        let mut store = OptionStore::new();

        let resolved = Resolver::new().resolve_schema(&mut store, &schema).unwrap();
        assert_eq!(resolved["retries"], Value::Int(3));
    }
}
