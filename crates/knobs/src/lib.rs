//! # Knobs
//!
//! A runtime option container that is resolved against declarative schemas.
//!
//! Callers accumulate key-value options in an [`OptionStore`], then hand a schema-bearing
//! [`OptionsAware`] provider to a [`Resolver`]. Resolution walks the schema in order and,
//! per option, applies defaults, enforces `required`, allowed values and allowed types,
//! and finally runs a normalizer that may read or write other options.
//!
//! ## Architectural Overview
//!
//! 1. **[`Value`]**: the dynamic option value; semantic types come from named filters.
//! 2. **[`OptionStore`]**: insertion-ordered storage without tombstones.
//! 3. **[`FieldSpec`] / [`SchemaMap`]**: typed, ordered option declarations.
//! 4. **[`FilterRegistry`]**: case-insensitive named type predicates, owned per resolver.
//! 5. **[`Resolver`]**: the validation and normalization pass.
//! 6. **[`Options`]**: a store and a resolver behind one handle.
//!
//! ## Example
//!
//! ```rust
//! use knobs::{FieldSpec, Options, OptionsAware, SchemaMap, Value};
//!
//! struct Marketplace;
//!
//! impl OptionsAware for Marketplace {
//!     fn options_map(&self) -> SchemaMap {
//!         SchemaMap::new()
//!             .field(
//!                 "domain",
//!                 FieldSpec::new()
//!                     .required(true)
//!                     .allow_value(["tokopedia.com", "bukalapak.com"])
//!                     .normalize(|_, domain| match domain {
//!                         Some(Value::Str(d)) if d == "bukalapak.com" => Some("tokopedia.com".into()),
//!                         other => other,
//!                     }),
//!             )
//!             .field(
//!                 "schema",
//!                 FieldSpec::new().with_default("http").normalize(|store, schema| {
//!                     if schema.as_ref().and_then(Value::as_str) == Some("http") {
//!                         store.append("port", 80).ok()?;
//!                     }
//!                     schema
//!                 }),
//!             )
//!     }
//! }
//!
//! # fn main() -> Result<(), knobs::OptionsError> {
//! let mut options = Options::with_options([("domain", "bukalapak.com")])?;
//! let resolved = options.resolve_with(&Marketplace)?;
//!
//! assert_eq!(resolved["domain"], Value::from("tokopedia.com"));
//! assert_eq!(resolved["schema"], Value::from("http"));
//! assert_eq!(resolved["port"], Value::Int(80));
//! # Ok(())
//! # }
//! ```

mod error;
mod filter;
mod options;
mod resolver;
mod schema;
mod store;
mod value;

pub use error::{OptionsError, OptionsErrorExt};
pub use filter::{FilterRegistry, Predicate};
pub use options::Options;
pub use resolver::Resolver;
pub use schema::{FieldSpec, Normalizer, OptionsAware, SchemaMap};
pub use store::{OptionMap, OptionStore};
pub use value::{Object, Value};

pub mod prelude {
    pub use crate::error::{OptionsError, OptionsErrorExt};
    pub use crate::options::Options;
    pub use crate::resolver::Resolver;
    pub use crate::schema::{FieldSpec, OptionsAware, SchemaMap};
    pub use crate::store::OptionStore;
    pub use crate::value::Value;
}
