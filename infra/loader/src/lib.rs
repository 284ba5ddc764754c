//! # Loader
//!
//! Seeds a [`knobs::OptionStore`] from layered sources using the `config` crate:
//!
//! 1. **Base File**: an optional (or required) file whose format follows its extension
//!    (`.toml`, `.json`).
//! 2. **Environment Overrides**: variables prefixed with `KNOBS__` by default. Nested
//!    structures use double underscores (`KNOBS__TLS__CERT` maps to `tls.cert`), and values
//!    are parsed into booleans and numbers where possible.
//!
//! Later layers override earlier ones. Top-level keys become option keys; nested tables
//! become [`knobs::Value::Map`] values.
//!
//! ## Example
//!
//! ```rust
//! use knobs_loader::OptionsLoader;
//!
//! # fn main() -> Result<(), knobs_loader::LoaderError> {
//! let store = OptionsLoader::new()
//!     .env_source([("KNOBS__DOMAIN".to_owned(), "bukalapak.com".to_owned())])
//!     .load()?;
//!
//! assert_eq!(store.get("domain").and_then(knobs::Value::as_str), Some("bukalapak.com"));
//! # Ok(())
//! # }
//! ```

mod error;

pub use crate::error::{LoaderError, LoaderErrorExt};

use config::{Config, Environment, File};
use indexmap::IndexMap;
use knobs::{OptionStore, Value};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const DEFAULT_ENV_PREFIX: &str = "KNOBS";
const ENV_SEPARATOR: &str = "__";

/// Builder describing where options are loaded from.
#[derive(Debug, Clone)]
pub struct OptionsLoader {
    file: Option<PathBuf>,
    required: bool,
    env_prefix: Option<String>,
    env_source: Option<config::Map<String, String>>,
}

impl Default for OptionsLoader {
    fn default() -> Self {
        Self {
            file: None,
            required: true,
            env_prefix: Some(DEFAULT_ENV_PREFIX.to_owned()),
            env_source: None,
        }
    }
}

impl OptionsLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a base file. It must exist unless [`OptionsLoader::required`] is set to `false`.
    #[must_use = "The loader must be configured before it can load options"]
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    #[must_use = "The loader must be configured before it can load options"]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Changes the environment prefix (default `KNOBS`).
    #[must_use = "The loader must be configured before it can load options"]
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    /// Skips the environment layer entirely.
    #[must_use = "The loader must be configured before it can load options"]
    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Reads environment overrides from `vars` instead of the process environment.
    #[must_use = "The loader must be configured before it can load options"]
    pub fn env_source<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env_source = Some(vars.into_iter().collect());
        self
    }

    /// Loads all layers into a new store.
    ///
    /// # Errors
    /// * [`LoaderError::Config`] if a required file is missing, a source is malformed, or a
    ///   value has no option representation (e.g. an empty value).
    /// * [`LoaderError::Options`] if a loaded key is rejected by the store.
    pub fn load(&self) -> Result<OptionStore, LoaderError> {
        let mut store = OptionStore::new();
        self.load_into(&mut store)?;
        Ok(store)
    }

    /// Loads all layers and appends them to `store`, overriding existing keys.
    ///
    /// # Errors
    /// See [`OptionsLoader::load`].
    pub fn load_into(&self, store: &mut OptionStore) -> Result<(), LoaderError> {
        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            info!("Loading options from {}", path.display());
            builder = builder.add_source(File::from(path.as_path()).required(self.required));
        }

        if let Some(prefix) = &self.env_prefix {
            debug!(prefix = %prefix, "Applying environment overrides");
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .convert_case(config::Case::Snake)
                    .source(self.env_source.clone()),
            );
        }

        let loaded = builder
            .build()
            .context("Failed to build option sources")?
            .try_deserialize::<IndexMap<String, Value>>()
            .context("Failed to read option values")?;

        debug!(options = loaded.len(), "Loaded options");
        store.set(loaded).context("Loaded option rejected")
    }
}

/// Loads options from `path` (required) with `KNOBS__` environment overrides.
///
/// # Errors
/// See [`OptionsLoader::load`].
pub fn load_options(path: impl AsRef<Path>) -> Result<OptionStore, LoaderError> {
    OptionsLoader::new().file(path.as_ref()).load()
}
