#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the knobs crates.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! knobs-derive = { path = "../infra/derive" }
//! thiserror = "2"
//! ```

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for declaring the error enum of a crate.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: Generates a companion `<Name>Ext` trait that adds `.context(..)` to
///   `Result<T, Name>` and to `Result<T, Source>` for every variant wrapping a source error.
/// * **Conversions**: Implements `From<Source>` for variants with a `source` field (or a field
///   marked `#[source]`/`#[from]`), so `?` works on upstream errors.
/// * **Introspection**: `kind()` returns the variant name, `context_message()` the attached
///   context, and `with_context(..)` replaces it.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with **named-field** variants only.
/// 2. Every variant carries a `context: Option<Cow<'static, str>>` field.
/// 3. A `format_context` helper is emitted next to the enum; use it in `#[error]` strings.
///
/// # Example
///
/// ```rust,ignore
/// use knobs_derive::knobs_error;
/// use std::borrow::Cow;
///
/// #[knobs_error]
/// pub enum LoaderError {
///     #[error("Config error{}: {source}", format_context(.context))]
///     Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
/// }
///
/// fn build() -> Result<config::Config, LoaderError> {
///     config::Config::builder().build().context("Failed to build sources")
/// }
/// ```
#[proc_macro_attribute]
pub fn knobs_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand(input).into()
}
