use std::borrow::Cow;

/// Errors that can occur while seeding options from external sources.
#[knobs_derive::knobs_error]
pub enum LoaderError {
    /// A source could not be read, parsed, or merged.
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },

    /// A loaded entry was rejected by the option store.
    #[error("Options error{}: {source}", format_context(.context))]
    Options { source: knobs::OptionsError, context: Option<Cow<'static, str>> },
}
