use std::borrow::Cow;

/// Errors raised while storing, type-checking, or resolving options.
///
/// Every failure is terminal for the call that produced it; [`Resolver`](crate::Resolver)
/// stops at the first one and returns it unchanged.
#[knobs_derive::knobs_error]
pub enum OptionsError {
    /// A write was attempted with an unusable key, or bulk input was not a key-value mapping.
    #[error("Invalid argument{}: {message}", format_context(.context))]
    InvalidArgument { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A filter name could not be registered, or a schema referenced an unknown filter.
    #[error("Unexpected value{}: {message}", format_context(.context))]
    UnexpectedValue { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// A required option is absent after defaults were applied.
    #[error("Required option \"{key}\" is missing{}", format_context(.context))]
    MissingRequired { key: String, context: Option<Cow<'static, str>> },

    /// The resolved value is not one of the allowed values.
    #[error(
        "Unexpected option \"{key}\" with value \"{value}\", expect to be one of ({allowed}){}",
        format_context(.context)
    )]
    InvalidValue { key: String, value: String, allowed: String, context: Option<Cow<'static, str>> },

    /// The resolved value satisfies none of the declared type filters.
    #[error(
        "Invalid type for option \"{key}\", expect type to be one of ({expected}), {given} given{}",
        format_context(.context)
    )]
    InvalidType { key: String, expected: String, given: String, context: Option<Cow<'static, str>> },
}

impl OptionsError {
    pub(crate) fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidArgument { message: message.into(), context: None }
    }

    pub(crate) fn unexpected_value(message: impl Into<Cow<'static, str>>) -> Self {
        Self::UnexpectedValue { message: message.into(), context: None }
    }
}
