use knobs_derive::knobs_error;
use std::borrow::Cow;

#[knobs_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Missing option \"{key}\"{}", format_context(.context))]
    Missing { key: String, context: Option<Cow<'static, str>> },
}

fn read() -> Result<(), DemoError> {
    let failed: Result<(), std::io::Error> = Err(std::io::Error::other("disk"));
    failed.context("Reading seed file")?;
    Ok(())
}

fn main() {
    let err = read().unwrap_err();
    assert_eq!(err.kind(), "Io");
    assert_eq!(err.context_message(), Some("Reading seed file"));
}
