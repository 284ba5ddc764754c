use knobs_derive::knobs_error;
use std::borrow::Cow;

#[knobs_error]
#[derive(Debug)]
pub enum DemoError {
    #[error("Rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn reject() -> Result<u8, DemoError> {
    Err(DemoError::Rejected { message: "nope".into(), context: None })
}

fn main() {
    let err = reject().context("first").context("second").unwrap_err();
    assert_eq!(err.context_message(), Some("second"));
    assert_eq!(err.to_string(), "Rejected (second): nope");

    let plain = DemoError::Rejected { message: "nope".into(), context: None };
    assert_eq!(plain.to_string(), "Rejected: nope");
    assert_eq!(plain.with_context("third").context_message(), Some("third"));
}
