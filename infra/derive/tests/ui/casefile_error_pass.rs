use casefile_derive::casefile_error;
use std::borrow::Cow;

#[casefile_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Entry rejected{}: {message}", format_context(.context))]
    Rejected { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn open() -> Result<(), DemoError> {
    Err(std::io::Error::other("boom")).context("opening archive")
}

fn main() {
    let err = open().unwrap_err();
    assert_eq!(err.kind(), "Io");
    assert!(err.to_string().contains("(opening archive)"));

    let err: DemoError = "unexpected".into();
    assert_eq!(err.kind(), "Internal");

    let err: Result<(), DemoError> =
        Err(DemoError::Rejected { message: "a/../b".into(), context: None });
    let err = err.context("path guard").unwrap_err();
    assert_eq!(err.to_string(), "Entry rejected (path guard): a/../b");
}
