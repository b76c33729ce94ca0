use readonce_derive::readonce_error;
use std::borrow::Cow;

#[readonce_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Consumed{}", format_context(.context))]
    Consumed { context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<Vec<u8>, DemoError> {
    std::fs::read("missing-file").context("Reading secret file")
}

fn main() {
    let err = read().unwrap_err();
    assert_eq!(err.kind(), "Io");
    assert!(err.to_string().contains("(Reading secret file)"));

    let consumed: Result<(), DemoError> = Err(DemoError::Consumed { context: None });
    let err = consumed.context("get").unwrap_err();
    assert_eq!(err.to_string(), "Consumed (get)");
    assert_eq!(err.kind(), "Consumed");

    let internal: DemoError = "boom".into();
    assert_eq!(internal.kind(), "Internal");
}
