use thiserror::Error;

pub type Result<T> = std::result::Result<T, TextError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TextError {
    #[error("invalid SPAN location: missing {0} point")]
    MissingPoint(&'static str),

    #[error("invalid SPAN location: start is after end")]
    StartAfterEnd,
}
