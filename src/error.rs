//! Error types for colgen

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// colgen errors
///
/// Every parse or generation failure aborts the run; the offending
/// line, entity or field is embedded in the message for diagnosis.
#[derive(Error, Debug)]
pub enum Error {
    #[error("unknown line: {0:?}")]
    UnknownLine(String),

    #[error("missing arg: {0:?}")]
    MissingArg(String),

    #[error("missing type: {0}")]
    MissingType(String),

    #[error("missing field: {0}")]
    MissingField(String),

    #[error("missing main entity: {entity} for {rule}")]
    MissingEntity { entity: String, rule: String },

    #[error("render error: {0}")]
    Render(String),

    #[error("format error: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Other(s.to_string())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Other(s)
    }
}

impl From<minijinja::Error> for Error {
    fn from(e: minijinja::Error) -> Self {
        Error::Render(e.to_string())
    }
}
