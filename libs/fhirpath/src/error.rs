//! Error types for the FHIRPath engine

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// FHIRPath engine errors.
///
/// Division by zero, out-of-range indexing and empty propagation are not
/// errors; they produce empty collections. Everything here aborts the
/// current `evaluate` call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Parse error at line {line}, column {column}: {message}")]
    Parse {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Resolution error: {0}")]
    Resolution(String),

    #[error("Type error: {0}")]
    Type(String),

    #[error("Arity error: {0}")]
    Arity(String),

    #[error("Singleton error: {0}")]
    Singleton(String),
}

impl Error {
    pub(crate) fn parse(message: impl Into<String>, line: usize, column: usize) -> Self {
        Error::Parse {
            message: message.into(),
            line,
            column,
        }
    }
}
