use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unit expression must be ASCII")]
    NonAscii,

    #[error("invalid unit syntax at byte {pos}: {message}")]
    Syntax { pos: usize, message: &'static str },

    #[error("unit symbol '{0}' appears more than once")]
    DuplicateUnit(String),

    #[error("numeric overflow during unit conversion")]
    Overflow,
}
