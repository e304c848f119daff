//! Error types for the game protocol.
//!
//! The decision core itself has no recoverable errors: its inputs are
//! structurally valid by construction, expected failures (arbitration
//! conflicts, no viable direction) are plain `bool`/`Option` results, and
//! dimension mismatches are caller bugs that abort loudly. Errors only arise
//! at the wire, while parsing the observation stream.

use std::fmt;
use std::io;
use std::num::ParseIntError;

/// Failure while reading the observation stream or writing orders.
#[derive(Debug)]
pub enum ProtocolError {
    /// Underlying stream failure.
    Io(io::Error),
    /// The stream ended in the middle of a turn.
    UnexpectedEof,
    /// A line began with an unknown keyword.
    UnknownKeyword(String),
    /// A line carried too few arguments for its keyword.
    MissingArgument(&'static str),
    /// An argument failed to parse as a number.
    InvalidNumber(String),
    /// A coordinate lies outside the announced map dimensions.
    OutOfBounds(String),
    /// A required setup parameter never arrived before `ready`.
    MissingParameter(&'static str),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io error: {e}"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::UnknownKeyword(line) => write!(f, "unknown keyword in line: {line:?}"),
            Self::MissingArgument(keyword) => {
                write!(f, "missing argument for {keyword:?} line")
            }
            Self::InvalidNumber(token) => write!(f, "invalid number: {token:?}"),
            Self::OutOfBounds(tile) => write!(f, "coordinate off the map: {tile}"),
            Self::MissingParameter(name) => write!(f, "setup parameter {name:?} missing"),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<ParseIntError> for ProtocolError {
    fn from(e: ParseIntError) -> Self {
        Self::InvalidNumber(e.to_string())
    }
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ProtocolError::UnknownKeyword("x 1 2".to_string());
        assert!(err.to_string().contains("unknown keyword"));
        let err = ProtocolError::MissingParameter("rows");
        assert!(err.to_string().contains("rows"));
    }

    #[test]
    fn test_io_source_preserved() {
        use std::error::Error;
        let err = ProtocolError::from(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
        assert!(err.source().is_some());
    }
}
