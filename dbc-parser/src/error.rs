//! Parser error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Invalid token at position {position}: {text:?}")]
    InvalidToken { position: usize, text: String },

    #[error("Unexpected token at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of input")]
    UnexpectedEof,

    #[error("Invalid number literal: {0}")]
    InvalidNumber(String),

    #[error("Maximum parsing depth exceeded: depth {depth} exceeds limit of {max_depth}")]
    MaxDepthExceeded { depth: usize, max_depth: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidToken,
    UnexpectedToken,
    UnexpectedEof,
    InvalidNumber,
    MaxDepthExceeded,
}

impl ParseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParseError::InvalidToken { .. } => ErrorKind::InvalidToken,
            ParseError::UnexpectedToken { .. } => ErrorKind::UnexpectedToken,
            ParseError::UnexpectedEof => ErrorKind::UnexpectedEof,
            ParseError::InvalidNumber(_) => ErrorKind::InvalidNumber,
            ParseError::MaxDepthExceeded { .. } => ErrorKind::MaxDepthExceeded,
        }
    }
}
