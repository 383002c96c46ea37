//! Contract-related error types

use dbc_parser::ParseError;
use thiserror::Error;

use crate::contract::ContractKind;
use crate::value::ValueError;

/// A predicate evaluated to false at a checked point
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("contract `{predicate}` violated")]
pub struct Violation {
    pub kind: ContractKind,
    /// Exact predicate text as declared
    pub predicate: String,
    /// Function or class that declared the predicate
    pub scope: String,
}

impl Violation {
    pub fn new(kind: ContractKind, predicate: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            kind,
            predicate: predicate.into(),
            scope: scope.into(),
        }
    }
}

/// Structural misuse detected once, when a callable or class is wrapped
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("constructor `{scope}` must not declare preconditions or postconditions (found `{predicate}`)")]
    ConstructorContract { scope: String, predicate: String },

    #[error("method `{method}` is declared twice on class `{class}`")]
    DuplicateMethod { class: String, method: String },
}

/// Main contract error type
#[derive(Error, Debug)]
pub enum ContractError {
    #[error(transparent)]
    Violation(#[from] Violation),

    #[error(transparent)]
    Setup(#[from] SetupError),

    /// Predicate text that does not parse; reported when evaluated
    #[error("cannot parse contract `{predicate}`: {source}")]
    Parse {
        predicate: String,
        #[source]
        source: ParseError,
    },

    #[error(transparent)]
    Value(#[from] ValueError),

    #[error("name `{0}` is not defined")]
    UndefinedName(String),

    /// Attribute not (yet) set on an object
    #[error("`{class}` object has no attribute `{attribute}`")]
    MissingAttribute { class: String, attribute: String },

    #[error("`{class}` object has no method `{method}`")]
    UnknownMethod { class: String, method: String },

    #[error("`{0}` is not callable")]
    NotCallable(String),

    #[error("`{name}` takes {expected} arguments but {actual} were given")]
    ArityMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("expected an instance of `{expected}`, got `{actual}`")]
    NotAnInstance { expected: String, actual: String },

    /// Error raised by a user-supplied function or method body
    #[error(transparent)]
    Body(#[from] anyhow::Error),
}

impl ContractError {
    /// The violation carried by this error, if it is one
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            ContractError::Violation(violation) => Some(violation),
            _ => None,
        }
    }

    pub fn is_violation(&self) -> bool {
        self.violation().is_some()
    }

    /// Build a body error from a message
    pub fn body(message: impl std::fmt::Display) -> Self {
        ContractError::Body(anyhow::anyhow!("{}", message))
    }
}

/// Result type for contract operations
pub type ContractResult<T> = Result<T, ContractError>;

#[cfg(test)]
#[path = "errors/errors_tests.rs"]
mod tests;
