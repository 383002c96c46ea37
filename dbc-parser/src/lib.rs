//! Parser for dbc contract predicates
//!
//! Predicates are written in documentation text as ordinary boolean
//! expressions (`self.balance >= 0`, `__ret__ * __ret__ == a * a + b * b`).
//! This crate turns such text into an [`Expr`] tree:
//! - Fast lexer using logos
//! - Recursive-descent parser with a nesting limit
//! - Python-flavoured operators, comparison chains and comprehensions

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{BinaryOp, CompareOp, Expr, Literal, LogicalOp, UnaryOp};
pub use error::{ErrorKind, ParseError};
pub use parser::{parse, parse_with_max_depth, ParseResult, Parser, DEFAULT_MAX_DEPTH};
