//! Contract representation and core structures
//!
//! A contract is a set of predicates attached to a function or a class:
//!
//! - Preconditions (`pre:`) are evaluated before the body runs, against the
//!   call's arguments and receiver.
//! - Postconditions (`post:`) are evaluated after the body returns `Ok`,
//!   against the post-call arguments plus `__ret__` and `__old__`. They are
//!   not evaluated when the body fails.
//! - Hard invariants (`hinv:` / `inv:`) must hold after every attribute
//!   write on a live object.
//! - Soft invariants (`sinv:`) must hold on entry to and exit from every
//!   method, but may be broken inside a method body.

use std::fmt;

use dbc_parser::{parse_with_max_depth, Expr, ParseError};
use serde::{Deserialize, Serialize};

use crate::errors::{ContractError, ContractResult, Violation};

/// Type of contract condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractKind {
    Precondition,
    Postcondition,
    HardInvariant,
    SoftInvariant,
}

impl ContractKind {
    pub const ALL: [ContractKind; 4] = [
        ContractKind::Precondition,
        ContractKind::Postcondition,
        ContractKind::HardInvariant,
        ContractKind::SoftInvariant,
    ];

    pub fn is_invariant(self) -> bool {
        matches!(self, ContractKind::HardInvariant | ContractKind::SoftInvariant)
    }
}

impl fmt::Display for ContractKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContractKind::Precondition => "precondition",
            ContractKind::Postcondition => "postcondition",
            ContractKind::HardInvariant => "hard invariant",
            ContractKind::SoftInvariant => "soft invariant",
        })
    }
}

/// One extracted predicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateSpec {
    pub kind: ContractKind,
    pub text: String,
    /// Declaring function or class
    pub scope: String,
}

impl PredicateSpec {
    pub fn new(kind: ContractKind, text: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            scope: scope.into(),
        }
    }
}

/// Predicates grouped by kind, each group in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateStore {
    pub preconditions: Vec<PredicateSpec>,
    pub postconditions: Vec<PredicateSpec>,
    pub hard_invariants: Vec<PredicateSpec>,
    pub soft_invariants: Vec<PredicateSpec>,
}

impl PredicateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a predicate to the group of its kind
    pub fn push(&mut self, spec: PredicateSpec) {
        self.group_mut(spec.kind).push(spec);
    }

    pub fn of_kind(&self, kind: ContractKind) -> &[PredicateSpec] {
        match kind {
            ContractKind::Precondition => &self.preconditions,
            ContractKind::Postcondition => &self.postconditions,
            ContractKind::HardInvariant => &self.hard_invariants,
            ContractKind::SoftInvariant => &self.soft_invariants,
        }
    }

    /// Append every group of `other` after the predicates already held
    pub fn extend(&mut self, other: PredicateStore) {
        self.preconditions.extend(other.preconditions);
        self.postconditions.extend(other.postconditions);
        self.hard_invariants.extend(other.hard_invariants);
        self.soft_invariants.extend(other.soft_invariants);
    }

    pub fn len(&self) -> usize {
        ContractKind::ALL
            .iter()
            .map(|kind| self.of_kind(*kind).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn group_mut(&mut self, kind: ContractKind) -> &mut Vec<PredicateSpec> {
        match kind {
            ContractKind::Precondition => &mut self.preconditions,
            ContractKind::Postcondition => &mut self.postconditions,
            ContractKind::HardInvariant => &mut self.hard_invariants,
            ContractKind::SoftInvariant => &mut self.soft_invariants,
        }
    }
}

/// A predicate compiled for evaluation.
///
/// Parse failures are kept rather than reported, so malformed text only
/// fails when the predicate is actually evaluated.
#[derive(Debug, Clone)]
pub struct Predicate {
    spec: PredicateSpec,
    compiled: Result<Expr, ParseError>,
}

impl Predicate {
    pub fn compile(spec: PredicateSpec, max_depth: usize) -> Self {
        let compiled = parse_with_max_depth(&spec.text, max_depth);
        Self { spec, compiled }
    }

    /// Compile every spec of a group
    pub fn compile_all(specs: &[PredicateSpec], max_depth: usize) -> Vec<Predicate> {
        specs
            .iter()
            .cloned()
            .map(|spec| Predicate::compile(spec, max_depth))
            .collect()
    }

    pub fn spec(&self) -> &PredicateSpec {
        &self.spec
    }

    pub fn kind(&self) -> ContractKind {
        self.spec.kind
    }

    pub fn text(&self) -> &str {
        &self.spec.text
    }

    pub fn scope(&self) -> &str {
        &self.spec.scope
    }

    pub fn expr(&self) -> ContractResult<&Expr> {
        self.compiled.as_ref().map_err(|source| ContractError::Parse {
            predicate: self.spec.text.clone(),
            source: source.clone(),
        })
    }

    /// Whether the predicate mentions `name` as a free variable
    pub fn references(&self, name: &str) -> bool {
        match &self.compiled {
            Ok(expr) => expr.free_names().contains(&name),
            Err(_) => false,
        }
    }

    /// The violation raised when this predicate evaluates to false
    pub fn violation(&self) -> Violation {
        Violation::new(self.spec.kind, self.spec.text.clone(), self.spec.scope.clone())
    }
}
