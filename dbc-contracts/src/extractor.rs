//! Extraction of tagged predicate lines from documentation text
//!
//! A documentation block is free-form prose. A line declares a predicate
//! when, after leading whitespace is removed, it starts with one of the
//! tags below; the rest of that line, trimmed, is the predicate text.
//!
//! ```text
//! Transfers money between accounts.
//!
//! pre: amount > 0
//! pre: source.balance >= amount
//! post: source.balance == __old__["source"].balance - amount
//! ```

use crate::contract::{ContractKind, PredicateSpec, PredicateStore};
use crate::errors::SetupError;

pub const PRECONDITION_TAG: &str = "pre:";
pub const POSTCONDITION_TAG: &str = "post:";
pub const HARD_INVARIANT_TAG: &str = "hinv:";
/// Older spelling of [`HARD_INVARIANT_TAG`]
pub const INVARIANT_TAG: &str = "inv:";
pub const SOFT_INVARIANT_TAG: &str = "sinv:";

/// Name under which a constructor is wrapped
pub const CONSTRUCTOR_NAME: &str = "__init__";

const TAGS: [(&str, ContractKind); 5] = [
    (PRECONDITION_TAG, ContractKind::Precondition),
    (POSTCONDITION_TAG, ContractKind::Postcondition),
    (HARD_INVARIANT_TAG, ContractKind::HardInvariant),
    (INVARIANT_TAG, ContractKind::HardInvariant),
    (SOFT_INVARIANT_TAG, ContractKind::SoftInvariant),
];

/// Predicate texts of every line carrying `prefix`, in order
pub fn tagged_lines<'a>(prefix: &'a str, doc: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    doc.lines()
        .filter_map(move |line| line.trim_start().strip_prefix(prefix))
        .map(str::trim)
}

fn classify(line: &str) -> Option<(ContractKind, &str)> {
    let line = line.trim_start();
    TAGS.iter().find_map(|(tag, kind)| {
        line.strip_prefix(tag).map(|text| (*kind, text.trim()))
    })
}

/// Every tagged predicate of one documentation block
pub fn extract(scope: &str, doc: &str) -> PredicateStore {
    let mut store = PredicateStore::new();
    for (kind, text) in doc.lines().filter_map(classify) {
        store.push(PredicateSpec::new(kind, text, scope));
    }
    store
}

/// Whether a callable name denotes a constructor, bare or qualified
pub fn is_constructor(name: &str) -> bool {
    name == CONSTRUCTOR_NAME
        || name
            .rsplit_once('.')
            .map_or(false, |(_, method)| method == CONSTRUCTOR_NAME)
}

/// Preconditions and postconditions of a single callable.
///
/// Invariant lines are ignored here; they belong to class documentation.
/// A constructor may not declare either kind.
pub fn extract_callable(name: &str, doc: &str) -> Result<PredicateStore, SetupError> {
    let mut store = PredicateStore::new();

    for (kind, text) in doc.lines().filter_map(classify) {
        if kind.is_invariant() {
            continue;
        }
        if is_constructor(name) {
            return Err(SetupError::ConstructorContract {
                scope: name.to_string(),
                predicate: text.to_string(),
            });
        }
        store.push(PredicateSpec::new(kind, text, name));
    }

    Ok(store)
}

/// Invariants of a class hierarchy, given `(scope, doc)` pairs ordered from
/// the most-base class to the most-derived one
pub fn extract_class_chain<'a, I>(chain: I) -> PredicateStore
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut store = PredicateStore::new();

    for (scope, doc) in chain {
        for line in doc.lines() {
            match classify(line) {
                Some((kind, text)) if kind.is_invariant() => {
                    store.push(PredicateSpec::new(kind, text, scope));
                }
                _ => {}
            }
        }
    }

    store
}
