//! Evaluation environments
//!
//! An environment is the set of names a predicate can see. It is rebuilt
//! for every call and every checked write, never cached.

use rustc_hash::FxHashMap;

use crate::object::Object;
use crate::value::Value;

/// Name bound to the receiver of a method call
pub const RECEIVER: &str = "self";

/// Name bound to the return value in postconditions
pub const RETURN_VALUE: &str = "__ret__";

/// Name bound to the pre-call snapshot in postconditions
pub const SNAPSHOT: &str = "__old__";

#[derive(Debug, Clone, Default)]
pub struct Environment {
    bindings: FxHashMap<String, Value>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind each formal parameter to its actual argument and the receiver,
    /// if any, to `self`. Callers check arity beforehand.
    pub fn for_call(params: &[String], receiver: Option<&Object>, args: &[Value]) -> Self {
        debug_assert_eq!(params.len(), args.len());

        let mut env = Self::new();
        for (name, value) in params.iter().zip(args) {
            env.bind(name.clone(), value.clone());
        }
        if let Some(receiver) = receiver {
            env.bind(RECEIVER, Value::Object(receiver.clone()));
        }
        env
    }

    /// Environment of a hard-invariant check: only `self`
    pub fn for_receiver(receiver: &Object) -> Self {
        let mut env = Self::new();
        env.bind(RECEIVER, Value::Object(receiver.clone()));
        env
    }

    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Shallow copies of every binding, keyed by the same names
    pub fn snapshot(&self) -> Value {
        Value::Map(
            self.bindings
                .iter()
                .map(|(name, value)| (name.clone(), value.shallow_copy()))
                .collect(),
        )
    }

    /// Add `__ret__` and `__old__` for postcondition evaluation
    pub fn into_post_call(mut self, ret: Value, old: Value) -> Self {
        self.bind(RETURN_VALUE, ret);
        self.bind(SNAPSHOT, old);
        self
    }
}
