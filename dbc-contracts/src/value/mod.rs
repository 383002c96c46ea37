//! Runtime value representation
//!
//! Values are what predicates compute with: function arguments, return
//! values, object fields and the intermediate results of evaluation.
//! Equality, ordering and truthiness follow the conventions of the
//! predicate language (`1 == 1.0`, empty containers are falsy).

pub mod error;

pub use error::{ValueError, ValueResult};

use std::cmp::Ordering;
use std::fmt;

use rustc_hash::FxHashMap;

use crate::object::Object;

/// Runtime value types
#[derive(Clone)]
pub enum Value {
    /// Integer value
    Integer(i64),

    /// Floating point value
    Float(f64),

    /// String value
    String(String),

    /// Boolean value
    Boolean(bool),

    /// `None`
    Nil,

    /// List of values
    List(Vec<Value>),

    /// String-keyed map; also the shape of the `__old__` snapshot
    Map(FxHashMap<String, Value>),

    /// Handle to a contract-bearing object
    Object(Object),
}

/// A value viewed as a number; booleans count as integers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(x) => x,
        }
    }
}

impl Value {
    /// Build a list from anything convertible into values
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    /// Type checking predicates
    pub fn is_integer(&self) -> bool {
        matches!(self, Value::Integer(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Value extraction methods
    pub fn as_integer(&self) -> ValueResult<i64> {
        match self {
            Value::Integer(n) => Ok(*n),
            _ => Err(ValueError::TypeError {
                expected: "int",
                actual: self.type_name(),
            }),
        }
    }

    pub fn as_float(&self) -> ValueResult<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            _ => Err(ValueError::TypeError {
                expected: "float",
                actual: self.type_name(),
            }),
        }
    }

    pub fn as_number(&self) -> ValueResult<f64> {
        self.as_numeric().map(Number::to_f64).ok_or(ValueError::TypeError {
            expected: "number",
            actual: self.type_name(),
        })
    }

    /// Numeric view used by arithmetic; `None` for non-numbers
    pub fn as_numeric(&self) -> Option<Number> {
        match self {
            Value::Integer(n) => Some(Number::Int(*n)),
            Value::Float(x) => Some(Number::Float(*x)),
            Value::Boolean(b) => Some(Number::Int(i64::from(*b))),
            _ => None,
        }
    }

    pub fn as_string(&self) -> ValueResult<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(ValueError::TypeError {
                expected: "str",
                actual: self.type_name(),
            }),
        }
    }

    pub fn as_boolean(&self) -> ValueResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            _ => Err(ValueError::TypeError {
                expected: "bool",
                actual: self.type_name(),
            }),
        }
    }

    pub fn as_list(&self) -> ValueResult<&[Value]> {
        match self {
            Value::List(items) => Ok(items),
            _ => Err(ValueError::TypeError {
                expected: "list",
                actual: self.type_name(),
            }),
        }
    }

    pub fn as_map(&self) -> ValueResult<&FxHashMap<String, Value>> {
        match self {
            Value::Map(map) => Ok(map),
            _ => Err(ValueError::TypeError {
                expected: "dict",
                actual: self.type_name(),
            }),
        }
    }

    pub fn as_object(&self) -> ValueResult<&Object> {
        match self {
            Value::Object(obj) => Ok(obj),
            _ => Err(ValueError::TypeError {
                expected: "object",
                actual: self.type_name(),
            }),
        }
    }

    /// Get the type name of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "str",
            Value::Boolean(_) => "bool",
            Value::Nil => "NoneType",
            Value::List(_) => "list",
            Value::Map(_) => "dict",
            Value::Object(_) => "object",
        }
    }

    /// Check if value is truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Nil => false,
            Value::Integer(n) => *n != 0,
            Value::Float(x) => *x != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// Order two values. Numbers compare across int/float, strings and
    /// lists lexicographically. `Ok(None)` means unordered (NaN).
    pub fn compare(&self, other: &Value) -> ValueResult<Option<Ordering>> {
        if let (Some(a), Some(b)) = (self.as_numeric(), other.as_numeric()) {
            return Ok(match (a, b) {
                (Number::Int(a), Number::Int(b)) => Some(a.cmp(&b)),
                (a, b) => a.to_f64().partial_cmp(&b.to_f64()),
            });
        }

        match (self, other) {
            (Value::String(a), Value::String(b)) => Ok(Some(a.cmp(b))),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    if x == y {
                        continue;
                    }
                    return x.compare(y);
                }
                Ok(Some(a.len().cmp(&b.len())))
            }
            _ => Err(ValueError::InvalidOperation(format!(
                "cannot order {} and {}",
                self.type_name(),
                other.type_name()
            ))),
        }
    }

    /// Copy taken for the pre-call snapshot. Containers are copied one
    /// level deep; an object becomes a detached copy of its fields.
    pub fn shallow_copy(&self) -> Value {
        match self {
            Value::Object(obj) => Value::Object(obj.snapshot()),
            other => other.clone(),
        }
    }

    /// Text produced by `str(value)`: like `Display`, but strings unquoted
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "Integer({})", n),
            Value::Float(x) => write!(f, "Float({})", x),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Boolean(b) => write!(f, "Boolean({})", b),
            Value::Nil => write!(f, "Nil"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Value::Object(obj) => write!(f, "Object({})", obj.class().name()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if let (Some(a), Some(b)) = (self.as_numeric(), other.as_numeric()) {
            return match (a, b) {
                (Number::Int(a), Number::Int(b)) => a == b,
                (a, b) => a.to_f64() == b.to_f64(),
            };
        }

        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Object::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{:?}", x),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Boolean(true) => write!(f, "True"),
            Value::Boolean(false) => write!(f, "False"),
            Value::Nil => write!(f, "None"),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Map(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                write!(f, "{{")?;
                for (i, key) in keys.into_iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}': {}", key, map[key])?;
                }
                write!(f, "}}")
            }
            Value::Object(obj) => write!(f, "<{} object>", obj.class().name()),
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<FxHashMap<String, Value>> for Value {
    fn from(map: FxHashMap<String, Value>) -> Self {
        Value::Map(map)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Nil, Into::into)
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
