//! Operator semantics for predicate evaluation

use dbc_parser::{BinaryOp, CompareOp, UnaryOp};

use crate::value::{Number, Value, ValueError, ValueResult};

pub(super) fn unary(op: UnaryOp, operand: &Value) -> ValueResult<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Boolean(!operand.is_truthy())),
        UnaryOp::Pos => match operand.as_numeric() {
            Some(Number::Int(n)) => Ok(Value::Integer(n)),
            Some(Number::Float(x)) => Ok(Value::Float(x)),
            None => Err(not_a_number(operand)),
        },
        UnaryOp::Neg => match operand.as_numeric() {
            Some(Number::Int(n)) => n
                .checked_neg()
                .map(Value::Integer)
                .ok_or(ValueError::Overflow("negation")),
            Some(Number::Float(x)) => Ok(Value::Float(-x)),
            None => Err(not_a_number(operand)),
        },
    }
}

pub(super) fn binary(op: BinaryOp, left: &Value, right: &Value) -> ValueResult<Value> {
    match (op, left, right) {
        (BinaryOp::Add, Value::String(a), Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            Ok(Value::List(a.iter().chain(b.iter()).cloned().collect()))
        }
        (BinaryOp::Mul, Value::String(s), count) | (BinaryOp::Mul, count, Value::String(s))
            if count.is_integer() || count.is_boolean() =>
        {
            let times = repeat_count(s.len(), count)?;
            Ok(Value::String(s.repeat(times)))
        }
        (BinaryOp::Mul, Value::List(items), count) | (BinaryOp::Mul, count, Value::List(items))
            if count.is_integer() || count.is_boolean() =>
        {
            let times = repeat_count(items.len(), count)?;
            let mut repeated = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                repeated.extend(items.iter().cloned());
            }
            Ok(Value::List(repeated))
        }
        _ => arithmetic(op, left, right),
    }
}

/// Longest list or string a predicate may build (bytes for strings)
pub(super) const MAX_SEQUENCE_LEN: usize = 1 << 24;

/// Repetition count for a sequence of `len` elements; negative counts repeat
/// zero times
fn repeat_count(len: usize, count: &Value) -> ValueResult<usize> {
    let times = match count.as_numeric() {
        Some(Number::Int(n)) => usize::try_from(n).unwrap_or(0),
        _ => 0,
    };
    match len.checked_mul(times) {
        Some(total) if total <= MAX_SEQUENCE_LEN => Ok(times),
        _ => Err(ValueError::SequenceTooLong {
            operation: "repetition",
            limit: MAX_SEQUENCE_LEN,
        }),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> ValueResult<Value> {
    let a = left.as_numeric().ok_or_else(|| not_a_number(left))?;
    let b = right.as_numeric().ok_or_else(|| not_a_number(right))?;

    match (a, b) {
        (Number::Int(a), Number::Int(b)) => integer_arithmetic(op, a, b),
        (a, b) => float_arithmetic(op, a.to_f64(), b.to_f64()),
    }
}

fn integer_arithmetic(op: BinaryOp, a: i64, b: i64) -> ValueResult<Value> {
    let result = match op {
        BinaryOp::Add => a.checked_add(b).ok_or(ValueError::Overflow("addition"))?,
        BinaryOp::Sub => a.checked_sub(b).ok_or(ValueError::Overflow("subtraction"))?,
        BinaryOp::Mul => a.checked_mul(b).ok_or(ValueError::Overflow("multiplication"))?,
        BinaryOp::Div => {
            if b == 0 {
                return Err(ValueError::DivisionByZero);
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(ValueError::DivisionByZero);
            }
            let quotient = a.checked_div(b).ok_or(ValueError::Overflow("division"))?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                quotient - 1
            } else {
                quotient
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(ValueError::DivisionByZero);
            }
            let remainder = a.wrapping_rem(b);
            if remainder != 0 && ((remainder < 0) != (b < 0)) {
                remainder + b
            } else {
                remainder
            }
        }
        BinaryOp::Pow => {
            if b < 0 {
                if a == 0 {
                    return Err(ValueError::DivisionByZero);
                }
                return Ok(Value::Float((a as f64).powf(b as f64)));
            }
            let exponent = u32::try_from(b).map_err(|_| ValueError::Overflow("exponentiation"))?;
            a.checked_pow(exponent)
                .ok_or(ValueError::Overflow("exponentiation"))?
        }
    };
    Ok(Value::Integer(result))
}

fn float_arithmetic(op: BinaryOp, a: f64, b: f64) -> ValueResult<Value> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(ValueError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(ValueError::DivisionByZero);
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(ValueError::DivisionByZero);
            }
            let remainder = a % b;
            if remainder != 0.0 && ((remainder < 0.0) != (b < 0.0)) {
                remainder + b
            } else {
                remainder
            }
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(ValueError::DivisionByZero);
            }
            a.powf(b)
        }
    };
    Ok(Value::Float(result))
}

pub(super) fn compare(op: CompareOp, left: &Value, right: &Value) -> ValueResult<bool> {
    use std::cmp::Ordering::{Equal, Greater, Less};

    Ok(match op {
        CompareOp::Eq => left == right,
        CompareOp::NotEq => left != right,
        CompareOp::Less => left.compare(right)? == Some(Less),
        CompareOp::LessEq => matches!(left.compare(right)?, Some(Less | Equal)),
        CompareOp::Greater => left.compare(right)? == Some(Greater),
        CompareOp::GreaterEq => matches!(left.compare(right)?, Some(Greater | Equal)),
        CompareOp::In => contains(right, left)?,
        CompareOp::NotIn => !contains(right, left)?,
        CompareOp::Is => identical(left, right),
        CompareOp::IsNot => !identical(left, right),
    })
}

/// Identity: singletons by value, objects by handle
fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Nil, Value::Nil) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
        _ => false,
    }
}

pub(super) fn contains(container: &Value, item: &Value) -> ValueResult<bool> {
    match container {
        Value::List(items) => Ok(items.contains(item)),
        Value::String(haystack) => Ok(haystack.contains(item.as_string()?)),
        Value::Map(map) => Ok(match item {
            Value::String(key) => map.contains_key(key),
            _ => false,
        }),
        other => Err(ValueError::TypeError {
            expected: "container",
            actual: other.type_name(),
        }),
    }
}

pub(super) fn index(container: &Value, index: &Value) -> ValueResult<Value> {
    match container {
        Value::List(items) => {
            let position = sequence_position(index, items.len())?;
            Ok(items[position].clone())
        }
        Value::String(s) => {
            let chars: Vec<char> = s.chars().collect();
            let position = sequence_position(index, chars.len())?;
            Ok(Value::String(chars[position].to_string()))
        }
        Value::Map(map) => {
            let key = index.as_string()?;
            map.get(key)
                .cloned()
                .ok_or_else(|| ValueError::KeyNotFound(key.to_string()))
        }
        other => Err(ValueError::TypeError {
            expected: "subscriptable",
            actual: other.type_name(),
        }),
    }
}

/// Resolve a possibly negative index against a sequence length
fn sequence_position(index: &Value, length: usize) -> ValueResult<usize> {
    let raw = match index.as_numeric() {
        Some(Number::Int(n)) => n,
        _ => {
            return Err(ValueError::TypeError {
                expected: "int",
                actual: index.type_name(),
            })
        }
    };

    let resolved = if raw < 0 {
        i64::try_from(length).ok().and_then(|len| raw.checked_add(len))
    } else {
        Some(raw)
    };

    resolved
        .and_then(|position| usize::try_from(position).ok())
        .filter(|position| *position < length)
        .ok_or(ValueError::IndexOutOfBounds { index: raw, length })
}

/// Items produced by iterating a value. Maps yield their keys in sorted order.
pub(super) fn iterate(value: &Value) -> ValueResult<Vec<Value>> {
    match value {
        Value::List(items) => Ok(items.clone()),
        Value::String(s) => Ok(s.chars().map(|c| Value::String(c.to_string())).collect()),
        Value::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Ok(keys.into_iter().map(|key| Value::String(key.clone())).collect())
        }
        other => Err(ValueError::TypeError {
            expected: "iterable",
            actual: other.type_name(),
        }),
    }
}

fn not_a_number(value: &Value) -> ValueError {
    ValueError::TypeError {
        expected: "number",
        actual: value.type_name(),
    }
}
