//! Builtin functions and methods available to predicates

use std::cmp::Ordering;

use dbc_parser::BinaryOp;
use rustc_hash::FxHashMap;

use super::operators;
use crate::value::{Number, Value, ValueError, ValueResult};

pub(super) type Builtin = fn(&[Value]) -> ValueResult<Value>;

/// Builtin function by name
pub(super) fn lookup(name: &str) -> Option<Builtin> {
    let builtin: Builtin = match name {
        "len" => builtin_len,
        "abs" => builtin_abs,
        "min" => builtin_min,
        "max" => builtin_max,
        "sum" => builtin_sum,
        "all" => builtin_all,
        "any" => builtin_any,
        "range" => builtin_range,
        "sorted" => builtin_sorted,
        "set" => builtin_set,
        "list" => builtin_list,
        "int" => builtin_int,
        "float" => builtin_float,
        "str" => builtin_str,
        "bool" => builtin_bool,
        "round" => builtin_round,
        _ => return None,
    };
    Some(builtin)
}

fn expect_arity(
    function: &'static str,
    args: &[Value],
    expected: &'static str,
    accepted: impl Fn(usize) -> bool,
) -> ValueResult<()> {
    if accepted(args.len()) {
        Ok(())
    } else {
        Err(ValueError::ArityMismatch {
            function,
            expected,
            actual: args.len(),
        })
    }
}

fn builtin_len(args: &[Value]) -> ValueResult<Value> {
    expect_arity("len", args, "1", |n| n == 1)?;
    let length = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::List(items) => items.len(),
        Value::Map(map) => map.len(),
        other => {
            return Err(ValueError::TypeError {
                expected: "sized",
                actual: other.type_name(),
            })
        }
    };
    i64::try_from(length)
        .map(Value::Integer)
        .map_err(|_| ValueError::Overflow("len"))
}

fn builtin_abs(args: &[Value]) -> ValueResult<Value> {
    expect_arity("abs", args, "1", |n| n == 1)?;
    match args[0].as_numeric() {
        Some(Number::Int(n)) => n
            .checked_abs()
            .map(Value::Integer)
            .ok_or(ValueError::Overflow("abs")),
        Some(Number::Float(x)) => Ok(Value::Float(x.abs())),
        None => Err(ValueError::TypeError {
            expected: "number",
            actual: args[0].type_name(),
        }),
    }
}

/// Candidates of `min`/`max`: a single iterable, or the arguments themselves
fn extremum_candidates(function: &'static str, args: &[Value]) -> ValueResult<Vec<Value>> {
    expect_arity(function, args, "at least 1", |n| n >= 1)?;
    let candidates = if args.len() == 1 {
        operators::iterate(&args[0])?
    } else {
        args.to_vec()
    };
    if candidates.is_empty() {
        return Err(ValueError::InvalidOperation(format!(
            "{}() arg is an empty sequence",
            function
        )));
    }
    Ok(candidates)
}

fn extremum(function: &'static str, args: &[Value], wanted: Ordering) -> ValueResult<Value> {
    let mut candidates = extremum_candidates(function, args)?.into_iter();
    let mut best = match candidates.next() {
        Some(first) => first,
        None => return Err(ValueError::InvalidOperation(format!("{}() of nothing", function))),
    };
    for candidate in candidates {
        if candidate.compare(&best)? == Some(wanted) {
            best = candidate;
        }
    }
    Ok(best)
}

fn builtin_min(args: &[Value]) -> ValueResult<Value> {
    extremum("min", args, Ordering::Less)
}

fn builtin_max(args: &[Value]) -> ValueResult<Value> {
    extremum("max", args, Ordering::Greater)
}

fn builtin_sum(args: &[Value]) -> ValueResult<Value> {
    expect_arity("sum", args, "1 or 2", |n| n == 1 || n == 2)?;
    let start = args.get(1).cloned().unwrap_or(Value::Integer(0));
    operators::iterate(&args[0])?
        .iter()
        .try_fold(start, |total, item| operators::binary(BinaryOp::Add, &total, item))
}

fn builtin_all(args: &[Value]) -> ValueResult<Value> {
    expect_arity("all", args, "1", |n| n == 1)?;
    Ok(Value::Boolean(
        operators::iterate(&args[0])?.iter().all(Value::is_truthy),
    ))
}

fn builtin_any(args: &[Value]) -> ValueResult<Value> {
    expect_arity("any", args, "1", |n| n == 1)?;
    Ok(Value::Boolean(
        operators::iterate(&args[0])?.iter().any(Value::is_truthy),
    ))
}

fn integer_arg(value: &Value) -> ValueResult<i64> {
    match value.as_numeric() {
        Some(Number::Int(n)) => Ok(n),
        _ => Err(ValueError::TypeError {
            expected: "int",
            actual: value.type_name(),
        }),
    }
}

fn builtin_range(args: &[Value]) -> ValueResult<Value> {
    let (start, stop, step) = match args {
        [stop] => (0, integer_arg(stop)?, 1),
        [start, stop] => (integer_arg(start)?, integer_arg(stop)?, 1),
        [start, stop, step] => (integer_arg(start)?, integer_arg(stop)?, integer_arg(step)?),
        _ => {
            return Err(ValueError::ArityMismatch {
                function: "range",
                expected: "1 to 3",
                actual: args.len(),
            })
        }
    };
    if step == 0 {
        return Err(ValueError::InvalidOperation(
            "range() arg 3 must not be zero".to_string(),
        ));
    }

    let len = range_len(start, stop, step);
    if len > operators::MAX_SEQUENCE_LEN as u128 {
        return Err(ValueError::SequenceTooLong {
            operation: "range",
            limit: operators::MAX_SEQUENCE_LEN,
        });
    }
    // every element lies between start and stop, so none overflows
    let items = (0..len as i128)
        .map(|i| Value::Integer((i128::from(start) + i * i128::from(step)) as i64))
        .collect();
    Ok(Value::List(items))
}

fn range_len(start: i64, stop: i64, step: i64) -> u128 {
    let (start, stop, step) = (i128::from(start), i128::from(stop), i128::from(step));
    let span = if step > 0 { stop - start } else { start - stop };
    if span <= 0 {
        return 0;
    }
    let step = step.unsigned_abs();
    (span as u128 + step - 1) / step
}

/// Sort with the predicate-language ordering, failing on unorderable items
fn sort_values(items: &mut [Value]) -> ValueResult<()> {
    let mut error = None;
    items.sort_by(|a, b| match a.compare(b) {
        Ok(ordering) => ordering.unwrap_or(Ordering::Equal),
        Err(e) => {
            error.get_or_insert(e);
            Ordering::Equal
        }
    });
    match error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

fn builtin_sorted(args: &[Value]) -> ValueResult<Value> {
    expect_arity("sorted", args, "1", |n| n == 1)?;
    let mut items = operators::iterate(&args[0])?;
    sort_values(&mut items)?;
    Ok(Value::List(items))
}

/// Distinct items, sorted when they are mutually orderable so that two
/// sets with the same members compare equal
fn builtin_set(args: &[Value]) -> ValueResult<Value> {
    expect_arity("set", args, "0 or 1", |n| n <= 1)?;
    let mut distinct: Vec<Value> = Vec::new();
    if let Some(iterable) = args.first() {
        for item in operators::iterate(iterable)? {
            if !distinct.contains(&item) {
                distinct.push(item);
            }
        }
    }
    let mut sorted = distinct.clone();
    Ok(Value::List(match sort_values(&mut sorted) {
        Ok(()) => sorted,
        Err(_) => distinct,
    }))
}

fn builtin_list(args: &[Value]) -> ValueResult<Value> {
    expect_arity("list", args, "0 or 1", |n| n <= 1)?;
    match args.first() {
        Some(iterable) => operators::iterate(iterable).map(Value::List),
        None => Ok(Value::List(Vec::new())),
    }
}

fn builtin_int(args: &[Value]) -> ValueResult<Value> {
    expect_arity("int", args, "1", |n| n == 1)?;
    match &args[0] {
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|e| ValueError::ConversionError {
                from: "str",
                to: "int",
                reason: e.to_string(),
            }),
        Value::Float(x) if !x.is_finite() => Err(ValueError::ConversionError {
            from: "float",
            to: "int",
            reason: format!("{} has no integer value", x),
        }),
        Value::Float(x) if x.trunc() < i64::MIN as f64 || x.trunc() >= i64::MAX as f64 => {
            Err(ValueError::Overflow("int"))
        }
        other => match other.as_numeric() {
            Some(Number::Int(n)) => Ok(Value::Integer(n)),
            Some(Number::Float(x)) => Ok(Value::Integer(x.trunc() as i64)),
            None => Err(ValueError::ConversionError {
                from: other.type_name(),
                to: "int",
                reason: "not a number".to_string(),
            }),
        },
    }
}

fn builtin_float(args: &[Value]) -> ValueResult<Value> {
    expect_arity("float", args, "1", |n| n == 1)?;
    match &args[0] {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| ValueError::ConversionError {
                from: "str",
                to: "float",
                reason: e.to_string(),
            }),
        other => other.as_number().map(Value::Float),
    }
}

fn builtin_str(args: &[Value]) -> ValueResult<Value> {
    expect_arity("str", args, "1", |n| n == 1)?;
    Ok(Value::String(args[0].to_plain_string()))
}

fn builtin_bool(args: &[Value]) -> ValueResult<Value> {
    expect_arity("bool", args, "1", |n| n == 1)?;
    Ok(Value::Boolean(args[0].is_truthy()))
}

/// Round half to even
fn round_half_even(x: f64) -> f64 {
    let rounded = x.round();
    if (x - x.trunc()).abs() == 0.5 {
        2.0 * (x / 2.0).round()
    } else {
        rounded
    }
}

fn builtin_round(args: &[Value]) -> ValueResult<Value> {
    expect_arity("round", args, "1 or 2", |n| n == 1 || n == 2)?;
    let number = args[0].as_numeric().ok_or(ValueError::TypeError {
        expected: "number",
        actual: args[0].type_name(),
    })?;

    match (number, args.get(1)) {
        (Number::Int(n), _) => Ok(Value::Integer(n)),
        (Number::Float(x), None) => {
            let rounded = round_half_even(x);
            if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
                return Err(ValueError::Overflow("round"));
            }
            Ok(Value::Integer(rounded as i64))
        }
        (Number::Float(x), Some(digits)) => {
            let digits = i32::try_from(integer_arg(digits)?)
                .map_err(|_| ValueError::Overflow("round"))?;
            let factor = 10f64.powi(digits);
            Ok(Value::Float(round_half_even(x * factor) / factor))
        }
    }
}

/// Methods of the non-object value types
pub(super) fn call_method(receiver: &Value, method: &str, args: &[Value]) -> ValueResult<Value> {
    match (receiver, method) {
        (Value::List(items), "count") => {
            expect_arity("count", args, "1", |n| n == 1)?;
            let count = items.iter().filter(|item| **item == args[0]).count();
            i64::try_from(count)
                .map(Value::Integer)
                .map_err(|_| ValueError::Overflow("count"))
        }
        (Value::List(items), "index") => {
            expect_arity("index", args, "1", |n| n == 1)?;
            items
                .iter()
                .position(|item| *item == args[0])
                .and_then(|position| i64::try_from(position).ok())
                .map(Value::Integer)
                .ok_or_else(|| ValueError::InvalidOperation(format!("{} is not in list", args[0])))
        }
        (Value::String(s), "startswith") => {
            expect_arity("startswith", args, "1", |n| n == 1)?;
            Ok(Value::Boolean(s.starts_with(args[0].as_string()?)))
        }
        (Value::String(s), "endswith") => {
            expect_arity("endswith", args, "1", |n| n == 1)?;
            Ok(Value::Boolean(s.ends_with(args[0].as_string()?)))
        }
        (Value::String(s), "upper") => {
            expect_arity("upper", args, "0", |n| n == 0)?;
            Ok(Value::String(s.to_uppercase()))
        }
        (Value::String(s), "lower") => {
            expect_arity("lower", args, "0", |n| n == 0)?;
            Ok(Value::String(s.to_lowercase()))
        }
        (Value::Map(map), "get") => {
            expect_arity("get", args, "1 or 2", |n| n == 1 || n == 2)?;
            let key = args[0].as_string()?;
            Ok(map
                .get(key)
                .cloned()
                .unwrap_or_else(|| args.get(1).cloned().unwrap_or(Value::Nil)))
        }
        (Value::Map(map), "keys") => {
            expect_arity("keys", args, "0", |n| n == 0)?;
            Ok(Value::List(
                sorted_keys(map).into_iter().map(|key| Value::String(key.clone())).collect(),
            ))
        }
        (Value::Map(map), "values") => {
            expect_arity("values", args, "0", |n| n == 0)?;
            Ok(Value::List(
                sorted_keys(map).into_iter().map(|key| map[key].clone()).collect(),
            ))
        }
        (other, _) => Err(ValueError::InvalidOperation(format!(
            "'{}' object has no method '{}'",
            other.type_name(),
            method
        ))),
    }
}

fn sorted_keys(map: &FxHashMap<String, Value>) -> Vec<&String> {
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    keys
}
