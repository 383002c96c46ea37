//! Integration tests for wrapped standalone functions

use std::cell::Cell;
use std::rc::Rc;

use dbc_contracts::{
    wrap, wrap_with_config, ContractConfig, ContractError, ContractKind, ContractedFunction,
    FunctionDef, Value,
};

fn calculate(calls: Rc<Cell<usize>>) -> ContractedFunction {
    wrap(
        FunctionDef::new("calculate", move |args| {
            calls.set(calls.get() + 1);
            let (a, b) = (args[0].as_number()?, args[1].as_number()?);
            Ok(Value::Float((a * a + b * b).sqrt()))
        })
        .with_params(["a", "b"])
        .with_doc(
            "Calculate the hypotenuse.

            pre: a>0 and b>0
            post: __ret__*__ret__ == a*a + b*b",
        ),
    )
    .unwrap()
}

#[test]
fn test_standalone_function() {
    let calls = Rc::new(Cell::new(0));
    let f = calculate(calls.clone());

    assert_eq!(
        f.call(vec![Value::Integer(3), Value::Integer(4)]).unwrap(),
        Value::Integer(5)
    );
    assert_eq!(calls.get(), 1);

    let err = f.call(vec![Value::Integer(-1), Value::Integer(10)]).unwrap_err();
    assert_eq!(err.to_string(), "contract `a>0 and b>0` violated");
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_postcondition_sees_return_value() {
    let f = wrap(
        FunctionDef::new("halve", |args| Ok(Value::Integer(args[0].as_integer()? / 2)))
            .with_params(["n"])
            .with_doc("post: __ret__ * 2 == n"),
    )
    .unwrap();

    assert_eq!(f.call(vec![Value::Integer(8)]).unwrap(), Value::Integer(4));
    let err = f.call(vec![Value::Integer(7)]).unwrap_err();
    let violation = err.violation().unwrap();
    assert_eq!(violation.kind, ContractKind::Postcondition);
    assert_eq!(violation.scope, "halve");
}

fn sorter(drop_duplicates: bool) -> ContractedFunction {
    wrap(
        FunctionDef::new("sort", move |args| {
            let mut items = args[0]
                .as_list()?
                .iter()
                .map(Value::as_integer)
                .collect::<Result<Vec<i64>, _>>()?;
            items.sort_unstable();
            if drop_duplicates {
                items.dedup();
            }
            args[0] = Value::list(items);
            Ok(Value::Nil)
        })
        .with_params(["a"])
        .with_doc(
            "Sort in place.

            post: all(a[i] <= a[i + 1] for i in range(len(a) - 1))
            post: all(__old__['a'].count(x) == a.count(x) for x in __old__['a'])
            post: len(a) == len(__old__['a'])",
        ),
    )
    .unwrap()
}

#[test]
fn test_in_place_sort_with_old_values() {
    let mut args = vec![Value::list([3, 1, 2, 1])];
    sorter(false).call_with(&mut args).unwrap();
    assert_eq!(args[0], Value::list([1, 1, 2, 3]));
}

#[test]
fn test_in_place_sort_losing_elements_is_caught() {
    let mut args = vec![Value::list([3, 1, 3])];
    let err = sorter(true).call_with(&mut args).unwrap_err();
    assert_eq!(
        err.violation().unwrap().predicate,
        "all(__old__['a'].count(x) == a.count(x) for x in __old__['a'])"
    );
    // the body's mutation stays visible to the caller
    assert_eq!(args[0], Value::list([1, 3]));
}

#[test]
fn test_preconditions_run_in_declared_order() {
    let f = wrap(
        FunctionDef::new("f", |_| Ok(Value::Nil))
            .with_params(["x"])
            .with_doc("pre: x > 0\npre: x > 10\npre: x > 100"),
    )
    .unwrap();

    let err = f.call(vec![Value::Integer(5)]).unwrap_err();
    assert_eq!(err.violation().unwrap().predicate, "x > 10");
}

#[test]
fn test_invariant_lines_on_functions_are_ignored() {
    let f = wrap(
        FunctionDef::new("f", |_| Ok(Value::Nil)).with_doc("hinv: False\nsinv: False"),
    )
    .unwrap();
    assert_eq!(f.call(vec![]).unwrap(), Value::Nil);
}

#[test]
fn test_body_errors_pass_through() {
    let f = wrap(
        FunctionDef::new("parse", |args| {
            let text = args[0].as_string()?;
            text.parse::<i64>()
                .map(Value::Integer)
                .map_err(|e| ContractError::Body(e.into()))
        })
        .with_params(["text"])
        .with_doc("post: __ret__ >= 0"),
    )
    .unwrap();

    assert_eq!(f.call(vec![Value::from("12")]).unwrap(), Value::Integer(12));
    let err = f.call(vec![Value::from("twelve")]).unwrap_err();
    assert!(matches!(err, ContractError::Body(_)));
    assert!(!err.is_violation());
}

#[test]
fn test_undefined_name_in_precondition_is_an_error() {
    let f = wrap(
        FunctionDef::new("f", |_| Ok(Value::Nil))
            .with_params(["x"])
            .with_doc("pre: y > 0"),
    )
    .unwrap();

    assert!(matches!(
        f.call(vec![Value::Integer(1)]),
        Err(ContractError::UndefinedName(ref name)) if name == "y"
    ));
}

#[test]
fn test_config_from_json() {
    let config: ContractConfig = serde_json::from_str(r#"{ "enabled": false }"#).unwrap();
    let f = wrap_with_config(
        FunctionDef::new("f", |_| Ok(Value::Nil))
            .with_params(["x"])
            .with_doc("pre: x > 0"),
        config,
    )
    .unwrap();

    assert_eq!(f.call(vec![Value::Integer(-1)]).unwrap(), Value::Nil);
}

#[test]
fn test_deep_predicate_is_rejected_when_evaluated() {
    let deep = format!("{}x{}", "(".repeat(20), ")".repeat(20));
    let f = wrap_with_config(
        FunctionDef::new("f", |_| Ok(Value::Nil))
            .with_params(["x"])
            .with_doc(format!("pre: {}", deep)),
        ContractConfig::new().with_max_expression_depth(8),
    )
    .unwrap();

    assert!(matches!(
        f.call(vec![Value::Integer(1)]),
        Err(ContractError::Parse { .. })
    ));
}
