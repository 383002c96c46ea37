//! Integration tests for contract-bearing classes

use std::cell::Cell;
use std::rc::Rc;

use dbc_contracts::{
    Class, ConstructorDef, ContractConfig, ContractError, ContractKind, MethodDef,
    MissingAttributePolicy, SetupError, Value,
};

fn bla_class() -> Class {
    Class::builder("Bla")
        .doc("Holds a bla.\n\n    hinv: self.bla > 5")
        .constructor(
            ConstructorDef::new(|this, args| this.set("bla", args[0].clone())).with_params(["bla"]),
        )
        .build()
        .unwrap()
}

#[test]
fn test_assignment_violation_keeps_the_write() {
    let obj = bla_class().instantiate(vec![Value::Integer(10)]).unwrap();
    obj.set("bla", 6).unwrap();

    let err = obj.set("bla", 5).unwrap_err();
    let violation = err.violation().expect("expected a violation");
    assert_eq!(violation.predicate, "self.bla > 5");
    assert_eq!(violation.kind, ContractKind::HardInvariant);
    assert_eq!(violation.scope, "Bla");
    assert_eq!(err.to_string(), "contract `self.bla > 5` violated");

    // the engine does not roll the write back
    assert_eq!(obj.get("bla"), Some(Value::Integer(5)));
}

#[test]
fn test_construction_violation() {
    let err = bla_class().instantiate(vec![Value::Integer(3)]).unwrap_err();
    assert_eq!(err.violation().unwrap().predicate, "self.bla > 5");
}

#[test]
fn test_writes_during_construction_are_not_checked() {
    let class = Class::builder("Steps")
        .doc("hinv: self.x > 0")
        .constructor(ConstructorDef::new(|this, _| {
            this.set("x", -1)?;
            this.set("x", 1)
        }))
        .build()
        .unwrap();

    let obj = class.instantiate(vec![]).unwrap();
    assert_eq!(obj.get("x"), Some(Value::Integer(1)));
}

fn inherited_classes() -> (Class, Class) {
    let base = Class::builder("Base")
        .doc("hinv: self.bla < 15")
        .constructor(ConstructorDef::new(|this, _| this.set("bla", 1)))
        .build()
        .unwrap();

    let parent = base.clone();
    let derived = Class::builder("Derived")
        .doc("hinv: self.blabla < 20")
        .extends(&base)
        .constructor(ConstructorDef::new(move |this, _| {
            parent.init_instance(this, vec![])?;
            this.set("blabla", 1)
        }))
        .build()
        .unwrap();

    (base, derived)
}

#[test]
fn test_inherited_invariants_are_checked_base_first() {
    let (_, derived) = inherited_classes();
    let obj = derived.instantiate(vec![]).unwrap();
    assert_eq!(obj.get("bla"), Some(Value::Integer(1)));
    assert_eq!(obj.invariants(), vec!["self.bla < 15", "self.blabla < 20"]);

    let err = obj.set("blabla", 30).unwrap_err();
    assert_eq!(err.violation().unwrap().predicate, "self.blabla < 20");
    assert_eq!(err.violation().unwrap().scope, "Derived");

    // both are now false; the base invariant is reported
    let err = obj.set("bla", 100).unwrap_err();
    assert_eq!(err.violation().unwrap().predicate, "self.bla < 15");
    assert_eq!(err.violation().unwrap().scope, "Base");
}

#[test]
fn test_base_instances_only_see_base_invariants() {
    let (base, _) = inherited_classes();
    let obj = base.instantiate(vec![]).unwrap();
    obj.set("blabla", 100).unwrap();
    assert_eq!(obj.invariants(), vec!["self.bla < 15"]);
}

#[test]
fn test_super_constructor_requires_an_instance() {
    let (base, derived) = inherited_classes();
    let obj = base.instantiate(vec![]).unwrap();
    let err = derived.init_instance(&obj, vec![]).unwrap_err();
    assert!(matches!(
        err,
        ContractError::NotAnInstance { ref expected, ref actual }
            if expected == "Derived" && actual == "Base"
    ));
}

#[test]
fn test_constructor_contract_is_a_setup_error() {
    let err = Class::builder("Bla")
        .constructor(
            ConstructorDef::new(|this, _| this.set("bla", 1)).with_doc("pre: self.bla < 5"),
        )
        .build()
        .unwrap_err();

    assert_eq!(
        err,
        SetupError::ConstructorContract {
            scope: "Bla.__init__".to_string(),
            predicate: "self.bla < 5".to_string(),
        }
    );
}

fn stack_class() -> Class {
    Class::builder("Stack")
        .doc("hinv: len(self.items) <= 3")
        .constructor(ConstructorDef::new(|this, _| this.set("items", Value::List(vec![]))))
        .method(
            MethodDef::new("push", |this, args| {
                let mut items = this.attr("items")?.as_list()?.to_vec();
                items.push(args[0].clone());
                this.set("items", items)?;
                Ok(Value::Nil)
            })
            .with_params(["item"])
            .with_doc(
                "Push an item.

                pre: item is not None
                post: len(self.items) == len(__old__['self'].items) + 1
                post: self.items[-1] == item",
            ),
        )
        .method(
            MethodDef::new("pop", |this, _| {
                let mut items = this.attr("items")?.as_list()?.to_vec();
                let top = items.pop().unwrap_or(Value::Nil);
                this.set("items", items)?;
                Ok(top)
            })
            .with_doc(
                "pre: len(self.items) > 0
                post: __ret__ == __old__['self'].items[-1]",
            ),
        )
        .method(
            MethodDef::new("forget", |_, _| Ok(Value::Nil))
                .with_params(["item"])
                .with_doc("post: item in self.items"),
        )
        .build()
        .unwrap()
}

#[test]
fn test_method_pre_and_postconditions() {
    let stack = stack_class().instantiate(vec![]).unwrap();
    stack.call("push", vec![Value::Integer(1)]).unwrap();
    stack.call("push", vec![Value::Integer(2)]).unwrap();
    assert_eq!(stack.call("pop", vec![]).unwrap(), Value::Integer(2));
    assert_eq!(stack.call("pop", vec![]).unwrap(), Value::Integer(1));

    let err = stack.call("pop", vec![]).unwrap_err();
    let violation = err.violation().unwrap();
    assert_eq!(violation.kind, ContractKind::Precondition);
    assert_eq!(violation.predicate, "len(self.items) > 0");
    assert_eq!(violation.scope, "Stack.pop");

    let err = stack.call("push", vec![Value::Nil]).unwrap_err();
    assert_eq!(err.violation().unwrap().predicate, "item is not None");
}

#[test]
fn test_postcondition_violation() {
    let stack = stack_class().instantiate(vec![]).unwrap();
    let err = stack.call("forget", vec![Value::Integer(7)]).unwrap_err();
    let violation = err.violation().unwrap();
    assert_eq!(violation.kind, ContractKind::Postcondition);
    assert_eq!(violation.scope, "Stack.forget");
}

#[test]
fn test_hard_invariant_fires_inside_method_body() {
    let stack = stack_class().instantiate(vec![]).unwrap();
    for i in 0..3 {
        stack.call("push", vec![Value::Integer(i)]).unwrap();
    }
    let err = stack.call("push", vec![Value::Integer(3)]).unwrap_err();
    assert_eq!(err.violation().unwrap().predicate, "len(self.items) <= 3");
    assert_eq!(stack.get("items").unwrap().as_list().unwrap().len(), 4);
}

#[test]
fn test_unknown_method_and_arity() {
    let stack = stack_class().instantiate(vec![]).unwrap();
    assert!(matches!(
        stack.call("peek", vec![]),
        Err(ContractError::UnknownMethod { .. })
    ));
    assert!(matches!(
        stack.call("push", vec![]),
        Err(ContractError::ArityMismatch { expected: 1, actual: 0, .. })
    ));
}

fn account_class() -> Class {
    Class::builder("Account")
        .doc("sinv: self.balance >= 0")
        .constructor(ConstructorDef::new(|this, _| this.set("balance", 0)))
        .method(
            MethodDef::new("deposit", |this, args| {
                let balance = this.attr("balance")?.as_integer()?;
                this.set("balance", balance + args[0].as_integer()?)?;
                Ok(Value::Nil)
            })
            .with_params(["amount"]),
        )
        .method(
            MethodDef::new("withdraw", |this, args| {
                let balance = this.attr("balance")?.as_integer()?;
                this.set("balance", balance - args[0].as_integer()?)?;
                Ok(Value::Nil)
            })
            .with_params(["amount"]),
        )
        .method(MethodDef::new("rebalance", |this, _| {
            let balance = this.attr("balance")?;
            this.set("balance", -1)?;
            this.set("balance", balance)?;
            Ok(Value::Nil)
        }))
        .build()
        .unwrap()
}

#[test]
fn test_soft_invariant_may_break_inside_a_method() {
    let account = account_class().instantiate(vec![]).unwrap();
    account.call("deposit", vec![Value::Integer(10)]).unwrap();
    account.call("rebalance", vec![]).unwrap();
    assert_eq!(account.get("balance"), Some(Value::Integer(10)));
}

#[test]
fn test_soft_invariant_checked_on_method_exit() {
    let account = account_class().instantiate(vec![]).unwrap();
    let err = account.call("withdraw", vec![Value::Integer(5)]).unwrap_err();
    let violation = err.violation().unwrap();
    assert_eq!(violation.kind, ContractKind::SoftInvariant);
    assert_eq!(violation.predicate, "self.balance >= 0");
    assert_eq!(violation.scope, "Account");
    assert_eq!(account.get("balance"), Some(Value::Integer(-5)));
}

#[test]
fn test_soft_invariant_checked_on_method_entry() {
    let account = account_class().instantiate(vec![]).unwrap();
    // plain writes only check hard invariants
    account.set("balance", -3).unwrap();

    let err = account.call("deposit", vec![Value::Integer(1)]).unwrap_err();
    assert_eq!(err.violation().unwrap().kind, ContractKind::SoftInvariant);
    // the body never ran
    assert_eq!(account.get("balance"), Some(Value::Integer(-3)));
}

#[test]
fn test_soft_invariants_checked_before_own_predicates() {
    let class = Class::builder("Ledger")
        .doc("sinv: self.balance >= 0")
        .constructor(ConstructorDef::new(|this, _| this.set("balance", 0)))
        .method(
            MethodDef::new("withdraw", |this, args| {
                let balance = this.attr("balance")?.as_integer()? - args[0].as_integer()?;
                this.set("balance", balance)?;
                Ok(Value::Integer(balance))
            })
            .with_params(["amount"])
            .with_doc("pre: amount > 0\npost: __ret__ >= 0"),
        )
        .build()
        .unwrap();

    // entry: both the soft invariant and the precondition are false
    let ledger = class.instantiate(vec![]).unwrap();
    ledger.set("balance", -3).unwrap();
    let err = ledger.call("withdraw", vec![Value::Integer(-1)]).unwrap_err();
    let violation = err.violation().unwrap();
    assert_eq!(violation.kind, ContractKind::SoftInvariant);
    assert_eq!(violation.predicate, "self.balance >= 0");

    // exit: both the soft invariant and the postcondition are false
    let ledger = class.instantiate(vec![]).unwrap();
    let err = ledger.call("withdraw", vec![Value::Integer(4)]).unwrap_err();
    assert_eq!(err.violation().unwrap().kind, ContractKind::SoftInvariant);
    assert_eq!(ledger.get("balance"), Some(Value::Integer(-4)));
}

fn self_validating_class() -> Class {
    Class::builder("Gauge")
        .doc("sinv: self.valid()")
        .constructor(ConstructorDef::new(|this, _| this.set("level", 1)))
        .method(MethodDef::new("valid", |this, _| {
            Ok(Value::Boolean(this.attr("level")?.as_integer()? > 0))
        }))
        .build()
        .unwrap()
}

#[test]
fn test_soft_invariant_calling_own_method_terminates() {
    let gauge = self_validating_class().instantiate(vec![]).unwrap();
    assert_eq!(gauge.call("valid", vec![]).unwrap(), Value::Boolean(true));

    gauge.set("level", -1).unwrap();
    let err = gauge.call("valid", vec![]).unwrap_err();
    let violation = err.violation().unwrap();
    assert_eq!(violation.kind, ContractKind::SoftInvariant);
    assert_eq!(violation.predicate, "self.valid()");

    // the flag is cleared once the failed check unwinds
    gauge.set("level", 2).unwrap();
    assert_eq!(gauge.call("valid", vec![]).unwrap(), Value::Boolean(true));
}

#[test]
fn test_inherited_methods_see_subclass_soft_invariants() {
    let capped = Class::builder("Capped")
        .doc("sinv: self.balance <= 100")
        .extends(&account_class())
        .build()
        .unwrap();
    let account = capped.instantiate(vec![]).unwrap();

    account.call("deposit", vec![Value::Integer(100)]).unwrap();
    let err = account.call("deposit", vec![Value::Integer(1)]).unwrap_err();
    let violation = err.violation().unwrap();
    assert_eq!(violation.predicate, "self.balance <= 100");
    assert_eq!(violation.scope, "Capped");
}

#[test]
fn test_invariant_may_call_methods() {
    let checks = Rc::new(Cell::new(0));
    let counter = checks.clone();
    let class = Class::builder("Checked")
        .doc("hinv: self.check()")
        .constructor(ConstructorDef::new(|this, _| this.set("value", 1)))
        .method(MethodDef::new("check", move |this, _| {
            counter.set(counter.get() + 1);
            // writes made while checking do not re-enter the check
            this.set("last_checked", this.attr("value")?)?;
            Ok(Value::Boolean(this.attr("value")?.as_integer()? > 0))
        }))
        .build()
        .unwrap();

    let obj = class.instantiate(vec![]).unwrap();
    assert_eq!(checks.get(), 1);

    obj.set("value", 2).unwrap();
    assert_eq!(checks.get(), 2);
    assert_eq!(obj.get("last_checked"), Some(Value::Integer(2)));

    let err = obj.set("value", -1).unwrap_err();
    assert_eq!(err.violation().unwrap().predicate, "self.check()");
}

#[test]
fn test_missing_attributes_are_tolerated_by_default() {
    let class = Class::builder("Lazy")
        .doc("hinv: self.a > 0\nhinv: self.b > 0")
        .build()
        .unwrap();

    let obj = class.instantiate(vec![]).unwrap();
    obj.set("a", 1).unwrap();
    let err = obj.set("b", 0).unwrap_err();
    assert_eq!(err.violation().unwrap().predicate, "self.b > 0");
}

#[test]
fn test_missing_attributes_under_strict_policy() {
    let class = Class::builder("Lazy")
        .doc("hinv: self.a > 0")
        .config(ContractConfig::new().with_missing_attributes(MissingAttributePolicy::Strict))
        .build()
        .unwrap();

    let err = class.instantiate(vec![]).unwrap_err();
    assert!(matches!(
        err,
        ContractError::MissingAttribute { ref attribute, .. } if attribute == "a"
    ));
}

#[test]
fn test_undefined_names_always_propagate() {
    let class = Class::builder("Typo")
        .doc("hinv: slef.a > 0")
        .build()
        .unwrap();

    let err = class.instantiate(vec![]).unwrap_err();
    assert!(matches!(err, ContractError::UndefinedName(ref name) if name == "slef"));
}

#[test]
fn test_evaluation_faults_are_not_violations() {
    let class = Class::builder("Ratio")
        .doc("hinv: 10 / self.d > 1")
        .constructor(ConstructorDef::new(|this, _| this.set("d", 2)))
        .build()
        .unwrap();

    let obj = class.instantiate(vec![]).unwrap();
    let err = obj.set("d", 0).unwrap_err();
    assert!(!err.is_violation());
    assert!(matches!(err, ContractError::Value(_)));
}

#[test]
fn test_malformed_invariant_fails_when_evaluated() {
    let class = Class::builder("Broken")
        .doc("hinv: self.a >")
        .build()
        .unwrap();

    assert!(matches!(
        class.instantiate(vec![]),
        Err(ContractError::Parse { ref predicate, .. }) if predicate == "self.a >"
    ));
}

#[test]
fn test_disabled_class_never_checks() {
    let class = Class::builder("Quiet")
        .doc("hinv: self.bla > 5\nsinv: self.bla > 100")
        .config(ContractConfig::disabled())
        .constructor(ConstructorDef::new(|this, _| this.set("bla", 0)))
        .method(MethodDef::new("touch", |_, _| Ok(Value::Boolean(true))))
        .build()
        .unwrap();

    let obj = class.instantiate(vec![]).unwrap();
    obj.set("bla", -1).unwrap();
    assert_eq!(obj.call("touch", vec![]).unwrap(), Value::Boolean(true));
}

#[test]
fn test_every_attribute_name_is_checked() {
    let obj = bla_class().instantiate(vec![Value::Integer(10)]).unwrap();
    obj.set("bla", 1).unwrap_err();

    let err = obj.set("__tag__", "anything").unwrap_err();
    assert_eq!(err.violation().unwrap().predicate, "self.bla > 5");
    assert_eq!(obj.get("__tag__"), Some(Value::from("anything")));
}

#[test]
fn test_constructor_error_is_returned_unaltered() {
    let class = Class::builder("Fragile")
        .doc("hinv: self.n > 0")
        .constructor(ConstructorDef::new(|this, _| {
            this.set("n", 1)?;
            Err(ContractError::body("disk unavailable"))
        }))
        .build()
        .unwrap();

    let err = class.instantiate(vec![]).unwrap_err();
    assert!(matches!(err, ContractError::Body(_)));
    assert!(!err.is_violation());
    assert_eq!(err.to_string(), "disk unavailable");
}
