//! Predicate evaluator
//!
//! Evaluates a parsed predicate against an [`Environment`]. Only the
//! environment's bindings, names bound by enclosing comprehensions and the
//! builtins are visible; there is no other way for a predicate to reach
//! program state.

mod builtins;
mod operators;

use dbc_parser::{Expr, Literal, LogicalOp};
use tracing::trace;

use crate::contract::Predicate;
use crate::environment::Environment;
use crate::errors::{ContractError, ContractResult};
use crate::value::{Value, ValueError};

/// Names bound by enclosing comprehensions, innermost first
struct Scope<'s> {
    name: &'s str,
    value: Value,
    parent: Option<&'s Scope<'s>>,
}

impl<'s> Scope<'s> {
    fn lookup(&self, name: &str) -> Option<&Value> {
        if self.name == name {
            Some(&self.value)
        } else {
            self.parent.and_then(|parent| parent.lookup(name))
        }
    }
}

/// The loop part of a comprehension
struct Generator<'e> {
    element: &'e Expr,
    target: &'e str,
    iterable: &'e Expr,
    condition: Option<&'e Expr>,
}

pub struct Evaluator<'a> {
    env: &'a Environment,
}

impl<'a> Evaluator<'a> {
    pub fn new(env: &'a Environment) -> Self {
        Self { env }
    }

    /// Evaluate a predicate to its truth value
    pub fn evaluate_predicate(&self, predicate: &Predicate) -> ContractResult<bool> {
        let expr = predicate.expr()?;
        let holds = self.evaluate(expr)?.is_truthy();
        trace!(
            predicate = predicate.text(),
            kind = %predicate.kind(),
            holds,
            "evaluated predicate"
        );
        Ok(holds)
    }

    /// Evaluate an expression to a value
    pub fn evaluate(&self, expr: &Expr) -> ContractResult<Value> {
        self.eval(expr, None)
    }

    fn eval(&self, expr: &Expr, scope: Option<&Scope<'_>>) -> ContractResult<Value> {
        match expr {
            Expr::Literal(lit) => Ok(literal_value(lit)),
            Expr::Name(name) => self.lookup(name, scope),
            Expr::Attribute { object, name } => {
                let target = self.eval(object, scope)?;
                get_attribute(&target, name)
            }
            Expr::Index { object, index } => {
                let container = self.eval(object, scope)?;
                let index = self.eval(index, scope)?;
                Ok(operators::index(&container, &index)?)
            }
            Expr::Call { function, args } => self.eval_call(function, args, scope),
            Expr::Unary { op, operand } => {
                let operand = self.eval(operand, scope)?;
                Ok(operators::unary(*op, &operand)?)
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left, scope)?;
                let right = self.eval(right, scope)?;
                Ok(operators::binary(*op, &left, &right)?)
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left, scope)?;
                match (op, left.is_truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval(right, scope),
                }
            }
            Expr::Compare { first, rest } => {
                let mut left = self.eval(first, scope)?;
                for (op, operand) in rest {
                    let right = self.eval(operand, scope)?;
                    if !operators::compare(*op, &left, &right)? {
                        return Ok(Value::Boolean(false));
                    }
                    left = right;
                }
                Ok(Value::Boolean(true))
            }
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval(condition, scope)?.is_truthy() {
                    self.eval(then_branch, scope)
                } else {
                    self.eval(else_branch, scope)
                }
            }
            Expr::List(items) => Ok(Value::List(self.eval_all(items, scope)?)),
            Expr::Comprehension {
                element,
                target,
                iterable,
                condition,
            } => {
                let generator = Generator {
                    element,
                    target,
                    iterable,
                    condition: condition.as_deref(),
                };
                let mut collected = Vec::new();
                self.for_each_element(generator, scope, |value| {
                    collected.push(value);
                    Ok(true)
                })?;
                Ok(Value::List(collected))
            }
        }
    }

    fn eval_all(&self, exprs: &[Expr], scope: Option<&Scope<'_>>) -> ContractResult<Vec<Value>> {
        exprs.iter().map(|expr| self.eval(expr, scope)).collect()
    }

    fn lookup(&self, name: &str, scope: Option<&Scope<'_>>) -> ContractResult<Value> {
        scope
            .and_then(|scope| scope.lookup(name))
            .or_else(|| self.env.get(name))
            .cloned()
            .ok_or_else(|| ContractError::UndefinedName(name.to_string()))
    }

    fn is_bound(&self, name: &str, scope: Option<&Scope<'_>>) -> bool {
        scope.and_then(|scope| scope.lookup(name)).is_some() || self.env.contains(name)
    }

    fn eval_call(
        &self,
        function: &Expr,
        args: &[Expr],
        scope: Option<&Scope<'_>>,
    ) -> ContractResult<Value> {
        match function {
            Expr::Attribute { object, name } => {
                let receiver = self.eval(object, scope)?;
                let args = self.eval_all(args, scope)?;
                match receiver {
                    Value::Object(obj) => obj.call(name, args),
                    other => Ok(builtins::call_method(&other, name, &args)?),
                }
            }
            Expr::Name(name) if !self.is_bound(name, scope) => {
                if let (
                    [Expr::Comprehension {
                        element,
                        target,
                        iterable,
                        condition,
                    }],
                    "all" | "any",
                ) = (args, name.as_str())
                {
                    let generator = Generator {
                        element,
                        target,
                        iterable,
                        condition: condition.as_deref(),
                    };
                    return self.short_circuit(name == "all", generator, scope);
                }
                let builtin = builtins::lookup(name)
                    .ok_or_else(|| ContractError::UndefinedName(name.clone()))?;
                let args = self.eval_all(args, scope)?;
                Ok(builtin(&args)?)
            }
            other => Err(ContractError::NotCallable(other.to_string())),
        }
    }

    /// `all(...)`/`any(...)` over a generator, stopping at the first
    /// element that decides the result
    fn short_circuit(
        &self,
        want_all: bool,
        generator: Generator<'_>,
        scope: Option<&Scope<'_>>,
    ) -> ContractResult<Value> {
        let mut result = want_all;
        self.for_each_element(generator, scope, |value| {
            if value.is_truthy() != want_all {
                result = !want_all;
                return Ok(false);
            }
            Ok(true)
        })?;
        Ok(Value::Boolean(result))
    }

    /// Run `visit` on each produced element until it returns `false`
    fn for_each_element<F>(
        &self,
        generator: Generator<'_>,
        scope: Option<&Scope<'_>>,
        mut visit: F,
    ) -> ContractResult<()>
    where
        F: FnMut(Value) -> ContractResult<bool>,
    {
        let items = operators::iterate(&self.eval(generator.iterable, scope)?)?;

        for item in items {
            let inner = Scope {
                name: generator.target,
                value: item,
                parent: scope,
            };
            if let Some(condition) = generator.condition {
                if !self.eval(condition, Some(&inner))?.is_truthy() {
                    continue;
                }
            }
            let value = self.eval(generator.element, Some(&inner))?;
            if !visit(value)? {
                break;
            }
        }

        Ok(())
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Integer(n) => Value::Integer(*n),
        Literal::Float(x) => Value::Float(*x),
        Literal::String(s) => Value::String(s.clone()),
        Literal::Boolean(b) => Value::Boolean(*b),
        Literal::Nil => Value::Nil,
    }
}

fn get_attribute(target: &Value, name: &str) -> ContractResult<Value> {
    match target {
        Value::Object(obj) => obj.attr(name),
        other => Err(ValueError::InvalidOperation(format!(
            "'{}' object has no attribute '{}'",
            other.type_name(),
            name
        ))
        .into()),
    }
}

#[cfg(test)]
#[path = "evaluator/evaluator_tests.rs"]
mod tests;
