//! Design-by-contract engine
//!
//! Functions and classes declare their contracts as tagged lines in their
//! documentation text:
//!
//! - `pre:` preconditions, checked before the body runs
//! - `post:` postconditions, checked after it returns; `__ret__` is the
//!   return value and `__old__` maps each argument (and `self`) to a copy
//!   taken before the call
//! - `hinv:` (or `inv:`) hard invariants, checked after every attribute
//!   write on a live object
//! - `sinv:` soft invariants, checked on entry to and exit from every method
//!
//! A false predicate raises a [`Violation`] carrying the predicate text.
//!
//! ```
//! use dbc_contracts::{wrap, FunctionDef, Value};
//!
//! let calculate = wrap(
//!     FunctionDef::new("calculate", |args| {
//!         let (a, b) = (args[0].as_number()?, args[1].as_number()?);
//!         Ok(Value::Float((a * a + b * b).sqrt()))
//!     })
//!     .with_params(["a", "b"])
//!     .with_doc("pre: a > 0 and b > 0\npost: __ret__ * __ret__ == a * a + b * b"),
//! )
//! .unwrap();
//!
//! let hypotenuse = calculate.call(vec![Value::Integer(3), Value::Integer(4)]).unwrap();
//! assert_eq!(hypotenuse, Value::Integer(5));
//!
//! let err = calculate.call(vec![Value::Integer(-3), Value::Integer(4)]).unwrap_err();
//! assert_eq!(err.to_string(), "contract `a > 0 and b > 0` violated");
//! ```

pub mod callable;
pub mod class;
pub mod config;
pub mod contract;
pub mod environment;
pub mod errors;
pub mod evaluator;
pub mod extractor;
pub mod guard;
pub mod object;
pub mod value;

pub use callable::{wrap, wrap_with_config, ContractedCallable, ContractedFunction, FunctionDef};
pub use class::{Class, ClassBuilder, ConstructorDef, MethodDef};
pub use config::{ContractConfig, MissingAttributePolicy};
pub use contract::{ContractKind, Predicate, PredicateSpec, PredicateStore};
pub use environment::Environment;
pub use errors::{ContractError, ContractResult, SetupError, Violation};
pub use evaluator::Evaluator;
pub use object::{InstanceContractState, Object};
pub use value::{Value, ValueError, ValueResult};
