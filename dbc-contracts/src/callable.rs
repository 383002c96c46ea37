//! Callable wrapper: preconditions, snapshot, body, postconditions

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::config::ContractConfig;
use crate::contract::{Predicate, PredicateStore};
use crate::environment::{Environment, SNAPSHOT};
use crate::errors::{ContractError, ContractResult, SetupError};
use crate::evaluator::Evaluator;
use crate::extractor::extract_callable;
use crate::object::Object;
use crate::value::Value;

/// The contract of one function or method, built once and reused for
/// every invocation
#[derive(Debug, Clone)]
pub struct ContractedCallable {
    name: String,
    params: Vec<String>,
    preconditions: Vec<Predicate>,
    postconditions: Vec<Predicate>,
    /// Checked before the own preconditions and again before the own
    /// postconditions (soft invariants of the receiver's class)
    extra: Vec<Predicate>,
    needs_snapshot: bool,
    config: ContractConfig,
}

impl ContractedCallable {
    pub fn new(
        name: impl Into<String>,
        params: Vec<String>,
        store: &PredicateStore,
        extra: Vec<Predicate>,
        config: ContractConfig,
    ) -> Self {
        let depth = config.max_expression_depth;
        let preconditions = Predicate::compile_all(&store.preconditions, depth);
        let postconditions = Predicate::compile_all(&store.postconditions, depth);
        let needs_snapshot = postconditions
            .iter()
            .chain(extra.iter())
            .any(|predicate| predicate.references(SNAPSHOT));

        Self {
            name: name.into(),
            params,
            preconditions,
            postconditions,
            extra,
            needs_snapshot,
            config,
        }
    }

    /// Extract the contract from documentation and compile it
    pub fn from_doc(
        name: &str,
        params: Vec<String>,
        doc: &str,
        extra: Vec<Predicate>,
        config: ContractConfig,
    ) -> Result<Self, SetupError> {
        let store = extract_callable(name, doc)?;
        Ok(Self::new(name, params, &store, extra, config))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn preconditions(&self) -> &[Predicate] {
        &self.preconditions
    }

    pub fn postconditions(&self) -> &[Predicate] {
        &self.postconditions
    }

    pub fn extra(&self) -> &[Predicate] {
        &self.extra
    }

    /// Run `body` under this contract.
    ///
    /// The body sees the arguments mutably; postconditions are evaluated
    /// against the arguments as the body left them. A body error is
    /// returned unaltered and no postcondition is evaluated.
    pub fn invoke<F>(
        &self,
        receiver: Option<&Object>,
        args: &mut [Value],
        body: F,
    ) -> ContractResult<Value>
    where
        F: FnOnce(&mut [Value]) -> ContractResult<Value>,
    {
        if !self.config.enabled {
            return body(args);
        }

        if args.len() != self.params.len() {
            return Err(ContractError::ArityMismatch {
                name: self.name.clone(),
                expected: self.params.len(),
                actual: args.len(),
            });
        }

        let old = {
            let env = Environment::for_call(&self.params, receiver, args);
            self.check_extra(receiver, &env)?;
            check_all(&env, &self.preconditions)?;
            if self.needs_snapshot {
                env.snapshot()
            } else {
                Value::Map(FxHashMap::default())
            }
        };

        let ret = body(&mut *args)?;

        let env = Environment::for_call(&self.params, receiver, args)
            .into_post_call(ret.clone(), old);
        self.check_extra(receiver, &env)?;
        check_all(&env, &self.postconditions)?;

        Ok(ret)
    }

    /// Check the extra predicates. Methods called while the receiver's
    /// extras are being evaluated (`sinv: self.valid()`) skip their own.
    fn check_extra(&self, receiver: Option<&Object>, env: &Environment) -> ContractResult<()> {
        if self.extra.is_empty() {
            return Ok(());
        }
        match receiver {
            Some(obj) if obj.is_checking_soft() => {
                trace!(
                    callable = self.name.as_str(),
                    "called from a soft invariant check, soft invariants not checked"
                );
                Ok(())
            }
            Some(obj) => {
                let _checking = obj.begin_soft_check();
                check_all(env, &self.extra)
            }
            None => check_all(env, &self.extra),
        }
    }
}

/// Evaluate predicates in order, failing on the first false one
pub(crate) fn check_all(env: &Environment, predicates: &[Predicate]) -> ContractResult<()> {
    let evaluator = Evaluator::new(env);
    for predicate in predicates {
        if !evaluator.evaluate_predicate(predicate)? {
            debug!(
                predicate = predicate.text(),
                scope = predicate.scope(),
                kind = %predicate.kind(),
                "contract violated"
            );
            return Err(predicate.violation().into());
        }
    }
    Ok(())
}

pub type FunctionBody = Box<dyn Fn(&mut [Value]) -> ContractResult<Value>>;

/// A standalone function waiting to be wrapped
pub struct FunctionDef {
    name: String,
    params: Vec<String>,
    doc: String,
    body: FunctionBody,
}

impl FunctionDef {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&mut [Value]) -> ContractResult<Value> + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            doc: String::new(),
            body: Box::new(body),
        }
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }
}

/// A function whose every call passes through its contract
pub struct ContractedFunction {
    contract: ContractedCallable,
    body: FunctionBody,
}

impl ContractedFunction {
    pub fn name(&self) -> &str {
        self.contract.name()
    }

    pub fn contract(&self) -> &ContractedCallable {
        &self.contract
    }

    pub fn call(&self, mut args: Vec<Value>) -> ContractResult<Value> {
        self.call_with(&mut args)
    }

    /// Call with arguments the caller keeps, observing in-place mutation
    pub fn call_with(&self, args: &mut [Value]) -> ContractResult<Value> {
        self.contract.invoke(None, args, |args| (self.body)(args))
    }
}

impl std::fmt::Debug for ContractedFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractedFunction")
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

/// Wrap a function with the default configuration
pub fn wrap(def: FunctionDef) -> Result<ContractedFunction, SetupError> {
    wrap_with_config(def, ContractConfig::default())
}

pub fn wrap_with_config(
    def: FunctionDef,
    config: ContractConfig,
) -> Result<ContractedFunction, SetupError> {
    let contract = ContractedCallable::from_doc(&def.name, def.params, &def.doc, Vec::new(), config)?;
    debug!(
        function = contract.name(),
        preconditions = contract.preconditions().len(),
        postconditions = contract.postconditions().len(),
        "wrapped function"
    );
    Ok(ContractedFunction {
        contract,
        body: def.body,
    })
}
