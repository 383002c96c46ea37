//! Contract-bearing classes and the inheritance aggregator
//!
//! A [`Class`] is registered once through [`ClassBuilder::build`]. At that
//! point the ancestor chain is walked base to derived, hard and soft
//! invariants are aggregated, and every method visible on the class
//! (own or inherited) is wrapped in a [`ContractedCallable`] carrying the
//! full soft-invariant set. Instances share the resulting method table.
//!
//! ```
//! use dbc_contracts::{Class, ConstructorDef, MethodDef, Value};
//!
//! let counter = Class::builder("Counter")
//!     .doc("hinv: self.count >= 0")
//!     .constructor(ConstructorDef::new(|this, _| this.set("count", 0)))
//!     .method(
//!         MethodDef::new("increment", |this, _| {
//!             let count = this.attr("count")?.as_integer()?;
//!             this.set("count", count + 1)?;
//!             Ok(Value::Nil)
//!         })
//!         .with_doc("post: self.count == __old__[\"self\"].count + 1"),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let c = counter.instantiate(vec![]).unwrap();
//! c.call("increment", vec![]).unwrap();
//! assert_eq!(c.get("count"), Some(Value::Integer(1)));
//! ```

use std::fmt;
use std::iter;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::callable::ContractedCallable;
use crate::config::ContractConfig;
use crate::contract::Predicate;
use crate::errors::{ContractError, ContractResult, SetupError};
use crate::extractor::{extract_callable, extract_class_chain, CONSTRUCTOR_NAME};
use crate::guard;
use crate::object::Object;
use crate::value::Value;

pub type MethodBody = Rc<dyn Fn(&Object, &mut [Value]) -> ContractResult<Value>>;
pub type ConstructorBody = Rc<dyn Fn(&Object, &mut [Value]) -> ContractResult<()>>;

fn param_names<I, S>(params: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    params.into_iter().map(Into::into).collect()
}

/// A method definition, before wrapping
#[derive(Clone)]
pub struct MethodDef {
    name: String,
    params: Vec<String>,
    doc: String,
    body: MethodBody,
}

impl MethodDef {
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Object, &mut [Value]) -> ContractResult<Value> + 'static,
    {
        Self {
            name: name.into(),
            params: Vec::new(),
            doc: String::new(),
            body: Rc::new(body),
        }
    }

    /// Formal parameter names, receiver excluded
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = param_names(params);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A constructor definition. Constructors may not declare preconditions
/// or postconditions.
#[derive(Clone)]
pub struct ConstructorDef {
    params: Vec<String>,
    doc: String,
    body: ConstructorBody,
}

impl ConstructorDef {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Object, &mut [Value]) -> ContractResult<()> + 'static,
    {
        Self {
            params: Vec::new(),
            doc: String::new(),
            body: Rc::new(body),
        }
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = param_names(params);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }
}

/// A method wrapped for one class
pub(crate) struct BoundMethod {
    /// Class that declared the method
    owner: String,
    def: MethodDef,
    contract: ContractedCallable,
}

impl BoundMethod {
    pub(crate) fn invoke(&self, this: &Object, args: &mut [Value]) -> ContractResult<Value> {
        let body = &self.def.body;
        self.contract.invoke(Some(this), args, |args| body(this, args))
    }
}

#[derive(Clone)]
struct ResolvedConstructor {
    /// `Owner.__init__`
    name: String,
    def: ConstructorDef,
}

struct ClassInner {
    name: String,
    doc: String,
    base: Option<Class>,
    config: ContractConfig,
    hard_invariants: Rc<[Predicate]>,
    soft_invariants: Vec<Predicate>,
    methods: FxHashMap<String, BoundMethod>,
    constructor: Option<ResolvedConstructor>,
}

#[derive(Clone)]
pub struct Class(Rc<ClassInner>);

impl Class {
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn doc(&self) -> &str {
        &self.0.doc
    }

    pub fn base(&self) -> Option<&Class> {
        self.0.base.as_ref()
    }

    pub fn config(&self) -> &ContractConfig {
        &self.0.config
    }

    /// This class and its ancestors, most-base first
    pub fn ancestry(&self) -> Vec<Class> {
        let mut chain: Vec<Class> =
            iter::successors(Some(self.clone()), |class| class.base().cloned()).collect();
        chain.reverse();
        chain
    }

    pub fn is_subclass_of(&self, other: &Class) -> bool {
        iter::successors(Some(self), |class| class.base()).any(|class| class.ptr_eq(other))
    }

    /// Aggregated hard invariants, base classes first
    pub fn hard_invariants(&self) -> &[Predicate] {
        &self.0.hard_invariants
    }

    /// Aggregated soft invariants, base classes first
    pub fn soft_invariants(&self) -> &[Predicate] {
        &self.0.soft_invariants
    }

    pub(crate) fn shared_hard_invariants(&self) -> Rc<[Predicate]> {
        Rc::clone(&self.0.hard_invariants)
    }

    pub(crate) fn method(&self, name: &str) -> Option<&BoundMethod> {
        self.0.methods.get(name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.0.methods.contains_key(name)
    }

    /// Sorted names of every method visible on the class
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.0.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Contract of a visible method
    pub fn method_contract(&self, name: &str) -> Option<&ContractedCallable> {
        self.method(name).map(|bound| &bound.contract)
    }

    /// Class that declared a visible method
    pub fn method_owner(&self, name: &str) -> Option<&str> {
        self.method(name).map(|bound| bound.owner.as_str())
    }

    /// Create an instance: run the constructor with invariant checks
    /// suspended, then check every hard invariant once
    pub fn instantiate(&self, mut args: Vec<Value>) -> ContractResult<Object> {
        let obj = Object::new(self);
        self.run_constructor(&obj, &mut args)?;
        obj.finish_construction();

        if self.config().enabled {
            guard::check_hard_invariants(&obj)?;
        }
        Ok(obj)
    }

    /// Run this class's constructor on `this`, an instance of this class or
    /// of a subclass (the super-constructor call)
    pub fn init_instance(&self, this: &Object, mut args: Vec<Value>) -> ContractResult<()> {
        if !this.is_instance_of(self) {
            return Err(ContractError::NotAnInstance {
                expected: self.name().to_string(),
                actual: this.class().name().to_string(),
            });
        }
        self.run_constructor(this, &mut args)
    }

    fn run_constructor(&self, this: &Object, args: &mut [Value]) -> ContractResult<()> {
        let Some(constructor) = &self.0.constructor else {
            return if args.is_empty() {
                Ok(())
            } else {
                Err(ContractError::ArityMismatch {
                    name: format!("{}.{}", self.name(), CONSTRUCTOR_NAME),
                    expected: 0,
                    actual: args.len(),
                })
            };
        };

        if args.len() != constructor.def.params.len() {
            return Err(ContractError::ArityMismatch {
                name: constructor.name.clone(),
                expected: constructor.def.params.len(),
                actual: args.len(),
            });
        }
        (constructor.def.body)(this, args)
    }

    pub fn ptr_eq(&self, other: &Class) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.0.name)
            .field("base", &self.base().map(Class::name))
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Registers a class: the decoration step
pub struct ClassBuilder {
    name: String,
    doc: String,
    base: Option<Class>,
    config: Option<ContractConfig>,
    constructor: Option<ConstructorDef>,
    methods: Vec<MethodDef>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: String::new(),
            base: None,
            config: None,
            constructor: None,
            methods: Vec::new(),
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    pub fn extends(mut self, base: &Class) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Configuration for this class; subclasses inherit it unless they set
    /// their own
    pub fn config(mut self, config: ContractConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn constructor(mut self, constructor: ConstructorDef) -> Self {
        self.constructor = Some(constructor);
        self
    }

    pub fn method(mut self, method: MethodDef) -> Self {
        self.methods.push(method);
        self
    }

    pub fn build(self) -> Result<Class, SetupError> {
        let config = self
            .config
            .or_else(|| self.base.as_ref().map(|base| base.config().clone()))
            .unwrap_or_default();
        let depth = config.max_expression_depth;

        let constructor = match self.constructor {
            Some(def) => {
                let name = format!("{}.{}", self.name, CONSTRUCTOR_NAME);
                extract_callable(&name, &def.doc)?;
                Some(ResolvedConstructor { name, def })
            }
            None => self
                .base
                .as_ref()
                .and_then(|base| base.0.constructor.clone()),
        };

        let ancestors = self.base.as_ref().map(Class::ancestry).unwrap_or_default();
        let invariants = extract_class_chain(
            ancestors
                .iter()
                .map(|class| (class.name(), class.doc()))
                .chain(iter::once((self.name.as_str(), self.doc.as_str()))),
        );
        let hard_invariants: Rc<[Predicate]> =
            Predicate::compile_all(&invariants.hard_invariants, depth).into();
        let soft_invariants = Predicate::compile_all(&invariants.soft_invariants, depth);

        let mut definitions: FxHashMap<String, (String, MethodDef)> = FxHashMap::default();
        if let Some(base) = &self.base {
            for (name, bound) in &base.0.methods {
                definitions.insert(name.clone(), (bound.owner.clone(), bound.def.clone()));
            }
        }
        let mut own: Vec<&str> = Vec::new();
        for def in &self.methods {
            if own.contains(&def.name.as_str()) {
                return Err(SetupError::DuplicateMethod {
                    class: self.name.clone(),
                    method: def.name.clone(),
                });
            }
            own.push(&def.name);
            definitions.insert(def.name.clone(), (self.name.clone(), def.clone()));
        }

        let mut methods = FxHashMap::default();
        for (name, (owner, def)) in definitions {
            let contract = ContractedCallable::from_doc(
                &format!("{}.{}", owner, name),
                def.params.clone(),
                &def.doc,
                soft_invariants.clone(),
                config.clone(),
            )?;
            methods.insert(name, BoundMethod { owner, def, contract });
        }

        debug!(
            class = self.name.as_str(),
            base = self.base.as_ref().map(Class::name),
            hard_invariants = hard_invariants.len(),
            soft_invariants = soft_invariants.len(),
            methods = methods.len(),
            "registered class"
        );

        Ok(Class(Rc::new(ClassInner {
            name: self.name,
            doc: self.doc,
            base: self.base,
            config,
            hard_invariants,
            soft_invariants,
            methods,
            constructor,
        })))
    }
}
