//! Contract-bearing objects
//!
//! An [`Object`] is a shared handle to an instance of a [`Class`]. Every
//! attribute write goes through [`Object::set`], which re-checks the
//! aggregated hard invariants once the instance is live.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::class::Class;
use crate::contract::Predicate;
use crate::errors::{ContractError, ContractResult};
use crate::guard;
use crate::value::Value;

/// Per-instance contract state
#[derive(Debug)]
pub struct InstanceContractState {
    hard_invariants: Rc<[Predicate]>,
    constructing: Cell<bool>,
    /// Hard invariants are being evaluated
    checking: Cell<bool>,
    /// Soft invariants are being evaluated at a method boundary
    checking_soft: Cell<bool>,
}

impl InstanceContractState {
    fn new(hard_invariants: Rc<[Predicate]>, constructing: bool) -> Self {
        Self {
            hard_invariants,
            constructing: Cell::new(constructing),
            checking: Cell::new(false),
            checking_soft: Cell::new(false),
        }
    }

    pub fn hard_invariants(&self) -> &[Predicate] {
        &self.hard_invariants
    }

    pub fn is_constructing(&self) -> bool {
        self.constructing.get()
    }
}

struct ObjectInner {
    class: Class,
    fields: RefCell<FxHashMap<String, Value>>,
    state: InstanceContractState,
}

#[derive(Clone)]
pub struct Object(Rc<ObjectInner>);

/// Marks an object as being checked until dropped
pub(crate) struct CheckGuard<'a> {
    flag: &'a Cell<bool>,
    previous: bool,
}

impl<'a> CheckGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        let previous = flag.replace(true);
        Self { flag, previous }
    }
}

impl Drop for CheckGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(self.previous);
    }
}

impl Object {
    /// A fresh instance in the constructing state
    pub(crate) fn new(class: &Class) -> Self {
        Self::with_fields(class, FxHashMap::default(), true)
    }

    fn with_fields(class: &Class, fields: FxHashMap<String, Value>, constructing: bool) -> Self {
        Object(Rc::new(ObjectInner {
            class: class.clone(),
            fields: RefCell::new(fields),
            state: InstanceContractState::new(class.shared_hard_invariants(), constructing),
        }))
    }

    pub fn class(&self) -> &Class {
        &self.0.class
    }

    pub fn state(&self) -> &InstanceContractState {
        &self.0.state
    }

    /// Field value, if set
    pub fn get(&self, name: &str) -> Option<Value> {
        self.0.fields.borrow().get(name).cloned()
    }

    /// Field value, or `MissingAttribute` if it has not been set
    pub fn attr(&self, name: &str) -> ContractResult<Value> {
        self.get(name).ok_or_else(|| ContractError::MissingAttribute {
            class: self.class().name().to_string(),
            attribute: name.to_string(),
        })
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.0.fields.borrow().contains_key(name)
    }

    /// Write a field, then re-check hard invariants.
    ///
    /// The write is kept even when the check fails.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> ContractResult<()> {
        self.0
            .fields
            .borrow_mut()
            .insert(name.to_string(), value.into());
        guard::after_write(self, name)
    }

    /// Call a method through its contract
    pub fn call(&self, method: &str, mut args: Vec<Value>) -> ContractResult<Value> {
        self.call_with(method, &mut args)
    }

    /// Call a method with arguments the caller keeps
    pub fn call_with(&self, method: &str, args: &mut [Value]) -> ContractResult<Value> {
        let class = self.class();
        let bound = class
            .method(method)
            .ok_or_else(|| ContractError::UnknownMethod {
                class: class.name().to_string(),
                method: method.to_string(),
            })?;
        bound.invoke(self, args)
    }

    /// Texts of the aggregated hard invariants, base classes first
    pub fn invariants(&self) -> Vec<String> {
        self.0
            .state
            .hard_invariants()
            .iter()
            .map(|predicate| predicate.text().to_string())
            .collect()
    }

    pub fn is_constructing(&self) -> bool {
        self.0.state.is_constructing()
    }

    pub(crate) fn finish_construction(&self) {
        self.0.state.constructing.set(false);
    }

    pub(crate) fn hard_invariants(&self) -> Rc<[Predicate]> {
        Rc::clone(&self.0.state.hard_invariants)
    }

    pub(crate) fn is_checking(&self) -> bool {
        self.0.state.checking.get()
    }

    pub(crate) fn begin_check(&self) -> CheckGuard<'_> {
        CheckGuard::enter(&self.0.state.checking)
    }

    pub(crate) fn is_checking_soft(&self) -> bool {
        self.0.state.checking_soft.get()
    }

    pub(crate) fn begin_soft_check(&self) -> CheckGuard<'_> {
        CheckGuard::enter(&self.0.state.checking_soft)
    }

    /// Detached copy of the current fields, used for `__old__`. Nested
    /// objects are shared, not copied.
    pub fn snapshot(&self) -> Object {
        let fields = self.0.fields.borrow().clone();
        Self::with_fields(self.class(), fields, false)
    }

    /// Sorted names of the fields currently set
    pub fn field_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.fields.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_instance_of(&self, class: &Class) -> bool {
        self.class().is_subclass_of(class)
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.0.fields.borrow();
        let mut names: Vec<&String> = fields.keys().collect();
        names.sort();

        write!(f, "{} ", self.class().name())?;
        f.debug_map()
            .entries(names.into_iter().map(|name| (name, &fields[name])))
            .finish()
    }
}
