//! Invariant guard: hard invariants re-checked after every attribute write

use tracing::{debug, trace};

use crate::config::MissingAttributePolicy;
use crate::environment::Environment;
use crate::errors::{ContractError, ContractResult};
use crate::evaluator::Evaluator;
use crate::object::Object;

/// Called after `name` has been written on `obj`.
///
/// Every attribute name is checked; the engine's own bookkeeping lives in
/// [`InstanceContractState`](crate::object::InstanceContractState), not in
/// the object's fields.
pub(crate) fn after_write(obj: &Object, name: &str) -> ContractResult<()> {
    if !obj.class().config().enabled {
        return Ok(());
    }
    if obj.is_constructing() {
        trace!(class = obj.class().name(), attribute = name, "write during construction, not checked");
        return Ok(());
    }
    if obj.is_checking() {
        trace!(class = obj.class().name(), attribute = name, "write inside an invariant check, not checked");
        return Ok(());
    }
    check_hard_invariants(obj)
}

/// Evaluate every aggregated hard invariant of `obj`, in order.
///
/// Under [`MissingAttributePolicy::Tolerate`] an invariant that reads an
/// attribute the object does not have yet counts as holding.
pub fn check_hard_invariants(obj: &Object) -> ContractResult<()> {
    let _checking = obj.begin_check();
    let class = obj.class();
    let policy = class.config().missing_attributes;
    let env = Environment::for_receiver(obj);
    let evaluator = Evaluator::new(&env);
    let invariants = obj.hard_invariants();

    for invariant in invariants.iter() {
        match evaluator.evaluate_predicate(invariant) {
            Ok(true) => {}
            Ok(false) => {
                debug!(
                    predicate = invariant.text(),
                    scope = invariant.scope(),
                    class = class.name(),
                    "hard invariant violated"
                );
                return Err(invariant.violation().into());
            }
            Err(ContractError::MissingAttribute { attribute, .. })
                if policy == MissingAttributePolicy::Tolerate =>
            {
                debug!(
                    predicate = invariant.text(),
                    attribute = attribute.as_str(),
                    "attribute not set yet, invariant presumed to hold"
                );
            }
            Err(e) => return Err(e),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::{Class, ConstructorDef};
    use crate::value::Value;

    #[test]
    fn test_dunder_attributes_are_checked() {
        let class = Class::builder("Tally")
            .doc("hinv: self.__count__ >= 0")
            .constructor(ConstructorDef::new(|this, _| this.set("__count__", 0)))
            .build()
            .unwrap();
        let obj = class.instantiate(vec![]).unwrap();

        let err = obj.set("__count__", -5).unwrap_err();
        assert_eq!(err.violation().unwrap().predicate, "self.__count__ >= 0");
        assert_eq!(obj.get("__count__"), Some(Value::Integer(-5)));
    }

    #[test]
    fn test_writes_during_construction_are_not_checked() {
        let class = Class::builder("Tally")
            .doc("hinv: self.n > 0")
            .constructor(ConstructorDef::new(|this, _| {
                assert!(after_write(this, "n").is_ok());
                this.set("n", 1)
            }))
            .build()
            .unwrap();
        assert!(class.instantiate(vec![]).is_ok());
    }
}
