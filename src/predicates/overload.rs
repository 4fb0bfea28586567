use crate::config::PredicateConfig;
use crate::snapshot::ObjectSnapshot;

/// Strategy deciding whether a receptacle holds more than it should.
///
/// Any `Fn(&ObjectSnapshot, &PredicateConfig) -> bool` closure is also a policy.
pub trait OverloadPolicy {
    fn is_overloaded(&self, object: &ObjectSnapshot, config: &PredicateConfig) -> bool;
}

impl<F> OverloadPolicy for F
where
    F: Fn(&ObjectSnapshot, &PredicateConfig) -> bool,
{
    fn is_overloaded(&self, object: &ObjectSnapshot, config: &PredicateConfig) -> bool {
        self(object, config)
    }
}

/// Compares the number of contained objects against the capacity table.
///
/// An object counts as a receptacle when it has the receptacle capability or when its type has an
/// entry in the capacity table. It is overloaded when it holds strictly more objects than the
/// capacity of its type.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentCount;

impl OverloadPolicy for ContentCount {
    fn is_overloaded(&self, object: &ObjectSnapshot, config: &PredicateConfig) -> bool {
        let is_receptacle = object.capabilities.receptacle
            || config.receptacle_capacity.contains_key(&object.object_type);

        is_receptacle && object.contents.len() > config.capacity(&object.object_type)
    }
}
