use crate::class::SuperclassChain;
use crate::special::names;
use crate::{ClassRef, ClassRegistry, ObjectRef, Value};

/// The result of a method lookup.
#[derive(Debug, Clone)]
pub enum LookupResult {
    /// No class on the chain defines the selector.
    None,
    /// The selector was found.
    Found {
        /// Class whose method dictionary held the match (may be an ancestor
        /// of the starting class).
        holder: ClassRef,
        method: ObjectRef,
        /// Superclass links followed from the starting class.
        depth: usize,
    },
}

impl LookupResult {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

/// Look up `selector` starting at `start`.
///
/// Walks the superclass chain linearly, most specific class first; the first
/// class whose method dictionary contains the selector wins. There is no
/// per-call-site caching: every send repeats the walk.
pub fn lookup(start: &ClassRef, selector: &str) -> LookupResult {
    for (depth, class) in SuperclassChain::new(start).enumerate() {
        if let Some(method) = class.method(selector) {
            return LookupResult::Found {
                holder: class,
                method,
                depth,
            };
        }
    }
    LookupResult::None
}

/// The class a send to `receiver` starts its lookup from.
///
/// Instances answer their class. A class object answers its metaclass, or
/// the registry's `Class` when it has none. `nil` answers
/// `UndefinedObject`. Raw slot payloads have no class.
pub fn class_of(receiver: &Value, registry: &ClassRegistry) -> Option<ClassRef> {
    match receiver {
        Value::Object(obj) => Some(obj.class().clone()),
        Value::Class(class) => class
            .metaclass()
            .cloned()
            .or_else(|| registry.get(names::CLASS)),
        Value::Nil => registry.get(names::UNDEFINED_OBJECT),
        _ => None,
    }
}
