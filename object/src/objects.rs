use core::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{ClassRef, Value};

pub type ObjectRef = Arc<Instance>;

/// A slot index outside an instance's slot vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotOutOfRange {
    pub index: usize,
    pub len: usize,
}

impl fmt::Display for SlotOutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {} out of range for {} slots", self.index, self.len)
    }
}

impl std::error::Error for SlotOutOfRange {}

/// An instance of a class.
///
/// The slot vector is allocated once with exactly
/// [`Class::inst_var_count`](crate::Class::inst_var_count) entries and never
/// resized; only the values in it change.
pub struct Instance {
    class: ClassRef,
    slots: Mutex<Vec<Value>>,
}

impl Instance {
    /// Allocate an instance of `class` with every slot set to `nil`.
    pub fn new(class: &ClassRef) -> ObjectRef {
        Arc::new(Self {
            class: class.clone(),
            slots: Mutex::new(vec![Value::Nil; class.inst_var_count()]),
        })
    }

    #[inline]
    pub fn class(&self) -> &ClassRef {
        &self.class
    }

    #[inline]
    pub fn slot_count(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn slot(&self, index: usize) -> Option<Value> {
        self.slots.lock().get(index).cloned()
    }

    pub fn set_slot(&self, index: usize, value: Value) -> Result<(), SlotOutOfRange> {
        let mut slots = self.slots.lock();
        let len = slots.len();
        match slots.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(SlotOutOfRange { index, len }),
        }
    }

    /// Run `f` over all slots while holding the slot lock once.
    pub fn with_slots<R>(&self, f: impl FnOnce(&[Value]) -> R) -> R {
        f(&self.slots.lock())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("class", &self.class.name())
            .field("slots", &self.slot_count())
            .finish()
    }
}
