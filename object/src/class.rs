use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::ObjectRef;

pub type ClassRef = Arc<Class>;

/// A class: a name, a method dictionary, an optional superclass and the
/// number of instance variables its instances carry.
///
/// The superclass is fixed at construction and can only point at an already
/// existing class, so superclass chains are acyclic by construction.
pub struct Class {
    name: Arc<str>,
    superclass: Option<ClassRef>,
    inst_var_count: usize,
    /// Class used for lookup when this class object itself receives a
    /// message.
    metaclass: Option<ClassRef>,
    methods: RwLock<HashMap<Arc<str>, ObjectRef>>,
}

impl Class {
    pub fn new(name: &str, superclass: Option<ClassRef>, inst_var_count: usize) -> ClassRef {
        Arc::new(Self {
            name: Arc::from(name),
            superclass,
            inst_var_count,
            metaclass: None,
            methods: RwLock::new(HashMap::new()),
        })
    }

    pub fn with_metaclass(
        name: &str,
        superclass: Option<ClassRef>,
        inst_var_count: usize,
        metaclass: ClassRef,
    ) -> ClassRef {
        Arc::new(Self {
            name: Arc::from(name),
            superclass,
            inst_var_count,
            metaclass: Some(metaclass),
            methods: RwLock::new(HashMap::new()),
        })
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn superclass(&self) -> Option<&ClassRef> {
        self.superclass.as_ref()
    }

    #[inline]
    pub fn inst_var_count(&self) -> usize {
        self.inst_var_count
    }

    #[inline]
    pub fn metaclass(&self) -> Option<&ClassRef> {
        self.metaclass.as_ref()
    }

    /// Install `method` under `selector`, returning the method it replaced.
    pub fn define_method(&self, selector: &str, method: ObjectRef) -> Option<ObjectRef> {
        self.methods.write().insert(Arc::from(selector), method)
    }

    /// Method defined directly on this class (superclasses are not searched).
    pub fn method(&self, selector: &str) -> Option<ObjectRef> {
        self.methods.read().get(selector).cloned()
    }

    pub fn defines(&self, selector: &str) -> bool {
        self.methods.read().contains_key(selector)
    }

    pub fn selectors(&self) -> Vec<Arc<str>> {
        let mut selectors: Vec<_> = self.methods.read().keys().cloned().collect();
        selectors.sort();
        selectors
    }

    /// Whether `other` is this class or one of its ancestors.
    pub fn inherits_from(self: &ClassRef, other: &ClassRef) -> bool {
        SuperclassChain::new(self).any(|class| Arc::ptr_eq(&class, other))
    }
}

impl core::fmt::Debug for Class {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("superclass", &self.superclass.as_ref().map(|s| s.name()))
            .field("inst_var_count", &self.inst_var_count)
            .field("selectors", &self.selectors())
            .finish()
    }
}

/// Iterator over a class and its ancestors, most specific first.
pub struct SuperclassChain {
    next: Option<ClassRef>,
}

impl SuperclassChain {
    pub fn new(start: &ClassRef) -> Self {
        Self {
            next: Some(start.clone()),
        }
    }
}

impl Iterator for SuperclassChain {
    type Item = ClassRef;

    fn next(&mut self) -> Option<ClassRef> {
        let current = self.next.take()?;
        self.next = current.superclass().cloned();
        Some(current)
    }
}
