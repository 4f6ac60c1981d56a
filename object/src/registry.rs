use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::{ClassRef, MissingGlobal};

/// Name → class mapping consulted by `pushGlobal`, literal boxing and the
/// construction of closures and compiled methods.
///
/// Populated before execution starts; the interpreter only reads it.
#[derive(Default)]
pub struct ClassRegistry {
    classes: RwLock<HashMap<Arc<str>, ClassRef>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `class` under its own name. Returns the class it replaced.
    pub fn install(&self, class: ClassRef) -> Option<ClassRef> {
        let name: Arc<str> = Arc::from(class.name());
        self.classes.write().insert(name, class)
    }

    pub fn get(&self, name: &str) -> Option<ClassRef> {
        self.classes.read().get(name).cloned()
    }

    /// Like [`get`](Self::get) but reports the missing name.
    pub fn require(&self, name: &str) -> Result<ClassRef, MissingGlobal> {
        self.get(name).ok_or_else(|| MissingGlobal {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }

    pub fn names(&self) -> Vec<Arc<str>> {
        let mut names: Vec<_> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl core::fmt::Debug for ClassRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClassRegistry")
            .field("classes", &self.names())
            .finish()
    }
}
