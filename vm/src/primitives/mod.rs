use std::collections::HashMap;

use object::{FrameRef, Value};

use crate::interpreter::{Interpreter, RuntimeError};

pub mod block;
pub mod method;
pub mod object_ops;

/// A native builtin. It runs with the frame that executed the `primitive`
/// instruction, reads its receiver and arguments from that frame's locals
/// and leaves any result on that frame's evaluation stack.
pub type BuiltinFn = fn(&mut Interpreter, FrameRef) -> Result<(), RuntimeError>;

#[derive(Clone, Copy)]
pub struct BuiltinDesc {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl BuiltinDesc {
    pub const fn new(name: &'static str, func: BuiltinFn) -> Self {
        Self { name, func }
    }
}

impl core::fmt::Debug for BuiltinDesc {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BuiltinDesc").field("name", &self.name).finish()
    }
}

/// Name → builtin mapping consulted by `primitive builtin: <name>`.
#[derive(Debug, Default, Clone)]
pub struct BuiltinTable {
    entries: HashMap<&'static str, BuiltinDesc>,
}

impl BuiltinTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        for desc in default_builtins() {
            table.register(desc);
        }
        table
    }

    /// Register `desc`, replacing any builtin of the same name.
    pub fn register(&mut self, desc: BuiltinDesc) -> Option<BuiltinDesc> {
        self.entries.insert(desc.name, desc)
    }

    pub fn get(&self, name: &str) -> Option<&BuiltinDesc> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn default_builtins() -> Vec<BuiltinDesc> {
    vec![
        BuiltinDesc::new("blockValue", block::block_value),
        BuiltinDesc::new("addMethod", method::add_method),
        BuiltinDesc::new("identical", object_ops::identical),
        BuiltinDesc::new("basicNew", object_ops::basic_new),
    ]
}

/// Receiver and arguments of the builtin's frame.
pub(crate) fn frame_args(
    interp: &Interpreter,
    frame: FrameRef,
) -> Result<(Value, Vec<Value>), RuntimeError> {
    let f = interp.frame(frame).ok_or(RuntimeError::TypeError {
        expected: "live frame",
        got: Value::Frame(frame),
    })?;
    let receiver = f.receiver();
    let args = f.locals.iter().skip(1).cloned().collect();
    Ok((receiver, args))
}

pub(crate) fn push_result(
    interp: &mut Interpreter,
    frame: FrameRef,
    value: Value,
) -> Result<(), RuntimeError> {
    interp
        .frame_mut(frame)
        .ok_or(RuntimeError::TypeError {
            expected: "live frame",
            got: Value::Frame(frame),
        })?
        .push(value);
    Ok(())
}
