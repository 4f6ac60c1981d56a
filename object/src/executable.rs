use std::sync::Arc;

use bytecode::Bytecode;

use crate::special::{
    CLOSURE_ARGC, CLOSURE_ARGV, CLOSURE_BYTECODE, CLOSURE_HOME, CLOSURE_METHOD_RECORD,
    METHOD_ARGC, METHOD_BYTECODE, METHOD_LOCALS, METHOD_SELECTOR,
};
use crate::{ClassRef, FrameRef, Instance, ObjectRef, SlotOutOfRange, Value};

/// Decoded fields of a `CompiledMethod` instance.
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub code: Bytecode,
    pub selector: Arc<str>,
    /// Arguments, receiver excluded.
    pub argc: usize,
    /// Receiver + arguments + temporaries.
    pub locals: usize,
}

impl MethodInfo {
    /// Read the well-known method slots. `None` if the instance does not
    /// carry a well-formed method payload.
    pub fn read(method: &Instance) -> Option<Self> {
        method.with_slots(|slots| {
            let code = slots.get(METHOD_BYTECODE)?.as_code()?.clone();
            let locals = slots.get(METHOD_LOCALS)?.as_int()?;
            let argc = slots.get(METHOD_ARGC)?.as_int()?;
            let selector = match slots.get(METHOD_SELECTOR)? {
                Value::Symbol(s) | Value::Str(s) => s.clone(),
                _ => return None,
            };
            Some(Self {
                code,
                selector,
                argc: usize::try_from(argc).ok()?,
                locals: usize::try_from(locals).ok()?,
            })
        })
    }
}

/// Build a `CompiledMethod` instance of `class`.
///
/// The locals count is `1 + argc + temps`: one slot for the receiver, then
/// the arguments, then the temporaries.
pub fn new_compiled_method(
    class: &ClassRef,
    code: Bytecode,
    selector: &str,
    argc: usize,
    temps: usize,
) -> Result<ObjectRef, SlotOutOfRange> {
    let method = Instance::new(class);
    method.set_slot(METHOD_BYTECODE, Value::Code(code))?;
    method.set_slot(METHOD_LOCALS, Value::Int((1 + argc + temps) as i64))?;
    method.set_slot(METHOD_ARGC, Value::Int(argc as i64))?;
    method.set_slot(METHOD_SELECTOR, Value::Symbol(Arc::from(selector)))?;
    Ok(method)
}

/// Decoded fields of a `BlockClosure` instance.
#[derive(Debug, Clone)]
pub struct ClosureInfo {
    pub code: Bytecode,
    pub argc: usize,
    pub arg_start: usize,
    /// Frame that was executing when the closure was created.
    pub creator: FrameRef,
    /// Method frame a non-local return from the block unwinds to.
    pub home: FrameRef,
}

impl ClosureInfo {
    pub fn read(closure: &Instance) -> Option<Self> {
        closure.with_slots(|slots| {
            let code = slots.get(CLOSURE_BYTECODE)?.as_code()?.clone();
            let argc = slots.get(CLOSURE_ARGC)?.as_int()?;
            let arg_start = slots.get(CLOSURE_ARGV)?.as_int()?;
            let creator = slots.get(CLOSURE_METHOD_RECORD)?.as_frame()?;
            let home = slots.get(CLOSURE_HOME)?.as_frame()?;
            Some(Self {
                code,
                argc: usize::try_from(argc).ok()?,
                arg_start: usize::try_from(arg_start).ok()?,
                creator,
                home,
            })
        })
    }
}

/// Build a `BlockClosure` instance of `class` capturing `code`, a
/// back-reference to the `creator` frame and the `home` method frame.
pub fn new_block_closure(
    class: &ClassRef,
    code: Bytecode,
    argc: usize,
    arg_start: usize,
    creator: FrameRef,
    home: FrameRef,
) -> Result<ObjectRef, SlotOutOfRange> {
    let closure = Instance::new(class);
    closure.set_slot(CLOSURE_BYTECODE, Value::Code(code))?;
    closure.set_slot(CLOSURE_ARGC, Value::Int(argc as i64))?;
    closure.set_slot(CLOSURE_ARGV, Value::Int(arg_start as i64))?;
    closure.set_slot(CLOSURE_METHOD_RECORD, Value::Frame(creator))?;
    closure.set_slot(CLOSURE_HOME, Value::Frame(home))?;
    Ok(closure)
}
