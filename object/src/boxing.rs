use core::fmt;

use bytecode::Literal;

use crate::special::{names, NUMBER_RAW, STRING_RAW};
use crate::{ClassRegistry, Instance, Value};

/// A global the object model needed was not registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingGlobal {
    pub name: String,
}

impl fmt::Display for MissingGlobal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown global {}", self.name)
    }
}

impl std::error::Error for MissingGlobal {}

/// Turn a literal operand into a value.
///
/// Strings and numbers are wrapped in a fresh `String`/`Number` instance with
/// the raw value at [`STRING_RAW`]/[`NUMBER_RAW`]; every call allocates, so
/// equal literals never share an instance. Booleans are not wrapped: they
/// resolve to the registered `true`/`false` class objects.
pub fn box_literal(literal: &Literal, registry: &ClassRegistry) -> Result<Value, MissingGlobal> {
    match literal {
        Literal::Str(s) => {
            let class = registry.require(names::STRING)?;
            let inst = Instance::new(&class);
            set_raw(&inst, STRING_RAW, Value::Str(s.clone()), names::STRING)?;
            Ok(Value::Object(inst))
        }
        Literal::Number(n) => {
            let class = registry.require(names::NUMBER)?;
            let inst = Instance::new(&class);
            set_raw(&inst, NUMBER_RAW, Value::Number(*n), names::NUMBER)?;
            Ok(Value::Object(inst))
        }
        Literal::Bool(true) => registry.require(names::TRUE).map(Value::Class),
        Literal::Bool(false) => registry.require(names::FALSE).map(Value::Class),
        Literal::Nil => Ok(Value::Nil),
    }
}

// A class without the raw slot is reported as missing.
fn set_raw(
    inst: &Instance,
    index: usize,
    raw: Value,
    class_name: &str,
) -> Result<(), MissingGlobal> {
    inst.set_slot(index, raw).map_err(|_| MissingGlobal {
        name: class_name.to_string(),
    })
}

/// Raw string of a boxed `String`, if `value` is one.
pub fn unbox_str(value: &Value) -> Option<std::sync::Arc<str>> {
    match value.as_object()?.slot(STRING_RAW)? {
        Value::Str(s) => Some(s),
        _ => None,
    }
}

/// Raw number of a boxed `Number`, if `value` is one.
pub fn unbox_number(value: &Value) -> Option<f64> {
    value.as_object()?.slot(NUMBER_RAW)?.as_number()
}
