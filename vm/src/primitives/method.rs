use object::{FrameRef, MethodInfo, Value};

use super::frame_args;
use crate::interpreter::{Interpreter, RuntimeError};

/// `addMethod`: install the CompiledMethod argument in the receiver class
/// under the method's own selector. A previous definition is replaced.
pub fn add_method(interp: &mut Interpreter, frame: FrameRef) -> Result<(), RuntimeError> {
    let (receiver, args) = frame_args(interp, frame)?;
    let Value::Class(class) = receiver else {
        return Err(RuntimeError::TypeError {
            expected: "class receiver",
            got: receiver,
        });
    };
    let method = match args.first() {
        Some(Value::Object(method)) => method.clone(),
        other => {
            return Err(RuntimeError::TypeError {
                expected: "compiled method",
                got: other.cloned().unwrap_or(Value::Nil),
            });
        }
    };
    let info = MethodInfo::read(&method).ok_or_else(|| RuntimeError::TypeError {
        expected: "compiled method",
        got: Value::Object(method.clone()),
    })?;
    if class.define_method(&info.selector, method).is_some() {
        log::debug!("{}>>#{} redefined", class.name(), info.selector);
    } else {
        log::debug!("{}>>#{} defined", class.name(), info.selector);
    }
    Ok(())
}
