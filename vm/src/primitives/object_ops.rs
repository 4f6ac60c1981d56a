use object::special::names;
use object::{FrameRef, Instance, Value};

use super::{frame_args, push_result};
use crate::interpreter::{Interpreter, RuntimeError};

/// `identical`: answer the `true` or `false` singleton for receiver == arg.
pub fn identical(interp: &mut Interpreter, frame: FrameRef) -> Result<(), RuntimeError> {
    let (receiver, args) = frame_args(interp, frame)?;
    let other = args.first().cloned().unwrap_or(Value::Nil);
    let name = if receiver.is_identical(&other) {
        names::TRUE
    } else {
        names::FALSE
    };
    let answer = interp.vm().classes.require(name)?;
    push_result(interp, frame, Value::Class(answer))
}

/// `basicNew`: a fresh instance of the receiver class, all slots `nil`.
pub fn basic_new(interp: &mut Interpreter, frame: FrameRef) -> Result<(), RuntimeError> {
    let (receiver, _) = frame_args(interp, frame)?;
    let Value::Class(class) = receiver else {
        return Err(RuntimeError::TypeError {
            expected: "class receiver",
            got: receiver,
        });
    };
    push_result(interp, frame, Value::Object(Instance::new(&class)))
}
