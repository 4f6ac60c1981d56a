use object::{FrameRef, Value};

use super::frame_args;
use crate::interpreter::{Interpreter, RuntimeError};

/// `blockValue`: invoke the receiver closure with the frame's remaining
/// locals as arguments.
///
/// The block frame is pushed on top of the calling frame, so whatever the
/// block answers lands on that frame's stack.
pub fn block_value(interp: &mut Interpreter, frame: FrameRef) -> Result<(), RuntimeError> {
    let (receiver, args) = frame_args(interp, frame)?;
    let Value::Object(closure) = receiver else {
        return Err(RuntimeError::TypeError {
            expected: "block closure",
            got: receiver,
        });
    };
    interp.invoke_closure(&closure, args)?;
    Ok(())
}
