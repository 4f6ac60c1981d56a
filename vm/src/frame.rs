use bytecode::{Bytecode, Instruction};
use object::{FrameRef, ThreadId, Value};

use crate::interpreter::RuntimeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Method,
    Block,
}

/// One in-progress method or block execution.
#[derive(Debug)]
pub struct Frame {
    pub kind: FrameKind,
    pub code: Bytecode,
    pub pc: usize,
    /// Slot 0 holds the receiver in method frames.
    pub locals: Vec<Value>,
    pub stack: Vec<Value>,
    /// Sender; `None` for the entry frame of a run.
    pub parent: Option<FrameRef>,
    pub thread: ThreadId,
    /// Defining method frame, targeted by `answerBlock`. Block frames only.
    pub home: Option<FrameRef>,
}

impl Frame {
    pub fn method(
        code: Bytecode,
        locals: Vec<Value>,
        parent: Option<FrameRef>,
        thread: ThreadId,
    ) -> Self {
        Self {
            kind: FrameKind::Method,
            code,
            pc: 0,
            locals,
            stack: Vec::new(),
            parent,
            thread,
            home: None,
        }
    }

    pub fn block(
        code: Bytecode,
        locals: Vec<Value>,
        parent: Option<FrameRef>,
        thread: ThreadId,
        home: FrameRef,
    ) -> Self {
        Self {
            kind: FrameKind::Block,
            code,
            pc: 0,
            locals,
            stack: Vec::new(),
            parent,
            thread,
            home: Some(home),
        }
    }

    #[inline]
    pub fn is_block(&self) -> bool {
        self.kind == FrameKind::Block
    }

    /// Instruction at the program counter, `None` once the body is exhausted.
    #[inline]
    pub fn current_instruction(&self) -> Option<&Instruction> {
        self.code.get(self.pc)
    }

    #[inline]
    pub fn receiver(&self) -> Value {
        self.locals.first().cloned().unwrap_or(Value::Nil)
    }

    pub fn local(&self, index: usize) -> Result<Value, RuntimeError> {
        self.locals
            .get(index)
            .cloned()
            .ok_or(RuntimeError::TypeError {
                expected: "local index",
                got: Value::Int(index as i64),
            })
    }

    pub fn set_local(&mut self, index: usize, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.locals.get_mut(index) {
            *slot = value;
            Ok(())
        } else {
            Err(RuntimeError::TypeError {
                expected: "local index",
                got: Value::Int(index as i64),
            })
        }
    }

    #[inline]
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    pub fn top(&self) -> Result<&Value, RuntimeError> {
        self.stack.last().ok_or(RuntimeError::StackUnderflow)
    }
}

struct Entry {
    generation: u32,
    frame: Option<Frame>,
}

/// Storage for the frames of one call thread, addressed by [`FrameRef`].
///
/// Released slots are reused; each release bumps the slot's generation so
/// handles to the released frame no longer resolve.
pub struct FrameArena {
    thread: ThreadId,
    entries: Vec<Entry>,
    free: Vec<u32>,
    live: usize,
}

impl FrameArena {
    pub fn new(thread: ThreadId) -> Self {
        Self {
            thread,
            entries: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    pub fn alloc(&mut self, frame: Frame) -> FrameRef {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index as usize];
            debug_assert!(entry.frame.is_none());
            entry.frame = Some(frame);
            return FrameRef::new(self.thread, index, entry.generation);
        }
        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            generation: 0,
            frame: Some(frame),
        });
        FrameRef::new(self.thread, index, 0)
    }

    fn entry(&self, frame: FrameRef) -> Option<&Entry> {
        if frame.thread != self.thread {
            return None;
        }
        self.entries
            .get(frame.index as usize)
            .filter(|entry| entry.generation == frame.generation)
    }

    pub fn get(&self, frame: FrameRef) -> Option<&Frame> {
        self.entry(frame)?.frame.as_ref()
    }

    pub fn get_mut(&mut self, frame: FrameRef) -> Option<&mut Frame> {
        if frame.thread != self.thread {
            return None;
        }
        self.entries
            .get_mut(frame.index as usize)
            .filter(|entry| entry.generation == frame.generation)?
            .frame
            .as_mut()
    }

    #[inline]
    pub fn is_live(&self, frame: FrameRef) -> bool {
        self.get(frame).is_some()
    }

    /// Remove the frame, invalidating every handle to it.
    pub fn release(&mut self, frame: FrameRef) -> Option<Frame> {
        if frame.thread != self.thread {
            return None;
        }
        let entry = self.entries.get_mut(frame.index as usize)?;
        if entry.generation != frame.generation {
            return None;
        }
        let released = entry.frame.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(frame.index);
        self.live -= 1;
        Some(released)
    }

    /// Number of live frames.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Slots ever allocated, live or free.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }
}
