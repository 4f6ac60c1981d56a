use std::fmt;
use std::sync::Arc;

use bytecode::{Bytecode, Instruction, Literal};
use object::special::names;
use object::{
    box_literal, class_of, lookup, new_block_closure, new_compiled_method, ClosureInfo,
    FrameRef, LookupResult, MethodInfo, MissingGlobal, ObjectRef, Value,
};

use crate::frame::{Frame, FrameArena, FrameKind};
use crate::threading::CallThread;
use crate::VM;

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    UnknownGlobal {
        name: String,
    },
    DoesNotUnderstand {
        class: String,
        selector: String,
    },
    /// Counts exclude the receiver.
    ArgumentCountMismatch {
        class: String,
        selector: String,
        expected: usize,
        actual: usize,
    },
    UnknownBuiltin {
        name: String,
    },
    UnknownPrimitiveKeyword {
        keyword: String,
    },
    StackOverflow,
    StackUnderflow,
    NonLocalReturnExpired,
    NoActiveFrame,
    TypeError {
        expected: &'static str,
        got: Value,
    },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownGlobal { name } => write!(f, "unknown global {name}"),
            Self::DoesNotUnderstand { class, selector } => {
                write!(f, "{class} does not understand #{selector}")
            }
            Self::ArgumentCountMismatch {
                class,
                selector,
                expected,
                actual,
            } => write!(
                f,
                "{class}>>#{selector} expects {expected} argument(s), got {actual}"
            ),
            Self::UnknownBuiltin { name } => write!(f, "unknown builtin {name}"),
            Self::UnknownPrimitiveKeyword { keyword } => {
                write!(f, "unknown primitive keyword {keyword}")
            }
            Self::StackOverflow => write!(f, "call stack overflow"),
            Self::StackUnderflow => write!(f, "evaluation stack underflow"),
            Self::NonLocalReturnExpired => {
                write!(f, "non-local return to a method that already returned")
            }
            Self::NoActiveFrame => write!(f, "no active frame"),
            Self::TypeError { expected, got } => {
                write!(f, "expected {expected}, got {got:?}")
            }
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<MissingGlobal> for RuntimeError {
    fn from(err: MissingGlobal) -> Self {
        Self::UnknownGlobal { name: err.name }
    }
}

/// What the dispatch loop does after an instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    /// Keep dispatching on whatever frame is now on top.
    Continue,
    /// The entry frame answered this value; the run is over.
    Finished(Value),
}

/// Executes bytecode on one call thread.
///
/// The interpreter owns the thread and the arena its frames live in; the
/// class registry, builtin table and settings come from the shared [`VM`].
pub struct Interpreter {
    vm: Arc<VM>,
    thread: CallThread,
    frames: FrameArena,
}

impl Interpreter {
    pub fn new(vm: Arc<VM>) -> Self {
        let thread = CallThread::new(vm.settings.max_frames);
        let frames = FrameArena::new(thread.id());
        Self { vm, thread, frames }
    }

    #[inline]
    pub fn vm(&self) -> &Arc<VM> {
        &self.vm
    }

    #[inline]
    pub fn thread(&self) -> &CallThread {
        &self.thread
    }

    #[inline]
    pub fn current_frame(&self) -> Option<FrameRef> {
        self.thread.top()
    }

    pub fn frame(&self, frame: FrameRef) -> Option<&Frame> {
        self.frames.get(frame)
    }

    pub fn frame_mut(&mut self, frame: FrameRef) -> Option<&mut Frame> {
        self.frames.get_mut(frame)
    }

    /// Live frames in the arena.
    pub fn live_frames(&self) -> usize {
        self.frames.len()
    }

    fn expect_frame(&self, frame: FrameRef) -> Result<&Frame, RuntimeError> {
        self.frames.get(frame).ok_or(RuntimeError::TypeError {
            expected: "live frame",
            got: Value::Frame(frame),
        })
    }

    fn expect_frame_mut(&mut self, frame: FrameRef) -> Result<&mut Frame, RuntimeError> {
        self.frames.get_mut(frame).ok_or(RuntimeError::TypeError {
            expected: "live frame",
            got: Value::Frame(frame),
        })
    }

    /// Drop every frame, e.g. after a failed run.
    pub fn reset(&mut self) {
        for frame in self.thread.clear() {
            self.frames.release(frame);
        }
    }

    // ── Entry points ───────────────────────────────────────────────

    /// Run `code` as a method body with `receiver` as self and return what
    /// it answers.
    ///
    /// On error the frames are left as they were at the failing instruction
    /// so the host can inspect them; call [`reset`](Self::reset) before
    /// reusing the thread.
    pub fn run(&mut self, code: Bytecode, receiver: Value) -> Result<Value, RuntimeError> {
        self.enter(code, receiver)?;
        self.run_loop()
    }

    /// Push an entry frame for `code` without running it; drive it with
    /// [`step`](Self::step).
    pub fn enter(&mut self, code: Bytecode, receiver: Value) -> Result<FrameRef, RuntimeError> {
        let thread = self.thread.id();
        self.push_frame(Frame::method(code, vec![receiver], None, thread))
    }

    /// Send `selector` to `receiver` from the host and run until the method
    /// answers.
    pub fn send_message(
        &mut self,
        receiver: Value,
        selector: &str,
        args: &[Value],
    ) -> Result<Value, RuntimeError> {
        let values = u16::try_from(args.len() + 1).map_err(|_| RuntimeError::TypeError {
            expected: "argument count",
            got: Value::Int(args.len() as i64),
        })?;
        let code: Bytecode = Arc::from(vec![
            Instruction::Send {
                selector: Arc::from(selector),
                values,
                is_super: false,
            },
            Instruction::Answer,
        ]);
        let thread = self.thread.id();
        let mut entry = Frame::method(code, vec![Value::Nil], None, thread);
        entry.stack.push(receiver);
        entry.stack.extend_from_slice(args);
        self.push_frame(entry)?;
        self.run_loop()
    }

    /// Invoke `closure` from the host and run until it answers (or a
    /// non-local return leaves its home method).
    pub fn call_closure(
        &mut self,
        closure: &ObjectRef,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        self.enter_closure(closure, args, None)?;
        self.run_loop()
    }

    fn run_loop(&mut self) -> Result<Value, RuntimeError> {
        loop {
            match self.step()? {
                Flow::Continue => {}
                Flow::Finished(value) => return Ok(value),
            }
        }
    }

    // ── Dispatch ───────────────────────────────────────────────────

    /// Fetch and execute one instruction of the top frame.
    pub fn step(&mut self) -> Result<Flow, RuntimeError> {
        let current = self.thread.top().ok_or(RuntimeError::NoActiveFrame)?;
        let frame = self.expect_frame_mut(current)?;
        let pc = frame.pc;
        let Some(instr) = frame.code.get(pc).cloned() else {
            return self.implicit_return(current);
        };
        frame.pc += 1;
        log::trace!("{current:?} {pc:>4} {instr}");
        self.execute(current, &instr)
    }

    fn execute(&mut self, current: FrameRef, instr: &Instruction) -> Result<Flow, RuntimeError> {
        match instr {
            Instruction::PushLocal { index } => {
                let frame = self.expect_frame_mut(current)?;
                let value = frame.local(*index as usize)?;
                frame.push(value);
            }
            Instruction::PushGlobal { name } => {
                let class = self
                    .vm
                    .classes
                    .get(name)
                    .ok_or_else(|| RuntimeError::UnknownGlobal {
                        name: name.to_string(),
                    })?;
                self.expect_frame_mut(current)?.push(Value::Class(class));
            }
            Instruction::PushSelf => {
                let frame = self.expect_frame_mut(current)?;
                let receiver = frame.local(0)?;
                frame.push(receiver);
            }
            Instruction::PushInstVar { index } => {
                let frame = self.expect_frame_mut(current)?;
                let receiver = frame.local(0)?;
                let value = instance_slot(&receiver, *index)?;
                frame.push(value);
            }
            Instruction::PushLiteral { value } => {
                let boxed = self.box_literal(value)?;
                self.expect_frame_mut(current)?.push(boxed);
            }
            Instruction::StoreLocal { index } => {
                let frame = self.expect_frame_mut(current)?;
                let value = frame.pop()?;
                frame.set_local(*index as usize, value)?;
            }
            Instruction::StoreInstVar { index } => {
                let frame = self.expect_frame_mut(current)?;
                let value = frame.pop()?;
                let receiver = frame.local(0)?;
                set_instance_slot(&receiver, *index, value)?;
            }
            Instruction::StartBlock {
                argc,
                arg_start,
                length,
            } => {
                let body = self.capture_body(current, *length)?;
                // A block created inside a block returns to the same method.
                let home = self.expect_frame(current)?.home.unwrap_or(current);
                let class = self.vm.classes.require(names::BLOCK_CLOSURE)?;
                let closure = new_block_closure(
                    &class,
                    body,
                    *argc as usize,
                    *arg_start as usize,
                    current,
                    home,
                )
                .map_err(|_| RuntimeError::TypeError {
                    expected: "BlockClosure with closure slots",
                    got: Value::Class(class.clone()),
                })?;
                self.expect_frame_mut(current)?.push(Value::Object(closure));
            }
            Instruction::StartMethod {
                selector,
                argc,
                temps,
                length,
            } => {
                let body = self.capture_body(current, *length)?;
                let class = self.vm.classes.require(names::COMPILED_METHOD)?;
                let method = new_compiled_method(
                    &class,
                    body,
                    selector,
                    *argc as usize,
                    *temps as usize,
                )
                .map_err(|_| RuntimeError::TypeError {
                    expected: "CompiledMethod with method slots",
                    got: Value::Class(class.clone()),
                })?;
                self.expect_frame_mut(current)?.push(Value::Object(method));
            }
            Instruction::Send {
                selector,
                values,
                is_super,
            } => {
                self.dispatch_send(current, selector, *values as usize, *is_super)?;
            }
            Instruction::Dup => {
                let frame = self.expect_frame_mut(current)?;
                let top = frame.top()?.clone();
                frame.push(top);
            }
            Instruction::Drop => {
                self.expect_frame_mut(current)?.pop()?;
            }
            Instruction::Answer => {
                let value = self.expect_frame_mut(current)?.pop()?;
                return self.answer(current, value);
            }
            Instruction::AnswerSelf => {
                let receiver = self.expect_frame(current)?.local(0)?;
                return self.answer(current, receiver);
            }
            Instruction::AnswerBlock => {
                let value = self.expect_frame_mut(current)?.pop()?;
                return self.answer_block(current, value);
            }
            Instruction::Primitive { keyword, name } => {
                self.primitive(current, keyword, name)?;
            }
        }
        Ok(Flow::Continue)
    }

    fn box_literal(&self, literal: &Literal) -> Result<Value, RuntimeError> {
        Ok(box_literal(literal, &self.vm.classes)?)
    }

    /// Copy the next `length` instructions out of the current frame's code
    /// and move the program counter past them.
    fn capture_body(&mut self, current: FrameRef, length: u32) -> Result<Bytecode, RuntimeError> {
        let frame = self.expect_frame_mut(current)?;
        let start = frame.pc;
        let end = start + length as usize;
        if end > frame.code.len() {
            return Err(RuntimeError::TypeError {
                expected: "body length within code",
                got: Value::Int(length as i64),
            });
        }
        let body: Bytecode = Arc::from(&frame.code[start..end]);
        frame.pc = end;
        Ok(body)
    }

    // ── Sends ──────────────────────────────────────────────────────

    /// Resolve and activate a send whose receiver and arguments are the top
    /// `values` entries of the current frame's stack.
    ///
    /// Nothing is popped until the method has been found and its arity
    /// checked, so a failed send leaves every stack untouched.
    fn dispatch_send(
        &mut self,
        current: FrameRef,
        selector: &str,
        values: usize,
        is_super: bool,
    ) -> Result<(), RuntimeError> {
        let receiver = {
            let frame = self.expect_frame(current)?;
            if values == 0 || values > frame.stack.len() {
                return Err(RuntimeError::StackUnderflow);
            }
            frame.stack[frame.stack.len() - values].clone()
        };

        let receiver_class =
            class_of(&receiver, &self.vm.classes).ok_or_else(|| RuntimeError::TypeError {
                expected: "object receiver",
                got: receiver.clone(),
            })?;
        // Super sends start one level above the receiver's own class.
        let start = if is_super {
            match receiver_class.superclass() {
                Some(superclass) => superclass.clone(),
                None => {
                    return Err(RuntimeError::DoesNotUnderstand {
                        class: receiver_class.name().to_string(),
                        selector: selector.to_string(),
                    });
                }
            }
        } else {
            receiver_class
        };

        let (holder, method) = match lookup(&start, selector) {
            LookupResult::Found { holder, method, .. } => (holder, method),
            LookupResult::None => {
                log::debug!("{} does not understand #{selector}", start.name());
                return Err(RuntimeError::DoesNotUnderstand {
                    class: start.name().to_string(),
                    selector: selector.to_string(),
                });
            }
        };
        let info = MethodInfo::read(&method).ok_or_else(|| RuntimeError::TypeError {
            expected: "compiled method",
            got: Value::Object(method.clone()),
        })?;
        if info.argc + 1 != values {
            return Err(RuntimeError::ArgumentCountMismatch {
                class: start.name().to_string(),
                selector: selector.to_string(),
                expected: info.argc,
                actual: values - 1,
            });
        }
        if !self.thread.has_room() {
            return Err(RuntimeError::StackOverflow);
        }

        let mut locals = {
            let frame = self.expect_frame_mut(current)?;
            let at = frame.stack.len() - values;
            frame.stack.split_off(at)
        };
        if locals.len() < info.locals {
            locals.resize(info.locals, Value::Nil);
        }
        log::debug!(
            "send #{selector} to {receiver:?} -> {}>>#{}",
            holder.name(),
            info.selector
        );
        let thread = self.thread.id();
        self.push_frame(Frame::method(info.code, locals, Some(current), thread))?;
        Ok(())
    }

    fn push_frame(&mut self, frame: Frame) -> Result<FrameRef, RuntimeError> {
        if !self.thread.has_room() {
            return Err(RuntimeError::StackOverflow);
        }
        let kind = frame.kind;
        let handle = self.frames.alloc(frame);
        self.thread.push(handle)?;
        log::debug!("push {kind:?} {handle:?} depth={}", self.thread.depth());
        Ok(handle)
    }

    // ── Closures ───────────────────────────────────────────────────

    /// Push a block frame for `closure` whose sender is the current top
    /// frame. Execution continues in the block on the next step.
    pub fn invoke_closure(
        &mut self,
        closure: &ObjectRef,
        args: Vec<Value>,
    ) -> Result<FrameRef, RuntimeError> {
        let parent = self.thread.top();
        self.enter_closure(closure, args, parent)
    }

    fn enter_closure(
        &mut self,
        closure: &ObjectRef,
        args: Vec<Value>,
        parent: Option<FrameRef>,
    ) -> Result<FrameRef, RuntimeError> {
        let info = ClosureInfo::read(closure).ok_or_else(|| RuntimeError::TypeError {
            expected: "block closure",
            got: Value::Object(closure.clone()),
        })?;
        if args.len() != info.argc {
            return Err(RuntimeError::ArgumentCountMismatch {
                class: closure.class().name().to_string(),
                selector: block_value_selector(info.argc),
                expected: info.argc,
                actual: args.len(),
            });
        }

        // Enclosing locals come from the creating frame, or from the home
        // method once the creating block has answered.
        let mut locals = self
            .frames
            .get(info.creator)
            .or_else(|| self.frames.get(info.home))
            .map(|frame| frame.locals.clone())
            .unwrap_or_default();
        let needed = info.arg_start + info.argc;
        if locals.len() < needed {
            locals.resize(needed, Value::Nil);
        }
        for (i, arg) in args.into_iter().enumerate() {
            locals[info.arg_start + i] = arg;
        }

        let thread = self.thread.id();
        self.push_frame(Frame::block(info.code, locals, parent, thread, info.home))
    }

    // ── Returns ────────────────────────────────────────────────────

    /// Pop `current` and hand `value` to its sender.
    fn answer(&mut self, current: FrameRef, value: Value) -> Result<Flow, RuntimeError> {
        let popped = self.thread.pop();
        debug_assert_eq!(popped, Some(current));
        let frame = self.frames.release(current).ok_or(RuntimeError::TypeError {
            expected: "live frame",
            got: Value::Frame(current),
        })?;
        log::debug!("answer {value:?} from {current:?}");
        match frame.parent {
            Some(parent) => {
                self.expect_frame_mut(parent)?.push(value);
                Ok(Flow::Continue)
            }
            None => Ok(Flow::Finished(value)),
        }
    }

    /// Unwind through the block's home method and hand `value` to the
    /// home method's sender.
    fn answer_block(&mut self, current: FrameRef, value: Value) -> Result<Flow, RuntimeError> {
        let frame = self.expect_frame(current)?;
        let home = match frame.kind {
            FrameKind::Block => frame.home.ok_or(RuntimeError::NonLocalReturnExpired)?,
            FrameKind::Method => current,
        };
        let home_parent = match self.frames.get(home) {
            Some(home_frame) if self.thread.contains(home) => home_frame.parent,
            _ => return Err(RuntimeError::NonLocalReturnExpired),
        };
        let popped = self
            .thread
            .unwind_through(home)
            .ok_or(RuntimeError::NonLocalReturnExpired)?;
        log::debug!(
            "non-local return {value:?} from {current:?} to {home:?}, {} frame(s) unwound",
            popped.len()
        );
        for frame in popped {
            self.frames.release(frame);
        }
        match home_parent {
            Some(parent) => {
                self.expect_frame_mut(parent)?.push(value);
                Ok(Flow::Continue)
            }
            None => Ok(Flow::Finished(value)),
        }
    }

    /// Running past the end of a body: methods answer self, blocks answer
    /// their stack top or `nil`.
    fn implicit_return(&mut self, current: FrameRef) -> Result<Flow, RuntimeError> {
        let frame = self.expect_frame(current)?;
        let value = match frame.kind {
            FrameKind::Method => frame.receiver(),
            FrameKind::Block => frame.stack.last().cloned().unwrap_or(Value::Nil),
        };
        self.answer(current, value)
    }

    // ── Primitives ─────────────────────────────────────────────────

    fn primitive(
        &mut self,
        current: FrameRef,
        keyword: &str,
        name: &str,
    ) -> Result<(), RuntimeError> {
        if keyword != self.vm.settings.builtin_keyword {
            if self.vm.settings.strict_primitives {
                return Err(RuntimeError::UnknownPrimitiveKeyword {
                    keyword: keyword.to_string(),
                });
            }
            log::warn!("ignoring primitive {keyword} {name}: unrecognized keyword");
            return Ok(());
        }
        let func = self
            .vm
            .builtins
            .get(name)
            .map(|builtin| builtin.func)
            .ok_or_else(|| RuntimeError::UnknownBuiltin {
                name: name.to_string(),
            })?;
        log::debug!("builtin {name} in {current:?}");
        func(self, current)
    }
}

fn instance_slot(receiver: &Value, index: u16) -> Result<Value, RuntimeError> {
    let obj = receiver.as_object().ok_or_else(|| RuntimeError::TypeError {
        expected: "instance receiver",
        got: receiver.clone(),
    })?;
    obj.slot(index as usize).ok_or(RuntimeError::TypeError {
        expected: "instance variable index",
        got: Value::Int(index as i64),
    })
}

fn set_instance_slot(receiver: &Value, index: u16, value: Value) -> Result<(), RuntimeError> {
    let obj = receiver.as_object().ok_or_else(|| RuntimeError::TypeError {
        expected: "instance receiver",
        got: receiver.clone(),
    })?;
    obj.set_slot(index as usize, value)
        .map_err(|_| RuntimeError::TypeError {
            expected: "instance variable index",
            got: Value::Int(index as i64),
        })
}

/// `value`, `value:`, `value:value:`, … for `argc` arguments.
pub fn block_value_selector(argc: usize) -> String {
    if argc == 0 {
        return "value".to_string();
    }
    "value:".repeat(argc)
}
