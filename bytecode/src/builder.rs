use std::sync::Arc;

use crate::instruction::{Bytecode, Instruction, Literal};

/// Keyword that marks a `primitive` instruction as a builtin invocation.
pub const BUILTIN_KEYWORD: &str = "builtin:";

/// A block or method body whose length has not yet been resolved.
///
/// Created by [`BytecodeBuilder::begin_block`] and
/// [`BytecodeBuilder::begin_method`]. Resolve it with
/// [`BytecodeBuilder::end_body`].
#[derive(Debug)]
#[must_use = "an open body must be closed with `end_body`"]
pub struct Body {
    /// Position of the `StartBlock`/`StartMethod` instruction.
    start_pos: usize,
}

/// Builds an instruction sequence.
///
/// Captured bodies are emitted inline after their `startBlock`/`startMethod`
/// instruction; the builder patches the `length` operand once the body is
/// closed.
#[derive(Debug, Default)]
pub struct BytecodeBuilder {
    code: Vec<Instruction>,
}

impl BytecodeBuilder {
    pub fn new() -> Self {
        Self { code: Vec::new() }
    }

    pub fn as_slice(&self) -> &[Instruction] {
        &self.code
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.code
    }

    pub fn into_bytecode(self) -> Bytecode {
        Arc::from(self.code)
    }

    pub fn emit(&mut self, instruction: Instruction) {
        self.code.push(instruction);
    }

    pub fn push_local(&mut self, index: u16) {
        self.emit(Instruction::PushLocal { index });
    }

    pub fn push_global(&mut self, name: &str) {
        self.emit(Instruction::PushGlobal {
            name: Arc::from(name),
        });
    }

    pub fn push_self(&mut self) {
        self.emit(Instruction::PushSelf);
    }

    pub fn push_inst_var(&mut self, index: u16) {
        self.emit(Instruction::PushInstVar { index });
    }

    pub fn push_literal(&mut self, value: impl Into<Literal>) {
        self.emit(Instruction::PushLiteral {
            value: value.into(),
        });
    }

    pub fn push_nil(&mut self) {
        self.emit(Instruction::PushLiteral {
            value: Literal::Nil,
        });
    }

    pub fn store_local(&mut self, index: u16) {
        self.emit(Instruction::StoreLocal { index });
    }

    pub fn store_inst_var(&mut self, index: u16) {
        self.emit(Instruction::StoreInstVar { index });
    }

    /// `send`: `values` counts the receiver plus its arguments.
    pub fn send(&mut self, selector: &str, values: u16) {
        self.emit(Instruction::Send {
            selector: Arc::from(selector),
            values,
            is_super: false,
        });
    }

    pub fn super_send(&mut self, selector: &str, values: u16) {
        self.emit(Instruction::Send {
            selector: Arc::from(selector),
            values,
            is_super: true,
        });
    }

    pub fn dup(&mut self) {
        self.emit(Instruction::Dup);
    }

    pub fn drop(&mut self) {
        self.emit(Instruction::Drop);
    }

    pub fn answer(&mut self) {
        self.emit(Instruction::Answer);
    }

    pub fn answer_block(&mut self) {
        self.emit(Instruction::AnswerBlock);
    }

    pub fn answer_self(&mut self) {
        self.emit(Instruction::AnswerSelf);
    }

    pub fn primitive(&mut self, keyword: &str, name: &str) {
        self.emit(Instruction::Primitive {
            keyword: Arc::from(keyword),
            name: Arc::from(name),
        });
    }

    /// `primitive builtin: name`
    pub fn builtin(&mut self, name: &str) {
        self.primitive(BUILTIN_KEYWORD, name);
    }

    /// Open a block body. Everything emitted until the matching
    /// [`end_body`](Self::end_body) is captured by the closure.
    pub fn begin_block(&mut self, argc: u16, arg_start: u16) -> Body {
        let start_pos = self.code.len();
        self.emit(Instruction::StartBlock {
            argc,
            arg_start,
            length: 0,
        });
        Body { start_pos }
    }

    /// Open a method body. Everything emitted until the matching
    /// [`end_body`](Self::end_body) is captured by the method.
    pub fn begin_method(&mut self, selector: &str, argc: u16, temps: u16) -> Body {
        let start_pos = self.code.len();
        self.emit(Instruction::StartMethod {
            selector: Arc::from(selector),
            argc,
            temps,
            length: 0,
        });
        Body { start_pos }
    }

    /// Close a body, patching the `length` operand of its start instruction.
    pub fn end_body(&mut self, body: Body) {
        let body_len = (self.code.len() - body.start_pos - 1) as u32;
        match &mut self.code[body.start_pos] {
            Instruction::StartBlock { length, .. }
            | Instruction::StartMethod { length, .. } => *length = body_len,
            other => unreachable!("body opened at a non-body instruction: {other}"),
        }
    }

    /// Emit a block whose body is produced by `f`.
    pub fn block(&mut self, argc: u16, arg_start: u16, f: impl FnOnce(&mut Self)) {
        let body = self.begin_block(argc, arg_start);
        f(self);
        self.end_body(body);
    }

    /// Emit a method whose body is produced by `f`.
    pub fn method(&mut self, selector: &str, argc: u16, temps: u16, f: impl FnOnce(&mut Self)) {
        let body = self.begin_method(selector, argc, temps);
        f(self);
        self.end_body(body);
    }
}
