mod builder;
mod instruction;

pub use builder::{Body, BytecodeBuilder, BUILTIN_KEYWORD};
pub use instruction::{disassemble, Bytecode, Instruction, Literal};
