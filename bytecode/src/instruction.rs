use core::fmt;
use std::sync::Arc;

/// An immutable instruction sequence.
///
/// Methods, closures and frames share captured bodies by reference counting;
/// slicing a body out of its enclosing sequence copies it once at capture
/// time.
pub type Bytecode = Arc<[Instruction]>;

/// A literal operand of [`Instruction::PushLiteral`].
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(Arc<str>),
    Number(f64),
    Bool(bool),
    Nil,
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::Str(Arc::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "'{s}'"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Nil => write!(f, "nil"),
        }
    }
}

/// A single stack-machine instruction with its operands.
///
/// `length` operands count instructions, not bytes: the body of a block or
/// method is the `length` instructions that directly follow the
/// `StartBlock`/`StartMethod` instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    PushLocal {
        index: u16,
    },
    PushGlobal {
        name: Arc<str>,
    },
    PushSelf,
    PushInstVar {
        index: u16,
    },
    PushLiteral {
        value: Literal,
    },
    StoreLocal {
        index: u16,
    },
    StoreInstVar {
        index: u16,
    },
    StartBlock {
        argc: u16,
        arg_start: u16,
        length: u32,
    },
    StartMethod {
        selector: Arc<str>,
        argc: u16,
        temps: u16,
        length: u32,
    },
    /// `values` counts the receiver plus its arguments.
    Send {
        selector: Arc<str>,
        values: u16,
        is_super: bool,
    },
    Dup,
    Drop,
    Answer,
    AnswerBlock,
    AnswerSelf,
    Primitive {
        keyword: Arc<str>,
        name: Arc<str>,
    },
}

impl Instruction {
    /// Number of instructions following this one that belong to a captured
    /// body, or `0` for instructions without a body.
    pub fn body_length(&self) -> usize {
        match self {
            Self::StartBlock { length, .. } | Self::StartMethod { length, .. } => {
                *length as usize
            }
            _ => 0,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PushLocal { index } => write!(f, "pushLocal {index}"),
            Self::PushGlobal { name } => write!(f, "pushGlobal {name}"),
            Self::PushSelf => write!(f, "pushSelf"),
            Self::PushInstVar { index } => write!(f, "pushInstVar {index}"),
            Self::PushLiteral { value } => write!(f, "pushLiteral {value}"),
            Self::StoreLocal { index } => write!(f, "storeLocal {index}"),
            Self::StoreInstVar { index } => write!(f, "storeInstVar {index}"),
            Self::StartBlock {
                argc,
                arg_start,
                length,
            } => {
                write!(f, "startBlock argc={argc} argStart={arg_start} +{length}")
            }
            Self::StartMethod {
                selector,
                argc,
                temps,
                length,
            } => {
                write!(f, "startMethod #{selector} argc={argc} temps={temps} +{length}")
            }
            Self::Send {
                selector,
                values,
                is_super,
            } => {
                if *is_super {
                    write!(f, "send super #{selector} {values}")
                } else {
                    write!(f, "send #{selector} {values}")
                }
            }
            Self::Dup => write!(f, "dup"),
            Self::Drop => write!(f, "drop"),
            Self::Answer => write!(f, "answer"),
            Self::AnswerBlock => write!(f, "answerBlock"),
            Self::AnswerSelf => write!(f, "answerSelf"),
            Self::Primitive { keyword, name } => {
                write!(f, "primitive {keyword} {name}")
            }
        }
    }
}

/// Render an instruction sequence one instruction per line, indenting
/// captured bodies under their `startBlock`/`startMethod`.
pub fn disassemble(code: &[Instruction]) -> String {
    let mut out = String::new();
    // Remaining body lengths of the currently open bodies, innermost last.
    let mut open: Vec<usize> = Vec::new();
    for (pc, instr) in code.iter().enumerate() {
        let depth = open.len();
        out.push_str(&format!("{pc:>4}  {}{instr}\n", "  ".repeat(depth)));
        for remaining in open.iter_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        open.retain(|remaining| *remaining > 0);
        let body = instr.body_length();
        if body > 0 {
            open.push(body);
        }
    }
    out
}
