use std::sync::Arc;

use bytecode::Bytecode;

use crate::{ClassRef, FrameRef, ObjectRef};

/// A value held on an evaluation stack, in a local, or in an instance slot.
///
/// Stack values are object references (`Object`, `Class`) or `Nil`. The raw
/// variants (`Int`, `Number`, `Str`, `Symbol`, `Code`, `Frame`) are the
/// payloads stored in the well-known slots of boxed literals, closures and
/// compiled methods.
#[derive(Clone)]
pub enum Value {
    Nil,
    Int(i64),
    Number(f64),
    Str(Arc<str>),
    Symbol(Arc<str>),
    Code(Bytecode),
    Frame(FrameRef),
    Object(ObjectRef),
    Class(ClassRef),
}

impl Value {
    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    #[inline]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[inline]
    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Self::Class(class) => Some(class),
            _ => None,
        }
    }

    #[inline]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[inline]
    pub fn as_code(&self) -> Option<&Bytecode> {
        match self {
            Self::Code(code) => Some(code),
            _ => None,
        }
    }

    #[inline]
    pub fn as_frame(&self) -> Option<FrameRef> {
        match self {
            Self::Frame(frame) => Some(*frame),
            _ => None,
        }
    }

    /// Identity comparison: references compare by address, immediates by
    /// value.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a.to_bits() == b.to_bits(),
            (Self::Str(a), Self::Str(b)) | (Self::Symbol(a), Self::Symbol(b)) => {
                Arc::ptr_eq(a, b) || a == b
            }
            (Self::Code(a), Self::Code(b)) => Arc::ptr_eq(a, b),
            (Self::Frame(a), Self::Frame(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Class(a), Self::Class(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.is_identical(other)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Self::Object(obj)
    }
}

impl From<ClassRef> for Value {
    fn from(class: ClassRef) -> Self {
        Self::Class(class)
    }
}

impl core::fmt::Debug for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Int(n) => write!(f, "Int({n})"),
            Self::Number(n) => write!(f, "Number({n})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Symbol(s) => write!(f, "#{s}"),
            Self::Code(code) => write!(f, "Code[{}]", code.len()),
            Self::Frame(frame) => write!(f, "{frame:?}"),
            // Slots are not printed: object graphs may be cyclic.
            Self::Object(obj) => {
                write!(f, "a {}@{:p}", obj.class().name(), Arc::as_ptr(obj))
            }
            Self::Class(class) => write!(f, "{}", class.name()),
        }
    }
}
