//! Well-known slot offsets and kernel class names.
//!
//! These offsets are the contract between the object model and the
//! interpreter: boxed literals, closures and compiled methods are ordinary
//! instances whose payload lives at these fixed slots.

// ── Boxed literals ─────────────────────────────────────────────────

/// Raw `Value::Str` of a `String` instance.
pub const STRING_RAW: usize = 0;

/// Raw `Value::Number` of a `Number` instance.
pub const NUMBER_RAW: usize = 0;

// ── BlockClosure ───────────────────────────────────────────────────

/// Captured body (`Value::Code`).
pub const CLOSURE_BYTECODE: usize = 0;
/// Argument count (`Value::Int`).
pub const CLOSURE_ARGC: usize = 1;
/// First local receiving an argument (`Value::Int`).
pub const CLOSURE_ARGV: usize = 2;
/// Creating frame (`Value::Frame`), whose locals the block reads on
/// invocation.
pub const CLOSURE_METHOD_RECORD: usize = 3;
/// Home method frame (`Value::Frame`) targeted by non-local return. Equal to
/// the creating frame unless the closure was created inside a block.
pub const CLOSURE_HOME: usize = 4;
/// Minimum instance-variable count of the `BlockClosure` class.
pub const CLOSURE_SLOT_COUNT: usize = 5;

// ── CompiledMethod ─────────────────────────────────────────────────

/// Captured body (`Value::Code`).
pub const METHOD_BYTECODE: usize = 0;
/// Locals count: receiver + arguments + temporaries (`Value::Int`).
pub const METHOD_LOCALS: usize = 1;
/// Argument count, receiver excluded (`Value::Int`).
pub const METHOD_ARGC: usize = 2;
/// Selector (`Value::Symbol`).
pub const METHOD_SELECTOR: usize = 3;
/// Minimum instance-variable count of the `CompiledMethod` class.
pub const METHOD_SLOT_COUNT: usize = 4;

/// Names the interpreter resolves in the class registry.
pub mod names {
    pub const OBJECT: &str = "Object";
    pub const CLASS: &str = "Class";
    pub const UNDEFINED_OBJECT: &str = "UndefinedObject";
    pub const STRING: &str = "String";
    pub const NUMBER: &str = "Number";
    pub const BOOLEAN: &str = "Boolean";
    pub const TRUE_CLASS: &str = "True";
    pub const FALSE_CLASS: &str = "False";
    /// The `true` singleton is itself a class object.
    pub const TRUE: &str = "true";
    /// The `false` singleton is itself a class object.
    pub const FALSE: &str = "false";
    pub const BLOCK_CLOSURE: &str = "BlockClosure";
    pub const COMPILED_METHOD: &str = "CompiledMethod";
}
