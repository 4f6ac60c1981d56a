pub mod frame;
pub mod interpreter;
pub mod primitives;
pub mod special;
pub mod threading;

use bytecode::BUILTIN_KEYWORD;
use object::{ClassRegistry, SlotOutOfRange};

pub use frame::{Frame, FrameArena, FrameKind};
pub use interpreter::{Flow, Interpreter, RuntimeError};
pub use primitives::{BuiltinDesc, BuiltinFn, BuiltinTable};
pub use threading::CallThread;

/// Default call depth limit.
pub const MAX_FRAMES: usize = 1024;

#[derive(Debug, Clone)]
pub struct VmSettings {
    /// Frames a single call thread may hold before sends fail with
    /// `StackOverflow`.
    pub max_frames: usize,
    /// `primitive` keyword that routes to the builtin table.
    pub builtin_keyword: String,
    /// Fail on unrecognized primitive keywords instead of skipping them.
    pub strict_primitives: bool,
}

impl Default for VmSettings {
    fn default() -> Self {
        Self {
            max_frames: MAX_FRAMES,
            builtin_keyword: BUILTIN_KEYWORD.to_string(),
            strict_primitives: false,
        }
    }
}

/// State shared by every interpreter: the class registry, the builtin table
/// and the settings. Wrap it in an `Arc` and hand one clone to each
/// [`Interpreter`].
#[derive(Debug)]
pub struct VM {
    pub classes: ClassRegistry,
    pub builtins: BuiltinTable,
    pub settings: VmSettings,
}

impl VM {
    pub fn new(classes: ClassRegistry, builtins: BuiltinTable, settings: VmSettings) -> Self {
        Self {
            classes,
            builtins,
            settings,
        }
    }

    /// Kernel classes and the default builtins.
    pub fn bootstrap(settings: VmSettings) -> Result<Self, SlotOutOfRange> {
        let classes = special::bootstrap()?;
        Ok(Self::new(classes, BuiltinTable::with_defaults(), settings))
    }
}
