use core::fmt;

/// Identifies one call thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadId(pub u32);

/// A non-owning handle to an activation record.
///
/// Frames live in an arena owned by their call thread's interpreter. A handle
/// carries the slot index and the generation the slot had when the frame was
/// allocated; once the frame is popped the slot's generation moves on and
/// every outstanding handle to it stops resolving. Closures store this handle
/// as their back-reference, so a closure that outlives its defining frame can
/// never reach a reused slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRef {
    pub thread: ThreadId,
    pub index: u32,
    pub generation: u32,
}

impl FrameRef {
    #[inline]
    pub const fn new(thread: ThreadId, index: u32, generation: u32) -> Self {
        Self {
            thread,
            index,
            generation,
        }
    }
}

impl fmt::Debug for FrameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Frame(t{}#{}.{})", self.thread.0, self.index, self.generation)
    }
}
