use std::sync::atomic::{AtomicU32, Ordering};

use object::{FrameRef, ThreadId};

use crate::interpreter::RuntimeError;

static NEXT_THREAD_ID: AtomicU32 = AtomicU32::new(1);

fn next_thread_id() -> ThreadId {
    ThreadId(NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed))
}

/// The frame stack of one control flow, innermost frame last.
#[derive(Debug)]
pub struct CallThread {
    id: ThreadId,
    frames: Vec<FrameRef>,
    max_depth: usize,
}

impl CallThread {
    /// A new, idle thread with a process-unique id.
    pub fn new(max_depth: usize) -> Self {
        Self {
            id: next_thread_id(),
            frames: Vec::new(),
            max_depth,
        }
    }

    #[inline]
    pub fn id(&self) -> ThreadId {
        self.id
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn has_room(&self) -> bool {
        self.frames.len() < self.max_depth
    }

    #[inline]
    pub fn top(&self) -> Option<FrameRef> {
        self.frames.last().copied()
    }

    pub fn frames(&self) -> &[FrameRef] {
        &self.frames
    }

    pub fn contains(&self, frame: FrameRef) -> bool {
        self.frames.contains(&frame)
    }

    /// Push a frame, failing with `StackOverflow` at the depth limit.
    pub fn push(&mut self, frame: FrameRef) -> Result<(), RuntimeError> {
        if !self.has_room() {
            return Err(RuntimeError::StackOverflow);
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Return to the immediate sender.
    pub fn pop(&mut self) -> Option<FrameRef> {
        self.frames.pop()
    }

    /// Pop every frame above `target`, leaving `target` on top. Returns the
    /// popped frames innermost first, or `None` (popping nothing) when
    /// `target` is not on this thread.
    pub fn pop_to(&mut self, target: FrameRef) -> Option<Vec<FrameRef>> {
        let pos = self.frames.iter().rposition(|f| *f == target)?;
        let mut popped = self.frames.split_off(pos + 1);
        popped.reverse();
        Some(popped)
    }

    /// Pop every frame down to and including `target`. Returns the popped
    /// frames innermost first, or `None` (popping nothing) when `target` is
    /// not on this thread.
    pub fn unwind_through(&mut self, target: FrameRef) -> Option<Vec<FrameRef>> {
        let pos = self.frames.iter().rposition(|f| *f == target)?;
        let mut popped = self.frames.split_off(pos);
        popped.reverse();
        Some(popped)
    }

    /// Drop every frame, returning them innermost first.
    pub fn clear(&mut self) -> Vec<FrameRef> {
        let mut popped = std::mem::take(&mut self.frames);
        popped.reverse();
        popped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(thread: &CallThread, index: u32) -> FrameRef {
        FrameRef::new(thread.id(), index, 0)
    }

    #[test]
    fn threads_get_distinct_ids() {
        assert_ne!(CallThread::new(4).id(), CallThread::new(4).id());
    }

    #[test]
    fn push_respects_depth_limit() {
        let mut t = CallThread::new(2);
        t.push(frame(&t, 0)).expect("room");
        t.push(frame(&t, 1)).expect("room");
        assert_eq!(t.push(frame(&t, 2)), Err(RuntimeError::StackOverflow));
        assert_eq!(t.depth(), 2);
    }

    #[test]
    fn pop_to_keeps_target() {
        let mut t = CallThread::new(8);
        let frames: Vec<_> = (0..4).map(|i| frame(&t, i)).collect();
        for f in &frames {
            t.push(*f).expect("room");
        }
        let popped = t.pop_to(frames[1]).expect("on thread");
        assert_eq!(popped, vec![frames[3], frames[2]]);
        assert_eq!(t.top(), Some(frames[1]));
    }

    #[test]
    fn unwind_through_removes_target() {
        let mut t = CallThread::new(8);
        let frames: Vec<_> = (0..3).map(|i| frame(&t, i)).collect();
        for f in &frames {
            t.push(*f).expect("room");
        }
        let popped = t.unwind_through(frames[1]).expect("on thread");
        assert_eq!(popped, vec![frames[2], frames[1]]);
        assert_eq!(t.top(), Some(frames[0]));
    }

    #[test]
    fn unwinding_to_foreign_frame_pops_nothing() {
        let mut t = CallThread::new(8);
        t.push(frame(&t, 0)).expect("room");
        let stranger = FrameRef::new(ThreadId(u32::MAX), 0, 0);
        assert!(t.pop_to(stranger).is_none());
        assert!(t.unwind_through(stranger).is_none());
        assert_eq!(t.depth(), 1);
    }
}
