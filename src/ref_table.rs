use alloc::{boxed::Box, vec::Vec};
use core::sync::atomic::{AtomicUsize, Ordering};

use crate::error::FrameError;

/// Per-frame reference counts, one slot per frame of the managed range.
///
/// Each update is a single atomic operation, so a count is never torn and
/// never underflows. Ordering updates of one frame against the decisions
/// built on them (a release observing zero while another context shares the
/// frame) is left to the caller.
pub struct RefTable {
    counts: Box<[AtomicUsize]>,
}

impl RefTable {
    /// A table of `frames` zeroed counts. Never resized afterwards.
    pub fn new(frames: usize) -> Self {
        let counts: Vec<AtomicUsize> = (0..frames).map(|_| AtomicUsize::new(0)).collect();
        Self {
            counts: counts.into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    fn slot(&self, index: usize) -> Result<&AtomicUsize, FrameError> {
        self.counts.get(index).ok_or(FrameError::InvalidIndex(index))
    }

    pub fn get(&self, index: usize) -> Result<usize, FrameError> {
        Ok(self.slot(index)?.load(Ordering::Acquire))
    }

    pub fn set(&self, index: usize, count: usize) -> Result<(), FrameError> {
        self.slot(index)?.store(count, Ordering::Release);
        Ok(())
    }

    /// Adds one reference and returns the new count.
    pub fn increment(&self, index: usize) -> Result<usize, FrameError> {
        Ok(self.slot(index)?.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Drops one reference and returns the new count, or `None` when the
    /// count was already zero and nothing changed.
    pub fn decrement(&self, index: usize) -> Result<Option<usize>, FrameError> {
        let prev = self
            .slot(index)?
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| count.checked_sub(1));
        Ok(prev.ok().map(|count| count - 1))
    }
}
