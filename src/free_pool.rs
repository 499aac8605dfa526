use alloc::{vec, vec::Vec};

use spin::Mutex;

struct Inner {
    recycled: Vec<usize>,
    pooled:   Vec<bool>,
}

/// Stack of free frame indices behind a spin lock.
///
/// Alongside the stack, each frame has a membership bit that is set on push
/// and cleared on pop, so a frame is never on the stack twice. The backing
/// storage is reserved for every frame up front, so neither `push` nor
/// `pop` allocates while the lock is held.
pub struct FreePool {
    inner: Mutex<Inner>,
}

impl FreePool {
    pub fn with_capacity(frames: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                recycled: Vec::with_capacity(frames),
                pooled:   vec![false; frames],
            }),
        }
    }

    /// Pushes `index` and returns `true`, or returns `false` if the frame is
    /// already pooled or `index` is past the pool's frames.
    pub fn push(&self, index: usize) -> bool {
        let mut inner = self.inner.lock();
        match inner.pooled.get_mut(index) {
            Some(pooled) if !*pooled => *pooled = true,
            _ => return false,
        }
        inner.recycled.push(index);
        true
    }

    /// Pops the most recently freed index.
    pub fn pop(&self) -> Option<usize> {
        let mut inner = self.inner.lock();
        let index = inner.recycled.pop()?;
        inner.pooled[index] = false;
        Some(index)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().recycled.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, index: usize) -> bool {
        self.inner.lock().pooled.get(index).copied().unwrap_or(false)
    }
}
