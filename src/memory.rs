use core::slice::from_raw_parts_mut;

use crate::{address::PhysicalAddress, config::PAGE_SIZE};

/// How the allocator reaches the bytes of a physical frame.
///
/// The allocator never dereferences a physical address itself. It asks the
/// memory for a pointer and only writes through it while it owns the frame
/// exclusively (between the pool pop and the return of `allocate`, and
/// between the last release and the pool push).
pub trait PhysMemory {
    /// Returns a pointer to the first byte of the frame at `pa`.
    fn translate(&self, pa: PhysicalAddress) -> *mut u8;

    /// Overwrites the whole frame at `pa` with `byte`.
    ///
    /// # Safety
    ///
    /// `pa` must be a frame-aligned address backed by this memory, and no
    /// one else may be reading or writing the frame.
    unsafe fn fill_frame(&self, pa: PhysicalAddress, byte: u8) {
        from_raw_parts_mut(self.translate(pa), PAGE_SIZE).fill(byte);
    }

    /// # Safety
    ///
    /// Same contract as [`PhysMemory::fill_frame`].
    unsafe fn zero_frame(&self, pa: PhysicalAddress) {
        self.fill_frame(pa, 0);
    }
}

/// The kernel direct map: physical RAM is visible at `pa + offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectMap {
    offset: usize,
}

impl DirectMap {
    /// Physical memory mapped one to one, as the kernel maps RAM.
    pub const IDENTITY: Self = Self { offset: 0 };

    pub const fn new(offset: usize) -> Self {
        Self { offset }
    }

    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl PhysMemory for DirectMap {
    fn translate(&self, pa: PhysicalAddress) -> *mut u8 {
        pa.wrapping_add(self.offset) as *mut u8
    }
}
