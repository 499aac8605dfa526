use core::{iter::StepBy, ops::Range};

use crate::{config::PAGE_SIZE, error::FrameError};

/// A physical address. Bits [12..] are the physical page number and bits
/// [0..11] are the byte offset within the frame.
pub type PhysicalAddress = usize;

#[macro_export]
macro_rules! pg_round_up {
    ($sz:expr, $pg_size:expr) => {{
        ($sz + $pg_size - 1) & !($pg_size - 1)
    }};
}

#[macro_export]
macro_rules! pg_round_down {
    ($a:expr, $pg_size:expr) => {{
        $a & !($pg_size - 1)
    }};
}

#[macro_export]
macro_rules! is_aligned {
    ($addr:expr, $pg_size:expr) => {{
        $crate::pg_round_down!($addr, $pg_size) == $addr
    }};
}

/// The half-open interval `[start, end)` of frames one allocator manages.
///
/// Both bounds are frame aligned and `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    start: PhysicalAddress,
    end:   PhysicalAddress,
}

impl FrameRange {
    /// Builds the range from the first address past the kernel image and
    /// the top of physical memory. `kernel_end` is rounded up and `mem_end`
    /// down, so a partial frame at either edge is never managed.
    pub fn new(kernel_end: PhysicalAddress, mem_end: PhysicalAddress) -> Result<Self, FrameError> {
        let start = kernel_end
            .checked_add(PAGE_SIZE - 1)
            .map(|sz| pg_round_down!(sz, PAGE_SIZE))
            .ok_or(FrameError::InvalidRange {
                start: kernel_end,
                end:   mem_end,
            })?;
        let end = pg_round_down!(mem_end, PAGE_SIZE);

        if start > end {
            return Err(FrameError::InvalidRange {
                start: kernel_end,
                end:   mem_end,
            });
        }

        Ok(Self { start, end })
    }

    pub const fn start(&self) -> PhysicalAddress {
        self.start
    }

    pub const fn end(&self) -> PhysicalAddress {
        self.end
    }

    pub const fn frame_count(&self) -> usize {
        (self.end - self.start) / PAGE_SIZE
    }

    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Whether `pa` is a frame-aligned address inside the range.
    pub fn contains(&self, pa: PhysicalAddress) -> bool {
        is_aligned!(pa, PAGE_SIZE) && pa >= self.start && pa < self.end
    }

    /// Translates a frame address to its index without checking it.
    ///
    /// The result is meaningless unless `pa` is in the range. Use
    /// [`FrameRange::checked_index`] for untrusted addresses.
    pub const fn index_of(&self, pa: PhysicalAddress) -> usize {
        pa.wrapping_sub(self.start) / PAGE_SIZE
    }

    /// Translates a frame index back to its address.
    pub const fn address_of(&self, index: usize) -> PhysicalAddress {
        self.start + index * PAGE_SIZE
    }

    pub fn checked_index(&self, pa: PhysicalAddress) -> Result<usize, FrameError> {
        if !is_aligned!(pa, PAGE_SIZE) {
            return Err(FrameError::Misaligned(pa));
        }
        if pa < self.start || pa >= self.end {
            return Err(FrameError::OutOfRange(pa));
        }
        Ok(self.index_of(pa))
    }

    /// Every frame address in the range, lowest first.
    pub fn frames(&self) -> StepBy<Range<PhysicalAddress>> {
        (self.start..self.end).step_by(PAGE_SIZE)
    }
}
