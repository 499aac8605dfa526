use core::mem::ManuallyDrop;

use log::{error, trace};

use crate::{
    address::PhysicalAddress,
    allocator::FrameAllocator,
    error::FrameError,
    memory::PhysMemory,
};

/// [`FrameTracker`] holds one reference to an allocated frame, the way a
/// [`Box`](alloc::boxed::Box) holds its heap memory. Dropping it releases
/// that reference.
pub struct FrameTracker<'a, M: PhysMemory> {
    allocator: &'a FrameAllocator<M>,
    pa:        PhysicalAddress,
}

impl<'a, M: PhysMemory> FrameTracker<'a, M> {
    /// Takes ownership of one reference the caller already holds on `pa`.
    pub(crate) fn new(allocator: &'a FrameAllocator<M>, pa: PhysicalAddress) -> Self {
        Self { allocator, pa }
    }

    pub fn pa(&self) -> PhysicalAddress {
        self.pa
    }

    pub fn ref_count(&self) -> Result<usize, FrameError> {
        self.allocator.ref_count_of(self.pa)
    }

    /// Adds a reference to the same frame, for a second mapping of it.
    pub fn share(&self) -> Result<Self, FrameError> {
        self.allocator.share(self.pa)?;
        trace!("kalloc: tracker shares frame {:#x}", self.pa);
        Ok(Self::new(self.allocator, self.pa))
    }

    /// Gives the reference back to the caller, who must release `pa` itself.
    pub fn into_raw(self) -> PhysicalAddress {
        ManuallyDrop::new(self).pa
    }
}

impl<M: PhysMemory> Drop for FrameTracker<'_, M> {
    fn drop(&mut self) {
        trace!("drop: frame tracker {:#x}", self.pa);
        if let Err(err) = self.allocator.release(self.pa) {
            error!("kalloc: tracker failed to release {:#x}: {}", self.pa, err);
        }
    }
}
