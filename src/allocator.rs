use bitflags::bitflags;
use log::{debug, error, info, trace, warn};

use crate::{
    address::{FrameRange, PhysicalAddress},
    config::PoisonConfig,
    error::FrameError,
    free_pool::FreePool,
    memory::PhysMemory,
    ref_table::RefTable,
    tracker::FrameTracker,
};

bitflags! {
    #[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
    pub struct AllocFlags: u32 {
        /// Hand the frame out filled with zeros instead of junk.
        const ZERO = 1 << 0;
    }
}

/// Allocates whole 4096-byte frames of physical memory and tracks how many
/// mappings share each one.
///
/// A frame is either in the free pool with no references, or handed out
/// with at least one. It goes back to the pool only when its last reference
/// is released.
pub struct FrameAllocator<M: PhysMemory> {
    range:  FrameRange,
    refs:   RefTable,
    pool:   FreePool,
    poison: PoisonConfig,
    memory: M,
}

impl<M: PhysMemory> FrameAllocator<M> {
    /// Takes over every whole frame between `kernel_end` and `mem_end`.
    ///
    /// # Safety
    ///
    /// Every frame of the range must be unused by anyone else and reachable
    /// through `memory` for as long as the allocator lives.
    pub unsafe fn new(
        kernel_end: PhysicalAddress,
        mem_end: PhysicalAddress,
        memory: M,
    ) -> Result<Self, FrameError> {
        Self::with_config(kernel_end, mem_end, memory, PoisonConfig::default())
    }

    /// # Safety
    ///
    /// See [`FrameAllocator::new`].
    pub unsafe fn with_config(
        kernel_end: PhysicalAddress,
        mem_end: PhysicalAddress,
        memory: M,
        poison: PoisonConfig,
    ) -> Result<Self, FrameError> {
        let range = FrameRange::new(kernel_end, mem_end)?;
        info!(
            "kalloc: init frames from {:#x} to {:#x}...",
            range.start(),
            range.end()
        );
        debug!(
            "kalloc: poison on alloc: {:?}, on free: {:?}",
            poison.on_alloc, poison.on_free
        );
        if !poison.is_distinguishable() {
            warn!("kalloc: alloc and free poison are the same byte");
        }

        let allocator = Self {
            range,
            refs: RefTable::new(range.frame_count()),
            pool: FreePool::with_capacity(range.frame_count()),
            poison,
            memory,
        };
        allocator.free_range()?;

        info!("kalloc: {} frames available", allocator.free_frames());
        Ok(allocator)
    }

    unsafe fn free_range(&self) -> Result<(), FrameError> {
        for pa in self.range.frames() {
            let index = self.range.index_of(pa);
            self.refs.set(index, 0)?;
            self.recycle(pa, index);
        }
        Ok(())
    }

    /// Junks a frame nobody references any more and puts it on the pool.
    ///
    /// The fill happens before the lock is taken.
    unsafe fn recycle(&self, pa: PhysicalAddress, index: usize) {
        if let Some(byte) = self.poison.on_free {
            self.memory.fill_frame(pa, byte);
        }
        if !self.pool.push(index) {
            warn!("kalloc: frame {:#x} was pooled concurrently", pa);
        }
    }

    /// Allocates one frame filled with the alloc poison, with a reference
    /// count of one. Returns `None` when no frame is free; it never waits.
    pub fn allocate(&self) -> Option<PhysicalAddress> {
        self.allocate_with(AllocFlags::empty())
    }

    pub fn allocate_zeroed(&self) -> Option<PhysicalAddress> {
        self.allocate_with(AllocFlags::ZERO)
    }

    pub fn allocate_with(&self, flags: AllocFlags) -> Option<PhysicalAddress> {
        let Some(index) = self.pool.pop() else {
            warn!("kalloc: out of frames");
            return None;
        };
        let pa = self.range.address_of(index);

        // The frame is off the pool and not yet counted, so it is ours alone.
        unsafe {
            if let Some(byte) = self.poison.on_alloc {
                self.memory.fill_frame(pa, byte);
            }
            if flags.contains(AllocFlags::ZERO) {
                self.memory.zero_frame(pa);
            }
        }
        if let Err(err) = self.refs.set(index, 1) {
            // The pool only takes indices of its own frames.
            error!("kalloc: popped frame #{}: {}", index, err);
            self.pool.push(index);
            return None;
        }

        trace!("kalloc: alloc frame {:#x}", pa);
        Some(pa)
    }

    /// Like [`FrameAllocator::allocate`], but the frame is released when the
    /// returned tracker is dropped.
    pub fn alloc_tracked(&self) -> Option<FrameTracker<'_, M>> {
        self.allocate().map(|pa| FrameTracker::new(self, pa))
    }

    /// Drops one reference to the frame at `pa`, and returns the frame to
    /// the pool once no reference is left.
    ///
    /// The last release overwrites the frame with the free poison: nobody
    /// may touch it afterwards. A frame whose count already went to zero
    /// through [`FrameAllocator::dec_ref`] is pooled by its next release. A
    /// release of a frame that is already in the pool is absorbed and leaves
    /// the frame untouched.
    pub fn release(&self, pa: PhysicalAddress) -> Result<(), FrameError> {
        let index = self.range.checked_index(pa)?;

        match self.refs.decrement(index)? {
            Some(0) => {
                trace!("kalloc: free frame {:#x}", pa);
                unsafe { self.recycle(pa, index) };
            }
            Some(count) => trace!("kalloc: frame {:#x} still has {} references", pa, count),
            None if self.pool.contains(index) => {
                warn!("kalloc: frame {:#x} released while already free", pa)
            }
            None => {
                trace!("kalloc: free unreferenced frame {:#x}", pa);
                unsafe { self.recycle(pa, index) };
            }
        }
        Ok(())
    }

    /// Adds a sharer to the frame at `index` and returns the new count.
    ///
    /// The allocator does not lock around reference counts. Whoever shares
    /// the frame must hold the lock that protects its mappings, so that the
    /// frame cannot reach zero and be recycled concurrently.
    pub fn inc_ref(&self, index: usize) -> Result<usize, FrameError> {
        let count = self.refs.increment(index)?;
        trace!("kalloc: frame #{} shared, {} references", index, count);
        Ok(count)
    }

    /// Removes a sharer from the frame at `index` without recycling it, and
    /// returns the new count. A count already at zero stays at zero. A frame
    /// left at zero goes back to the pool on its next
    /// [`FrameAllocator::release`].
    ///
    /// Same locking obligation as [`FrameAllocator::inc_ref`].
    pub fn dec_ref(&self, index: usize) -> Result<usize, FrameError> {
        Ok(self.refs.decrement(index)?.unwrap_or(0))
    }

    pub fn ref_count(&self, index: usize) -> Result<usize, FrameError> {
        self.refs.get(index)
    }

    /// [`FrameAllocator::inc_ref`] by address.
    pub fn share(&self, pa: PhysicalAddress) -> Result<usize, FrameError> {
        self.inc_ref(self.range.checked_index(pa)?)
    }

    pub fn ref_count_of(&self, pa: PhysicalAddress) -> Result<usize, FrameError> {
        self.refs.get(self.range.checked_index(pa)?)
    }

    /// Index of the frame at `pa`, unchecked. See [`FrameRange::index_of`].
    pub fn frame_index(&self, pa: PhysicalAddress) -> usize {
        self.range.index_of(pa)
    }

    pub fn checked_index(&self, pa: PhysicalAddress) -> Result<usize, FrameError> {
        self.range.checked_index(pa)
    }

    pub fn frame_address(&self, index: usize) -> Result<PhysicalAddress, FrameError> {
        if index >= self.range.frame_count() {
            return Err(FrameError::InvalidIndex(index));
        }
        Ok(self.range.address_of(index))
    }

    /// Whether the frame at `pa` currently sits in the free pool.
    ///
    /// Takes the pool lock; meant for diagnostics.
    pub fn is_free(&self, pa: PhysicalAddress) -> Result<bool, FrameError> {
        Ok(self.pool.contains(self.range.checked_index(pa)?))
    }

    pub fn contains(&self, pa: PhysicalAddress) -> bool {
        self.range.contains(pa)
    }

    pub fn range(&self) -> FrameRange {
        self.range
    }

    pub fn frame_count(&self) -> usize {
        self.range.frame_count()
    }

    pub fn free_frames(&self) -> usize {
        self.pool.len()
    }

    pub fn poison(&self) -> PoisonConfig {
        self.poison
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }
}
