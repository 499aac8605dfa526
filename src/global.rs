//! The kernel-wide frame allocator.
//!
//! Boot code calls [`kinit`] once with the end of the kernel image and the
//! top of RAM. Everything else in the kernel then uses [`kalloc`] and
//! [`kfree`].

use log::info;
use spin::Once;

use crate::{
    address::PhysicalAddress,
    allocator::FrameAllocator,
    error::FrameError,
    memory::DirectMap,
};

static KMEM: Once<FrameAllocator<DirectMap>> = Once::new();

/// Sets up the kernel allocator over identity-mapped RAM.
///
/// # Safety
///
/// Every frame between `kernel_end` and `mem_end` must be unused RAM,
/// mapped one to one.
pub unsafe fn kinit(kernel_end: PhysicalAddress, mem_end: PhysicalAddress) -> Result<(), FrameError> {
    kinit_with(kernel_end, mem_end, DirectMap::IDENTITY)
}

/// # Safety
///
/// Same as [`kinit`], with RAM visible through `map` instead.
pub unsafe fn kinit_with(
    kernel_end: PhysicalAddress,
    mem_end: PhysicalAddress,
    map: DirectMap,
) -> Result<(), FrameError> {
    if KMEM.is_completed() {
        return Err(FrameError::AlreadyInitialized);
    }
    let mut fresh = false;
    KMEM.try_call_once(|| {
        fresh = true;
        FrameAllocator::new(kernel_end, mem_end, map)
    })?;
    // Lost a race with another kinit: our range was never used.
    if !fresh {
        return Err(FrameError::AlreadyInitialized);
    }

    info!("kalloc: kernel allocator ready");
    Ok(())
}

pub fn kmem() -> Option<&'static FrameAllocator<DirectMap>> {
    KMEM.get()
}

/// Allocates one frame, or returns `None` when memory is exhausted or the
/// allocator has not been set up yet.
pub fn kalloc() -> Option<PhysicalAddress> {
    KMEM.get()?.allocate()
}

/// Releases one reference to the frame at `pa`.
///
/// Panics on an address the allocator does not own: a bad free means the
/// caller's bookkeeping is already corrupt.
pub fn kfree(pa: PhysicalAddress) {
    let Some(kmem) = KMEM.get() else {
        panic!("kfree: allocator not initialized");
    };
    if let Err(err) = kmem.release(pa) {
        panic!("kfree: {}", err);
    }
}
