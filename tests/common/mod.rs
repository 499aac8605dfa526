use std::cell::UnsafeCell;

use kalloc::{FrameAllocator, PhysMemory, PhysicalAddress, PoisonConfig, PAGE_SIZE};
use log::LevelFilter;

/// Where test arenas pretend RAM starts, right past a kernel image.
pub const KERNEL_END: PhysicalAddress = 0x8020_0000;

pub fn init_test_logger() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(LevelFilter::Debug)
        .try_init();
}

/// Host memory standing in for a run of physical frames at `base`.
pub struct Arena {
    base:   PhysicalAddress,
    frames: Box<[UnsafeCell<[u8; PAGE_SIZE]>]>,
}

// Frames are only written by whoever owns them, like real RAM.
unsafe impl Sync for Arena {}

impl Arena {
    pub fn new(base: PhysicalAddress, frames: usize) -> Self {
        let frames: Vec<_> = (0..frames)
            .map(|_| UnsafeCell::new([0u8; PAGE_SIZE]))
            .collect();
        Self {
            base,
            frames: frames.into_boxed_slice(),
        }
    }

    pub fn end(&self) -> PhysicalAddress {
        self.base + self.frames.len() * PAGE_SIZE
    }

    fn cell(&self, pa: PhysicalAddress) -> &UnsafeCell<[u8; PAGE_SIZE]> {
        assert!(pa >= self.base && pa < self.end(), "{:#x} is outside the arena", pa);
        &self.frames[(pa - self.base) / PAGE_SIZE]
    }

    pub fn bytes(&self, pa: PhysicalAddress) -> &[u8; PAGE_SIZE] {
        unsafe { &*self.cell(pa).get() }
    }

    /// # Safety
    ///
    /// The caller must own the frame at `pa`.
    pub unsafe fn bytes_mut(&self, pa: PhysicalAddress) -> &mut [u8; PAGE_SIZE] {
        &mut *self.cell(pa).get()
    }

    pub fn is_filled_with(&self, pa: PhysicalAddress, byte: u8) -> bool {
        self.bytes(pa).iter().all(|&b| b == byte)
    }
}

impl PhysMemory for Arena {
    fn translate(&self, pa: PhysicalAddress) -> *mut u8 {
        self.cell(pa).get() as *mut u8
    }
}

/// An allocator over exactly `frames` frames starting at [`KERNEL_END`].
pub fn kmem(frames: usize) -> FrameAllocator<Arena> {
    kmem_with(frames, PoisonConfig::default())
}

pub fn kmem_with(frames: usize, poison: PoisonConfig) -> FrameAllocator<Arena> {
    init_test_logger();

    let arena = Arena::new(KERNEL_END, frames);
    let end = arena.end();
    unsafe { FrameAllocator::with_config(KERNEL_END, end, arena, poison).unwrap() }
}
