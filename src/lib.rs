//! Physical frame allocator for the kernel. Hands out whole 4096-byte
//! frames for user processes, kernel stacks, page-table pages and pipe
//! buffers, and counts how many mappings share each frame so copy-on-write
//! pages are freed only by their last user.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod address;
pub mod allocator;
pub mod config;
pub mod error;
mod free_pool;
pub mod global;
pub mod memory;
mod ref_table;
pub mod tracker;

pub use address::{FrameRange, PhysicalAddress};
pub use allocator::{AllocFlags, FrameAllocator};
pub use config::{PoisonConfig, ALLOC_JUNK, FREE_JUNK, PAGE_SIZE};
pub use error::FrameError;
pub use global::{kalloc, kfree, kinit, kmem};
pub use memory::{DirectMap, PhysMemory};
pub use tracker::FrameTracker;
