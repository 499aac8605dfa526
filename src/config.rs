/// The size of a physical frame.
pub const PAGE_SIZE: usize = 4096; // 4K

/// Bits of offset within a frame.
pub const PG_SHIFT: usize = 12;

/// Byte written over a frame when it is handed out.
pub const ALLOC_JUNK: u8 = 5;

/// Byte written over a frame when it goes back to the free pool.
pub const FREE_JUNK: u8 = 1;

/// Junk fills applied to frame contents on allocation and release.
///
/// The fills catch reads of uninitialized or stale memory while debugging.
/// They are not a security measure: frames are not scrubbed with zeros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoisonConfig {
    pub on_alloc: Option<u8>,
    pub on_free:  Option<u8>,
}

impl PoisonConfig {
    /// Leaves frame contents untouched on both paths.
    pub const NONE: Self = Self {
        on_alloc: None,
        on_free:  None,
    };

    pub const fn new(on_alloc: Option<u8>, on_free: Option<u8>) -> Self {
        Self { on_alloc, on_free }
    }

    /// Whether an allocated frame and a freed frame can be told apart by
    /// their contents.
    pub fn is_distinguishable(&self) -> bool {
        match (self.on_alloc, self.on_free) {
            (Some(a), Some(f)) => a != f,
            _ => true,
        }
    }
}

impl Default for PoisonConfig {
    fn default() -> Self {
        Self::new(Some(ALLOC_JUNK), Some(FREE_JUNK))
    }
}
