use core::fmt;

use crate::address::PhysicalAddress;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// The address is not a multiple of the frame size.
    Misaligned(PhysicalAddress),
    /// The address lies outside the managed range.
    OutOfRange(PhysicalAddress),
    /// The frame index is past the end of the reference table.
    InvalidIndex(usize),
    /// The bounds given at initialization invert once aligned.
    InvalidRange {
        start: PhysicalAddress,
        end:   PhysicalAddress,
    },
    AlreadyInitialized,
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Misaligned(pa) => write!(f, "frame address {:#x} is not page aligned", pa),
            FrameError::OutOfRange(pa) => write!(f, "frame address {:#x} is out of range", pa),
            FrameError::InvalidIndex(index) => write!(f, "frame index {} is out of range", index),
            FrameError::InvalidRange { start, end } => {
                write!(f, "invalid frame range {:#x}..{:#x}", start, end)
            }
            FrameError::AlreadyInitialized => write!(f, "frame allocator already initialized"),
        }
    }
}
