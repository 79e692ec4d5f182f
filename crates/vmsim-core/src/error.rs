use crate::{Pfn, SwapSlot};

/// An error that can occur while simulating virtual memory.
#[derive(thiserror::Error, Debug)]
pub enum VmsimError {
    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A page table level could not be allocated.
    #[error("Out of memory while allocating a page table level")]
    OutOfMemory,

    /// The swap device holds no page at the given location.
    #[error("Invalid swap slot {0}")]
    InvalidSwapSlot(SwapSlot),

    /// The given frame number is outside of physical memory.
    #[error("Frame {0} is out of range")]
    FrameOutOfRange(Pfn),

    /// The trace contains an unknown access type.
    #[error("Invalid access type '{0}'")]
    InvalidAccessType(char),

    /// A trace line could not be parsed.
    #[error("Invalid trace at line {line}: {reason}")]
    InvalidTrace {
        /// The 1-based line number.
        line: usize,

        /// What was wrong with the line.
        reason: &'static str,
    },

    /// Physical memory must hold at least one frame.
    #[error("Invalid memory size")]
    InvalidMemorySize,

    /// Other error.
    #[error("{0}")]
    Other(&'static str),
}
