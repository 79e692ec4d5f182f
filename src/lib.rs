//! A virtual memory simulator.
//!
//! Memory references are translated through a four-level page table backed
//! by a fixed number of physical frames. When memory is full, a page
//! replacement policy picks the page to evict, and dirty pages are written
//! to a swap device.
//!
//! The functionality is split across several crates:
//!
//! - [`vmsim_core`]: addresses, errors, counters, the frame table and the
//!   traits connecting the components
//! - [`pagetable`]: the page table
//! - [`policy`]: the replacement policies (`clock`, `s2q` features)
//! - [`sim`]: the trace-driven simulation driver (`sim` feature)

pub use vmsim_core::*;
pub use vmsim_pagetable as pagetable;
pub use vmsim_pagetable::{FrameAllocator, PageTable};
pub use vmsim_policy as policy;
pub use vmsim_policy::ReplacementAlgorithm;
#[cfg(feature = "sim")]
pub use vmsim_sim as sim;
#[cfg(feature = "sim")]
pub use vmsim_sim::{SimConfig, Simulator, TraceEvent, TraceReader};
