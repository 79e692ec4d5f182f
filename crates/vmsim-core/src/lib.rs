//! Core virtual memory simulator types.
//!
//! This crate holds everything the page table, the eviction policies and
//! the simulation driver share: address newtypes, the access kinds found in
//! a trace, the error type, event counters, the per-frame descriptor table,
//! and the traits that connect the components.

mod core;
mod error;
pub mod frame;
mod policy;
mod stats;
mod swap;

pub use self::{
    core::{AccessType, PAGE_MASK, PAGE_SHIFT, PAGE_SIZE, Pfn, SwapSlot, Va, Vpn},
    error::VmsimError,
    frame::{FrameDescriptor, FrameList, FrameTable},
    policy::{EvictionPolicy, PageStatus},
    stats::Stats,
    swap::SwapDevice,
};
