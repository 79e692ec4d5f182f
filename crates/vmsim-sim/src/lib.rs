//! Trace-driven virtual memory simulation.
//!
//! A [`Simulator`] owns a [`PageTable`] and a [`FramePool`] and feeds
//! memory references through them:
//!
//! ```no_run
//! # fn main() -> Result<(), vmsim_core::VmsimError> {
//! use vmsim_sim::{SimConfig, Simulator};
//!
//! let config = SimConfig::default()
//!     .with_memsize(128)
//!     .with_algorithm("s2q".parse()?);
//!
//! let mut sim = Simulator::new(config)?;
//! let trace = std::io::BufReader::new(std::fs::File::open("trace.ref")?);
//! sim.run_trace(trace)?;
//!
//! println!("{}", sim.finish()?);
//! # Ok(())
//! # }
//! ```

mod config;
mod pool;
mod swap;
mod trace;

#[cfg(test)]
mod tests;

use std::io::BufRead;

use vmsim_core::{AccessType, Pfn, Stats, SwapDevice, Va, VmsimError};
use vmsim_pagetable::PageTable;

pub use self::{
    config::SimConfig,
    pool::FramePool,
    swap::MemorySwap,
    trace::{TraceEvent, TraceReader, parse_line},
};

/// Runs memory references through a page table backed by a fixed number
/// of frames.
#[derive(Debug)]
pub struct Simulator<Swap = MemorySwap> {
    config: SimConfig,
    table: PageTable,
    pool: FramePool<Swap>,
}

impl Simulator<MemorySwap> {
    /// Creates a simulator with an in-memory swap device of
    /// `config.swapsize` slots.
    pub fn new(config: SimConfig) -> Result<Self, VmsimError> {
        Self::with_swap(config, MemorySwap::new(config.swapsize))
    }
}

impl<Swap> Simulator<Swap>
where
    Swap: SwapDevice,
{
    /// Creates a simulator that evicts pages to `swap`.
    pub fn with_swap(config: SimConfig, swap: Swap) -> Result<Self, VmsimError> {
        config.validate()?;

        let table = PageTable::new()?;
        let pool = FramePool::new(config.memsize, config.algorithm.build(), swap)?;

        tracing::info!(
            memsize = config.memsize,
            swapsize = config.swapsize,
            algorithm = %config.algorithm,
            "simulator created"
        );

        Ok(Self {
            config,
            table,
            pool,
        })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Returns the page table.
    pub fn table(&self) -> &PageTable {
        &self.table
    }

    /// Returns the frame pool.
    pub fn pool(&self) -> &FramePool<Swap> {
        &self.pool
    }

    /// Returns the counters collected so far.
    pub fn stats(&self) -> Stats {
        self.table.stats()
    }

    /// Performs a single memory reference and returns the frame that
    /// served it.
    pub fn access(&mut self, va: Va, access: AccessType) -> Result<Pfn, VmsimError> {
        let pfn = self.table.translate(va, access, &mut self.pool)?;
        self.pool.reference(&mut self.table, pfn, va);
        Ok(pfn)
    }

    /// Performs every reference in `events`.
    pub fn run<I>(&mut self, events: I) -> Result<Stats, VmsimError>
    where
        I: IntoIterator<Item = TraceEvent>,
    {
        for event in events {
            self.access(event.va, event.access)?;
        }

        Ok(self.stats())
    }

    /// Reads a trace and performs every reference in it.
    ///
    /// Stops at the first malformed line.
    pub fn run_trace<R>(&mut self, reader: R) -> Result<Stats, VmsimError>
    where
        R: BufRead,
    {
        for event in TraceReader::new(reader) {
            let event = event?;
            self.access(event.va, event.access)?;
        }

        Ok(self.stats())
    }

    /// Prints every resident page.
    pub fn dump(&self) {
        self.table.dump();
    }

    /// Ends the simulation, releasing the policy state and the page table,
    /// and returns the final counters.
    pub fn finish(mut self) -> Result<Stats, VmsimError> {
        self.pool.cleanup()?;
        self.table.clear();

        let stats = self.table.stats();
        tracing::info!(
            hits = stats.hits,
            misses = stats.misses,
            references = stats.references,
            evict_clean = stats.evict_clean,
            evict_dirty = stats.evict_dirty,
            "simulation finished"
        );

        Ok(stats)
    }
}
