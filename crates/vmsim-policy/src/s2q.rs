//! Simplified 2Q replacement.
//!
//! Pages enter a FIFO probation queue (A1) on their first reference, and
//! are promoted to an LRU main queue (Am) on their second. Pages referenced
//! only once are evicted first, as long as A1 holds more than a tenth of
//! memory.

use vmsim_core::{EvictionPolicy, FrameList, FrameTable, PageStatus, Pfn, Va};

/// Simplified 2Q policy.
///
/// The referenced bit of a resident page is set exactly while its frame is
/// in Am. A linked frame whose page is not referenced is therefore in A1.
#[derive(Debug, Default)]
pub struct SimplifiedTwoQueue {
    /// Probation queue. New frames are pushed to the back, victims are
    /// taken from the front.
    a1: FrameList,

    /// Main queue. The front is the most recently used frame.
    am: FrameList,

    /// Maximum length of A1 before it is preferred for eviction.
    threshold: usize,
}

impl SimplifiedTwoQueue {
    /// Creates a new, uninitialized policy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the probation queue.
    pub fn a1(&self) -> &FrameList {
        &self.a1
    }

    /// Returns the main queue.
    pub fn am(&self) -> &FrameList {
        &self.am
    }

    /// Returns the A1 size threshold.
    pub fn threshold(&self) -> usize {
        self.threshold
    }
}

impl EvictionPolicy for SimplifiedTwoQueue {
    fn name(&self) -> &'static str {
        "s2q"
    }

    fn init(&mut self, frames: &FrameTable) {
        self.a1 = FrameList::new();
        self.am = FrameList::new();
        self.threshold = frames.len() / 10;
    }

    fn evict(&mut self, frames: &mut FrameTable, pages: &mut dyn PageStatus) -> Pfn {
        let victim = if self.a1.len() > self.threshold {
            self.a1.pop_front(frames)
        }
        else {
            self.am.pop_back(frames)
        };

        // With all frames in use one of the queues is always long enough,
        // fall back to the other one only if the caller broke that.
        let victim = victim
            .or_else(|| self.a1.pop_front(frames))
            .or_else(|| self.am.pop_back(frames));

        let Some(pfn) = victim else {
            tracing::error!("no frame is tracked, evicting frame 0");
            return Pfn(0);
        };

        let owner = frames.owner(pfn);
        pages.set_referenced(owner, false);

        tracing::debug!(
            %pfn,
            ?owner,
            a1 = self.a1.len(),
            am = self.am.len(),
            "s2q victim"
        );

        pfn
    }

    fn reference(
        &mut self,
        frames: &mut FrameTable,
        pages: &mut dyn PageStatus,
        pfn: Pfn,
        _va: Va,
    ) {
        let owner = frames.owner(pfn);

        if !frames.is_linked(pfn) {
            self.a1.push_back(frames, pfn);
        }
        else if pages.referenced(owner) {
            self.am.remove(frames, pfn);
            self.am.push_front(frames, pfn);
        }
        else {
            self.a1.remove(frames, pfn);
            self.am.push_front(frames, pfn);
            pages.set_referenced(owner, true);
        }
    }

    fn cleanup(&mut self, frames: &mut FrameTable) {
        self.a1.clear(frames);
        self.am.clear(frames);
    }
}
