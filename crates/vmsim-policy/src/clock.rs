//! CLOCK (second chance) replacement.

use vmsim_core::{EvictionPolicy, FrameTable, PageStatus, Pfn, Va};

/// Sweeps the frames in a circle, giving every referenced page a second
/// chance before evicting it.
///
/// The referenced bit of a page is set on every access and cleared when
/// the hand passes over it. The first frame found with a clear bit is the
/// victim, and the hand stops just past it.
#[derive(Debug, Default)]
pub struct Clock {
    hand: usize,
}

impl Clock {
    /// Creates a new CLOCK policy with the hand at frame 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the frame the next sweep starts at.
    pub fn hand(&self) -> Pfn {
        Pfn(self.hand)
    }
}

impl EvictionPolicy for Clock {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn init(&mut self, _frames: &FrameTable) {
        self.hand = 0;
    }

    fn evict(&mut self, frames: &mut FrameTable, pages: &mut dyn PageStatus) -> Pfn {
        let memsize = frames.len();

        // Terminates within two full sweeps: the first one clears every bit.
        loop {
            let pfn = Pfn(self.hand % memsize);
            self.hand = (pfn.index() + 1) % memsize;

            let owner = frames.owner(pfn);
            if !pages.referenced(owner) {
                tracing::debug!(%pfn, ?owner, hand = self.hand, "clock victim");
                return pfn;
            }

            pages.set_referenced(owner, false);
        }
    }

    fn reference(
        &mut self,
        frames: &mut FrameTable,
        pages: &mut dyn PageStatus,
        pfn: Pfn,
        _va: Va,
    ) {
        pages.set_referenced(frames.owner(pfn), true);
    }

    fn cleanup(&mut self, _frames: &mut FrameTable) {
        self.hand = 0;
    }
}
