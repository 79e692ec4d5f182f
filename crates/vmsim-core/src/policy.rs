use crate::{FrameTable, Pfn, Va, Vpn};

/// Status accessors for the page resident in a frame.
///
/// Eviction policies query and update page state only through this trait,
/// never through the page table entries directly. Every query on an absent
/// page (`None`, or a page that has no entry) returns `false`, and every
/// update of an absent page is ignored, so callers never need to check for
/// presence first.
pub trait PageStatus {
    /// Checks if the page is resident.
    fn is_valid(&self, vpn: Option<Vpn>) -> bool;

    /// Checks if the resident copy of the page was modified since it was
    /// last written back.
    fn is_dirty(&self, vpn: Option<Vpn>) -> bool;

    /// Returns the policy-owned referenced bit of the page.
    fn referenced(&self, vpn: Option<Vpn>) -> bool;

    /// Sets the policy-owned referenced bit of the page.
    fn set_referenced(&mut self, vpn: Option<Vpn>, value: bool);
}

/// A page replacement policy.
///
/// A policy decides which frame to give up when physical memory is full.
/// It is told about every access after the translation completed, and keeps
/// whatever ordering state it needs in its own fields and in the linkage
/// nodes of the [`FrameTable`].
pub trait EvictionPolicy {
    /// Returns a short name of the policy.
    fn name(&self) -> &'static str;

    /// Prepares the policy's internal state for a memory of
    /// `frames.len()` frames.
    fn init(&mut self, frames: &FrameTable);

    /// Chooses a victim frame.
    ///
    /// Only called when every frame is in use. The returned frame must no
    /// longer be tracked by the policy, so that it can be handed out again
    /// immediately.
    fn evict(&mut self, frames: &mut FrameTable, pages: &mut dyn PageStatus) -> Pfn;

    /// Records an access to the page resident in `pfn`.
    ///
    /// Called after every successful translation, hit or miss. Must not
    /// alter the valid or dirty state of any page.
    fn reference(&mut self, frames: &mut FrameTable, pages: &mut dyn PageStatus, pfn: Pfn, va: Va);

    /// Releases the policy's internal state.
    fn cleanup(&mut self, frames: &mut FrameTable);
}

impl<T> EvictionPolicy for Box<T>
where
    T: EvictionPolicy + ?Sized,
{
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn init(&mut self, frames: &FrameTable) {
        (**self).init(frames)
    }

    fn evict(&mut self, frames: &mut FrameTable, pages: &mut dyn PageStatus) -> Pfn {
        (**self).evict(frames, pages)
    }

    fn reference(&mut self, frames: &mut FrameTable, pages: &mut dyn PageStatus, pfn: Pfn, va: Va) {
        (**self).reference(frames, pages, pfn, va)
    }

    fn cleanup(&mut self, frames: &mut FrameTable) {
        (**self).cleanup(frames)
    }
}
