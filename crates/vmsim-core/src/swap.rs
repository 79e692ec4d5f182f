use crate::{Pfn, SwapSlot, VmsimError};

/// A backing store for evicted pages.
pub trait SwapDevice {
    /// Writes the contents of `pfn` out to swap.
    ///
    /// If the page already has a location on swap (`prior`), the device may
    /// reuse it. Returns the location the page was written to, or `None` if
    /// the device is exhausted.
    fn write_page(&mut self, pfn: Pfn, prior: Option<SwapSlot>) -> Option<SwapSlot>;

    /// Reads the page stored at `slot` into `pfn`.
    fn read_page(&mut self, pfn: Pfn, slot: SwapSlot) -> Result<(), VmsimError>;
}
