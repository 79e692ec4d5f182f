use vmsim_core::{PAGE_SIZE, Pfn, SwapDevice, SwapSlot, VmsimError};

/// A swap device that only tracks which slots are in use.
///
/// Page contents are never stored, only the slot bookkeeping and the
/// number of transfers.
#[derive(Debug)]
pub struct MemorySwap {
    used: Vec<bool>,
    writes: usize,
    reads: usize,
}

impl MemorySwap {
    /// Creates a swap device with `capacity` page-sized slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            used: vec![false; capacity],
            writes: 0,
            reads: 0,
        }
    }

    /// Returns the number of slots.
    pub fn capacity(&self) -> usize {
        self.used.len()
    }

    /// Returns the number of slots holding a page.
    pub fn used(&self) -> usize {
        self.used.iter().filter(|used| **used).count()
    }

    /// Returns the number of pages written out.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Returns the number of pages read back.
    pub fn reads(&self) -> usize {
        self.reads
    }

    fn slot_in_use(&self, slot: SwapSlot) -> bool {
        slot.0 % PAGE_SIZE == 0
            && usize::try_from(slot.slot_index())
                .ok()
                .and_then(|index| self.used.get(index))
                .copied()
                .unwrap_or(false)
    }
}

impl SwapDevice for MemorySwap {
    fn write_page(&mut self, pfn: Pfn, prior: Option<SwapSlot>) -> Option<SwapSlot> {
        let slot = match prior {
            Some(slot) if self.slot_in_use(slot) => slot,
            _ => {
                let index = self.used.iter().position(|used| !used)?;
                self.used[index] = true;
                SwapSlot::from_index(index as u64)
            }
        };

        self.writes += 1;
        tracing::trace!(%pfn, %slot, "swap out");
        Some(slot)
    }

    fn read_page(&mut self, pfn: Pfn, slot: SwapSlot) -> Result<(), VmsimError> {
        if !self.slot_in_use(slot) {
            return Err(VmsimError::InvalidSwapSlot(slot));
        }

        self.reads += 1;
        tracing::trace!(%pfn, %slot, "swap in");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_claimed_lowest_first() {
        let mut swap = MemorySwap::new(2);

        assert_eq!(swap.write_page(Pfn(0), None), Some(SwapSlot(0)));
        assert_eq!(swap.write_page(Pfn(1), None), Some(SwapSlot(PAGE_SIZE)));
        assert_eq!(swap.write_page(Pfn(2), None), None);
        assert_eq!(swap.used(), 2);
        assert_eq!(swap.writes(), 2);
    }

    #[test]
    fn prior_slot_is_reused() {
        let mut swap = MemorySwap::new(1);

        let slot = swap.write_page(Pfn(0), None);
        assert_eq!(swap.write_page(Pfn(3), slot), slot);
        assert_eq!(swap.used(), 1);
        assert_eq!(swap.writes(), 2);
    }

    #[test]
    fn reading_unwritten_slot_fails() -> Result<(), VmsimError> {
        let mut swap = MemorySwap::new(4);

        assert!(matches!(
            swap.read_page(Pfn(0), SwapSlot(0)),
            Err(VmsimError::InvalidSwapSlot(SwapSlot(0)))
        ));
        assert!(swap.read_page(Pfn(0), SwapSlot(0x10_0000)).is_err());

        let slot = swap.write_page(Pfn(0), None).ok_or(VmsimError::Other("full"))?;
        swap.read_page(Pfn(1), slot)?;
        assert!(swap.read_page(Pfn(1), SwapSlot(slot.0 + 1)).is_err());
        assert_eq!(swap.reads(), 1);

        Ok(())
    }
}
