use super::macros::newtype;

newtype!(address Va(u64), "A virtual address.");
newtype!(address Vpn(u64), "A virtual page number.");
newtype!(address SwapSlot(u64), "A location on the swap device, as a byte offset.");
newtype!(index Pfn(usize), "A physical frame number.");

/// The size of a page (and of a frame) in bytes.
pub const PAGE_SIZE: u64 = 0x1000;

/// The number of bits to shift when converting between page numbers and
/// addresses.
pub const PAGE_SHIFT: u64 = 12;

/// A bitmask used to isolate the page number from a full address.
pub const PAGE_MASK: u64 = !(PAGE_SIZE - 1);

impl Va {
    /// Returns the virtual page number containing this address.
    pub fn vpn(self) -> Vpn {
        Vpn(self.0 >> PAGE_SHIFT)
    }

    /// Returns the offset of this address within its page.
    pub fn offset(self) -> u64 {
        self.0 & !PAGE_MASK
    }

    /// Aligns the address down to the start of its page.
    pub fn align_down(self) -> Va {
        self & PAGE_MASK
    }
}

impl Vpn {
    /// Returns the virtual address of the first byte of this page.
    pub fn va(self) -> Va {
        Va(self.0 << PAGE_SHIFT)
    }
}

impl SwapSlot {
    /// Returns the swap location of the `index`-th page-sized slot.
    pub fn from_index(index: u64) -> Self {
        Self(index * PAGE_SIZE)
    }

    /// Returns the slot index of this swap location.
    pub fn slot_index(self) -> u64 {
        self.0 / PAGE_SIZE
    }
}

impl From<Va> for Vpn {
    fn from(value: Va) -> Self {
        value.vpn()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_number_and_offset() {
        let va = Va(0x7fff_1234_5678);
        assert_eq!(va.vpn(), Vpn(0x7fff_1234_5));
        assert_eq!(va.offset(), 0x678);
        assert_eq!(va.align_down(), Va(0x7fff_1234_5000));
        assert_eq!(va.vpn().va() + va.offset(), va);
    }

    #[test]
    fn swap_slot_offsets() {
        assert_eq!(SwapSlot::from_index(3), SwapSlot(0x3000));
        assert_eq!(SwapSlot(0x3000).slot_index(), 3);
    }

    #[test]
    fn formatting() {
        assert_eq!(Va(0x1000).to_string(), "0x1000");
        assert_eq!(format!("{:?}", Pfn(7)), "Pfn(7)");
        assert_eq!(Pfn(7).to_string(), "7");
    }
}
