use vmsim_core::{PAGE_SHIFT, Pfn, SwapSlot, Va};

/// Number of entries in every page table level.
pub const ENTRIES_PER_LEVEL: usize = 512;

/// Number of virtual address bits consumed by each level.
const INDEX_BITS: u64 = 9;
const INDEX_MASK: u64 = (1 << INDEX_BITS) - 1;

/// The levels in the page table hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum PageTableLevel {
    /// Page Table (PT) - the lowest level, holding the page mappings.
    Pt,

    /// Page Directory (PD) - points to PTs.
    Pd,

    /// Page Directory Pointer Table (PDPT) - points to PDs.
    Pdpt,

    /// Page Map Level 4 (PML4) - the root of the hierarchy.
    Pml4,
}

impl PageTableLevel {
    /// The non-leaf levels, in walk order.
    pub const DIRECTORIES: [Self; 3] = [Self::Pml4, Self::Pdpt, Self::Pd];

    /// All levels, in walk order.
    pub const ALL: [Self; 4] = [Self::Pml4, Self::Pdpt, Self::Pd, Self::Pt];

    /// Returns the next lower level in the page table hierarchy.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Pt => None,
            Self::Pd => Some(Self::Pt),
            Self::Pdpt => Some(Self::Pd),
            Self::Pml4 => Some(Self::Pdpt),
        }
    }

    /// Returns the next higher level in the page table hierarchy.
    pub fn previous(self) -> Option<Self> {
        match self {
            Self::Pt => Some(Self::Pd),
            Self::Pd => Some(Self::Pdpt),
            Self::Pdpt => Some(Self::Pml4),
            Self::Pml4 => None,
        }
    }

    /// Returns the depth of the level, 1 for the root and 4 for the leaf.
    pub fn depth(self) -> usize {
        match self {
            Self::Pml4 => 1,
            Self::Pdpt => 2,
            Self::Pd => 3,
            Self::Pt => 4,
        }
    }

    /// Checks if entries at this level describe pages rather than tables.
    pub fn is_leaf(self) -> bool {
        self == Self::Pt
    }

    fn shift(self) -> u64 {
        match self {
            Self::Pt => PAGE_SHIFT,
            Self::Pd => PAGE_SHIFT + INDEX_BITS,
            Self::Pdpt => PAGE_SHIFT + 2 * INDEX_BITS,
            Self::Pml4 => PAGE_SHIFT + 3 * INDEX_BITS,
        }
    }
}

/// Returns the index of the entry selected by `va` at the given level.
///
/// | level | bits      |
/// |-------|-----------|
/// | PML4  | `[47:39]` |
/// | PDPT  | `[38:30]` |
/// | PD    | `[29:21]` |
/// | PT    | `[20:12]` |
pub fn va_index_for(va: Va, level: PageTableLevel) -> usize {
    ((va.0 >> level.shift()) & INDEX_MASK) as usize
}

/// Splits `va` into its four level indices (root first) and page offset.
pub fn decompose(va: Va) -> ([usize; 4], u64) {
    (
        PageTableLevel::ALL.map(|level| va_index_for(va, level)),
        va.offset(),
    )
}

/// Builds a virtual address from four level indices (root first) and a
/// page offset. Inverse of [`decompose`] for canonical lower-half addresses.
pub fn compose(indices: [usize; 4], offset: u64) -> Va {
    let va = PageTableLevel::ALL
        .iter()
        .zip(indices)
        .fold(0, |va, (level, index)| {
            va | ((index as u64 & INDEX_MASK) << level.shift())
        });

    Va(va | (offset & ((1 << PAGE_SHIFT) - 1)))
}

bitflags::bitflags! {
    /// Status bits of a leaf page table entry.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntryFlags: u8 {
        /// The page is resident in its frame.
        const VALID = 0b001;

        /// The resident copy differs from the copy on swap.
        const DIRTY = 0b010;

        /// Owned by the eviction policy. CLOCK uses it as the second-chance
        /// bit, simplified 2Q uses it to mark membership of the Am queue.
        const REFERENCED = 0b100;
    }
}

/// A leaf page table entry, describing one virtual page.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageTableEntry {
    pub(crate) frame: Option<Pfn>,
    pub(crate) swap: Option<SwapSlot>,
    pub(crate) flags: EntryFlags,
}

impl PageTableEntry {
    /// Returns the frame holding the page, if resident.
    pub fn frame(&self) -> Option<Pfn> {
        self.frame
    }

    /// Returns the location of the last written-back copy of the page.
    pub fn swap(&self) -> Option<SwapSlot> {
        self.swap
    }

    /// Returns the status bits.
    pub fn flags(&self) -> EntryFlags {
        self.flags
    }

    /// Checks if the page is resident.
    pub fn valid(&self) -> bool {
        self.flags.contains(EntryFlags::VALID)
    }

    /// Checks if the page was modified since it was last written back.
    pub fn dirty(&self) -> bool {
        self.flags.contains(EntryFlags::DIRTY)
    }

    /// Checks the policy-owned referenced bit.
    pub fn referenced(&self) -> bool {
        self.flags.contains(EntryFlags::REFERENCED)
    }

    /// Checks if the page has never been brought into memory (or its swap
    /// copy was lost).
    pub fn is_first_touch(&self) -> bool {
        !self.valid() && self.swap.is_none()
    }
}

impl std::fmt::Display for PageTableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let frame = self.frame.map_or(-1, |pfn| pfn.index() as i64);
        let swap = self.swap.map_or(-1, |slot| slot.0 as i64);

        write!(
            f,
            "Frame: {}, Swap: {}, Valid: {}, Dirty: {}, Referenced: {}",
            frame,
            swap,
            u8::from(self.valid()),
            u8::from(self.dirty()),
            u8::from(self.referenced()),
        )
    }
}
