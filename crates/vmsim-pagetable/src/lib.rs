//! Four-level page table.
//!
//! The table is a radix tree of 512-entry levels (PML4, PDPT, PD, PT)
//! indexed by 9-bit slices of the virtual address, with a 12-bit page
//! offset. Only the root exists initially; lower levels are materialized
//! the first time an address below them is translated.
//!
//! Leaf entries move through three states:
//!
//! - **untouched**: not valid, no swap location. The next translation
//!   zero-fills a fresh frame and marks the page dirty.
//! - **resident**: valid, with a frame.
//! - **swapped out**: not valid, with a swap location. The next
//!   translation reads the page back from swap.
//!
//! Frames are obtained from a [`FrameAllocator`], which may in turn ask an
//! eviction policy for a victim and call [`PageTable::evict`] on it.

mod paging;
mod translation;


use vmsim_core::{AccessType, PageStatus, Pfn, Stats, SwapDevice, SwapSlot, Va, VmsimError, Vpn};

pub use self::{
    paging::{
        ENTRIES_PER_LEVEL, EntryFlags, PageTableEntry, PageTableLevel, compose, decompose,
        va_index_for,
    },
    translation::{TranslationEntries, TranslationEntry, VaTranslation},
};

/// Supplies physical frames to the page table.
pub trait FrameAllocator {
    /// Returns a frame for the page `vpn`, which is about to become
    /// resident.
    ///
    /// If no frame is free, the allocator must pick a victim and evict it
    /// from `table` with [`PageTable::evict`] before handing its frame out.
    fn allocate_frame(&mut self, table: &mut PageTable, vpn: Vpn) -> Result<Pfn, VmsimError>;

    /// Fills the frame with zeros.
    fn init_frame(&mut self, pfn: Pfn);

    /// Loads the page stored at `slot` into the frame.
    fn swap_in(&mut self, pfn: Pfn, slot: SwapSlot) -> Result<(), VmsimError>;

    /// Takes back a frame returned by [`allocate_frame`] whose page could
    /// not be loaded. The frame must become free again.
    ///
    /// [`allocate_frame`]: Self::allocate_frame
    fn release_frame(&mut self, pfn: Pfn);
}

enum Node {
    Directory(Vec<Option<Box<Node>>>),
    Table(Vec<PageTableEntry>),
}

impl Node {
    fn new(level: PageTableLevel) -> Result<Self, VmsimError> {
        if level.is_leaf() {
            let mut entries = Vec::new();
            entries
                .try_reserve_exact(ENTRIES_PER_LEVEL)
                .map_err(|_| VmsimError::OutOfMemory)?;
            entries.resize(ENTRIES_PER_LEVEL, PageTableEntry::default());
            Ok(Self::Table(entries))
        }
        else {
            let mut children = Vec::new();
            children
                .try_reserve_exact(ENTRIES_PER_LEVEL)
                .map_err(|_| VmsimError::OutOfMemory)?;
            children.resize_with(ENTRIES_PER_LEVEL, || None);
            Ok(Self::Directory(children))
        }
    }

    fn entry(&self, va: Va) -> Option<&PageTableEntry> {
        let mut node = self;
        for level in PageTableLevel::DIRECTORIES {
            let Self::Directory(children) = node else {
                return None;
            };

            node = children[va_index_for(va, level)].as_deref()?;
        }

        let Self::Table(entries) = node else {
            return None;
        };

        entries.get(va_index_for(va, PageTableLevel::Pt))
    }

    fn entry_mut(&mut self, va: Va) -> Option<&mut PageTableEntry> {
        let mut node = self;
        for level in PageTableLevel::DIRECTORIES {
            let Self::Directory(children) = node else {
                return None;
            };

            node = children[va_index_for(va, level)].as_deref_mut()?;
        }

        let Self::Table(entries) = node else {
            return None;
        };

        entries.get_mut(va_index_for(va, PageTableLevel::Pt))
    }

    /// Walks to the leaf entry of `va`, materializing missing levels.
    fn entry_or_insert(
        &mut self,
        va: Va,
        levels: &mut usize,
    ) -> Result<&mut PageTableEntry, VmsimError> {
        let mut node = self;
        for level in PageTableLevel::DIRECTORIES {
            let Self::Directory(children) = node else {
                return Err(VmsimError::Other("leaf level found above the PT"));
            };

            let index = va_index_for(va, level);
            let slot = &mut children[index];
            node = match slot {
                Some(child) => child.as_mut(),
                None => {
                    let child_level = level.next().unwrap_or(PageTableLevel::Pt);
                    let child = slot.insert(Box::new(Self::new(child_level)?));

                    *levels += 1;
                    tracing::debug!(%va, ?child_level, index, "materialized page table level");
                    child.as_mut()
                }
            };
        }

        let Self::Table(entries) = node else {
            return Err(VmsimError::Other("directory level found at the PT"));
        };

        Ok(&mut entries[va_index_for(va, PageTableLevel::Pt)])
    }

    /// Collects the leaf entries that are resident or on swap.
    fn collect(&self, prefix: u64, result: &mut Vec<(Vpn, PageTableEntry)>) {
        match self {
            Self::Directory(children) => {
                for (index, child) in children.iter().enumerate() {
                    if let Some(child) = child {
                        child.collect((prefix << 9) | index as u64, result);
                    }
                }
            }
            Self::Table(entries) => {
                for (index, entry) in entries.iter().enumerate() {
                    if entry.valid() || entry.swap.is_some() {
                        result.push((Vpn((prefix << 9) | index as u64), *entry));
                    }
                }
            }
        }
    }

    /// Releases all child levels, deepest first. Returns the number of
    /// levels released, not counting `self`.
    fn release_children(&mut self) -> usize {
        let Self::Directory(children) = self else {
            return 0;
        };

        let mut released = 0;
        for slot in children.iter_mut() {
            if let Some(mut child) = slot.take() {
                released += child.release_children() + 1;
                drop(child);
            }
        }

        released
    }
}

/// A single address space's page table, with its event counters.
pub struct PageTable {
    root: Node,
    levels: usize,
    stats: Stats,
}

impl PageTable {
    /// Creates a page table with an empty root level and zeroed counters.
    pub fn new() -> Result<Self, VmsimError> {
        Ok(Self {
            root: Node::new(PageTableLevel::Pml4)?,
            levels: 1,
            stats: Stats::default(),
        })
    }

    /// Returns the event counters.
    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// Resets the event counters to zero.
    pub fn reset_stats(&mut self) {
        self.stats = Stats::default();
    }

    /// Returns the number of levels currently allocated, including the
    /// root.
    pub fn materialized_levels(&self) -> usize {
        self.levels
    }

    /// Translates `va` to the frame holding its page, bringing the page
    /// into memory if needed.
    ///
    /// The first translation of a page always leaves it dirty, whatever the
    /// access type. Stores and modifies mark the page dirty. The referenced
    /// bit is left alone: the caller notifies the eviction policy once this
    /// returns.
    ///
    /// If the page cannot be read back from swap, its frame is handed back
    /// with [`FrameAllocator::release_frame`] and the entry is left as it
    /// was.
    pub fn translate<Allocator>(
        &mut self,
        va: Va,
        access: AccessType,
        frames: &mut Allocator,
    ) -> Result<Pfn, VmsimError>
    where
        Allocator: FrameAllocator + ?Sized,
    {
        let vpn = va.vpn();
        let entry = *self.root.entry_or_insert(va, &mut self.levels)?;

        let (pfn, hit) = match entry.frame {
            Some(pfn) if entry.valid() => {
                self.stats.hits += 1;
                (pfn, true)
            }
            _ => {
                let pfn = frames.allocate_frame(self, vpn)?;
                match entry.swap {
                    None => frames.init_frame(pfn),
                    Some(slot) => {
                        if let Err(err) = frames.swap_in(pfn, slot) {
                            tracing::warn!(%vpn, %pfn, %slot, %err, "swap in failed");
                            frames.release_frame(pfn);
                            return Err(err);
                        }
                    }
                }

                self.stats.misses += 1;
                (pfn, false)
            }
        };

        // The walk is repeated because allocating may have evicted other
        // pages. Levels are never released during a simulation, so this
        // does not allocate.
        let entry = self.root.entry_or_insert(va, &mut self.levels)?;
        if !hit {
            if entry.swap.is_none() {
                entry.flags.insert(EntryFlags::DIRTY);
            }

            entry.frame = Some(pfn);
            entry.flags.insert(EntryFlags::VALID);
        }

        if access.is_write() {
            entry.flags.insert(EntryFlags::DIRTY);
        }

        self.stats.references += 1;

        tracing::trace!(%va, %vpn, %pfn, %access, hit, "translated");
        Ok(pfn)
    }

    /// Evicts the page `vpn` from its frame.
    ///
    /// A dirty page is written to `swap` first and its new swap location
    /// recorded. A clean page keeps its previous swap location, which still
    /// holds an up-to-date copy. Either way the page stops being resident.
    ///
    /// If the swap device is exhausted the page is left without a swap
    /// location, so its next translation starts over from a zeroed frame.
    pub fn evict<Swap>(&mut self, vpn: Vpn, swap: &mut Swap)
    where
        Swap: SwapDevice + ?Sized,
    {
        let Some(entry) = self.root.entry_mut(vpn.va()) else {
            tracing::warn!(%vpn, "evicting a page without a page table entry");
            return;
        };

        let pfn = match entry.frame {
            Some(pfn) if entry.valid() => pfn,
            _ => {
                tracing::warn!(%vpn, "evicting a page that is not resident");
                return;
            }
        };

        let dirty = entry.dirty();
        if dirty {
            let slot = swap.write_page(pfn, entry.swap);
            if slot.is_none() {
                tracing::warn!(%vpn, %pfn, "swap exhausted, dropping page contents");
            }

            entry.swap = slot;
            entry.flags.remove(EntryFlags::DIRTY);
            self.stats.evict_dirty += 1;
        }
        else {
            self.stats.evict_clean += 1;
        }

        entry.frame = None;
        entry.flags.remove(EntryFlags::VALID);

        tracing::debug!(%vpn, %pfn, dirty, swap = ?entry.swap, "evicted page");
    }

    /// Returns the leaf entry of `vpn`, if its level is materialized.
    pub fn entry(&self, vpn: Vpn) -> Option<&PageTableEntry> {
        self.root.entry(vpn.va())
    }

    /// Walks the table for `va` without materializing anything.
    pub fn lookup(&self, va: Va) -> VaTranslation {
        let mut entries = TranslationEntries::new();
        let mut node = &self.root;

        for level in PageTableLevel::DIRECTORIES {
            let Node::Directory(children) = node else {
                break;
            };

            let index = va_index_for(va, level);
            let child = children[index].as_deref();
            entries.push(TranslationEntry {
                level,
                index,
                present: child.is_some(),
            });

            match child {
                Some(child) => node = child,
                None => {
                    return VaTranslation {
                        entries,
                        frame: None,
                    };
                }
            }
        }

        let mut frame = None;
        if let Node::Table(table) = node {
            let index = va_index_for(va, PageTableLevel::Pt);
            let entry = &table[index];
            entries.push(TranslationEntry {
                level: PageTableLevel::Pt,
                index,
                present: entry.valid(),
            });

            if entry.valid() {
                frame = entry.frame;
            }
        }

        VaTranslation { entries, frame }
    }

    /// Returns every page that is resident or has a copy on swap, in
    /// ascending page order.
    pub fn entries(&self) -> Vec<(Vpn, PageTableEntry)> {
        let mut result = Vec::new();
        self.root.collect(0, &mut result);
        result
    }

    /// Prints every resident page.
    pub fn dump(&self) {
        println!("Page Table:");
        for (vpn, entry) in self.entries() {
            if entry.valid() {
                println!("  {vpn}: {entry}");
            }
        }
    }

    /// Releases every level below the root.
    ///
    /// Counters are kept. All pages become untouched, so this is only
    /// meaningful at the end of a simulation, once no frame refers to the
    /// table anymore.
    pub fn clear(&mut self) {
        let released = self.root.release_children();
        self.levels -= released;

        tracing::debug!(released, "released page table levels");
    }

    fn flags(&self, vpn: Option<Vpn>) -> EntryFlags {
        vpn.and_then(|vpn| self.entry(vpn))
            .map(PageTableEntry::flags)
            .unwrap_or_default()
    }
}

impl PageStatus for PageTable {
    fn is_valid(&self, vpn: Option<Vpn>) -> bool {
        self.flags(vpn).contains(EntryFlags::VALID)
    }

    fn is_dirty(&self, vpn: Option<Vpn>) -> bool {
        self.flags(vpn).contains(EntryFlags::DIRTY)
    }

    fn referenced(&self, vpn: Option<Vpn>) -> bool {
        self.flags(vpn).contains(EntryFlags::REFERENCED)
    }

    fn set_referenced(&mut self, vpn: Option<Vpn>, value: bool) {
        let Some(vpn) = vpn else {
            return;
        };

        if let Some(entry) = self.root.entry_mut(vpn.va()) {
            entry.flags.set(EntryFlags::REFERENCED, value);
        }
    }
}

impl std::fmt::Debug for PageTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PageTable")
            .field("levels", &self.levels)
            .field("stats", &self.stats)
            .finish()
    }
}
