use smallvec::SmallVec;
use vmsim_core::Pfn;

use super::PageTableLevel;

/// A single step of a read-only page table walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslationEntry {
    /// The level of the page table hierarchy this entry belongs to.
    pub level: PageTableLevel,

    /// The index of the entry within its level.
    pub index: usize,

    /// Whether the entry was present: a materialized child level for
    /// directory entries, a resident page for leaf entries.
    pub present: bool,
}

/// Collection of translation entries, typically used in page table walks.
pub type TranslationEntries = SmallVec<[TranslationEntry; 4]>;

/// The result of a read-only walk of the page table.
///
/// The walk stops at the first entry that is not present.
#[derive(Debug)]
pub struct VaTranslation {
    pub(super) entries: TranslationEntries,
    pub(super) frame: Option<Pfn>,
}

impl VaTranslation {
    /// Returns the page table entries traversed during the walk.
    pub fn entries(&self) -> &[TranslationEntry] {
        &self.entries
    }

    /// Consumes the `VaTranslation` and returns the `TranslationEntries`.
    pub fn into_entries(self) -> TranslationEntries {
        self.entries
    }

    /// Returns the frame holding the page, if resident.
    pub fn frame(&self) -> Option<Pfn> {
        self.frame
    }

    /// Checks if every entry on the path is present, i.e. the page is
    /// resident.
    pub fn present(&self) -> bool {
        self.entries.len() == PageTableLevel::ALL.len()
            && self.entries.iter().all(|entry| entry.present)
    }
}

impl IntoIterator for VaTranslation {
    type Item = TranslationEntry;
    type IntoIter = <TranslationEntries as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
