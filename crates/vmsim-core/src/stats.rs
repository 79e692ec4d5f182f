use serde::{Deserialize, Serialize};

/// Counters of translation and eviction events.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    /// Translations that found the page resident.
    pub hits: usize,

    /// Translations that had to bring the page into a frame.
    pub misses: usize,

    /// Total number of translations.
    pub references: usize,

    /// Evictions of pages that did not need a write-back.
    pub evict_clean: usize,

    /// Evictions of pages that were written back to swap.
    pub evict_dirty: usize,
}

impl Stats {
    /// Returns the total number of evictions.
    pub fn evictions(&self) -> usize {
        self.evict_clean + self.evict_dirty
    }

    /// Returns the percentage of references that hit.
    pub fn hit_rate(&self) -> f64 {
        Self::percentage(self.hits, self.references)
    }

    /// Returns the percentage of references that missed.
    pub fn miss_rate(&self) -> f64 {
        Self::percentage(self.misses, self.references)
    }

    fn percentage(count: usize, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }

        count as f64 * 100.0 / total as f64
    }
}

impl std::fmt::Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "Hit count: {}", self.hits)?;
        writeln!(f, "Miss count: {}", self.misses)?;
        writeln!(f, "Clean evictions: {}", self.evict_clean)?;
        writeln!(f, "Dirty evictions: {}", self.evict_dirty)?;
        writeln!(f, "Total references : {}", self.references)?;
        writeln!(f, "Hit rate: {:.4}", self.hit_rate())?;
        write!(f, "Miss rate: {:.4}", self.miss_rate())
    }
}
