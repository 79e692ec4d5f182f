//! Page replacement policies.
//!
//! Every policy implements [`EvictionPolicy`] and keeps its ordering state
//! in the linkage nodes of the [`FrameTable`] plus the policy-owned
//! referenced bit of each page, accessed through [`PageStatus`].
//!
//! [`FrameTable`]: vmsim_core::FrameTable
//! [`PageStatus`]: vmsim_core::PageStatus

#[cfg(feature = "clock")]
pub mod clock;
#[cfg(feature = "s2q")]
pub mod s2q;

#[cfg(test)]
mod testing;

use vmsim_core::{EvictionPolicy, VmsimError};

/// Selects one of the built-in replacement policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ReplacementAlgorithm {
    /// Second-chance sweep over all frames.
    #[cfg(feature = "clock")]
    #[serde(rename = "clock")]
    Clock,

    /// Simplified 2Q with a FIFO probation queue and an LRU main queue.
    #[cfg(feature = "s2q")]
    #[serde(rename = "s2q")]
    SimplifiedTwoQueue,
}

impl ReplacementAlgorithm {
    /// Returns the short name of the algorithm, as accepted by
    /// [`str::parse`].
    pub fn name(self) -> &'static str {
        match self {
            #[cfg(feature = "clock")]
            Self::Clock => "clock",
            #[cfg(feature = "s2q")]
            Self::SimplifiedTwoQueue => "s2q",
        }
    }

    /// Creates a fresh, uninitialized instance of the policy.
    pub fn build(self) -> Box<dyn EvictionPolicy> {
        match self {
            #[cfg(feature = "clock")]
            Self::Clock => Box::new(clock::Clock::new()),
            #[cfg(feature = "s2q")]
            Self::SimplifiedTwoQueue => Box::new(s2q::SimplifiedTwoQueue::new()),
        }
    }
}

impl std::fmt::Display for ReplacementAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ReplacementAlgorithm {
    type Err = VmsimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            #[cfg(feature = "clock")]
            "clock" => Ok(Self::Clock),
            #[cfg(feature = "s2q")]
            "s2q" => Ok(Self::SimplifiedTwoQueue),
            _ => Err(VmsimError::Other("unknown replacement algorithm")),
        }
    }
}

#[cfg(all(test, feature = "clock", feature = "s2q"))]
mod tests {
    use super::*;

    #[test]
    fn parse_names() {
        assert_eq!(
            "clock".parse::<ReplacementAlgorithm>().ok(),
            Some(ReplacementAlgorithm::Clock)
        );
        assert_eq!(
            "s2q".parse::<ReplacementAlgorithm>().ok(),
            Some(ReplacementAlgorithm::SimplifiedTwoQueue)
        );
        assert!("lru".parse::<ReplacementAlgorithm>().is_err());
    }

    #[test]
    fn built_policy_matches_name() {
        for algorithm in [
            ReplacementAlgorithm::Clock,
            ReplacementAlgorithm::SimplifiedTwoQueue,
        ] {
            let parsed = algorithm.to_string().parse::<ReplacementAlgorithm>();
            assert_eq!(algorithm.build().name(), algorithm.name());
            assert_eq!(parsed.ok(), Some(algorithm));
        }
    }
}
