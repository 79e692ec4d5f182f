use serde::{Deserialize, Serialize};
use vmsim_core::VmsimError;
use vmsim_policy::ReplacementAlgorithm;

/// Parameters of a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of physical frames.
    pub memsize: usize,

    /// Number of page-sized slots on the swap device.
    pub swapsize: usize,

    /// The page replacement policy.
    pub algorithm: ReplacementAlgorithm,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            memsize: 64,
            swapsize: 4096,
            algorithm: ReplacementAlgorithm::Clock,
        }
    }
}

impl SimConfig {
    /// Sets the number of physical frames.
    pub fn with_memsize(self, memsize: usize) -> Self {
        Self { memsize, ..self }
    }

    /// Sets the number of swap slots.
    pub fn with_swapsize(self, swapsize: usize) -> Self {
        Self { swapsize, ..self }
    }

    /// Sets the page replacement policy.
    pub fn with_algorithm(self, algorithm: ReplacementAlgorithm) -> Self {
        Self { algorithm, ..self }
    }

    /// Checks that the configuration describes a usable machine.
    pub fn validate(&self) -> Result<(), VmsimError> {
        if self.memsize == 0 {
            return Err(VmsimError::InvalidMemorySize);
        }

        Ok(())
    }
}
