use serde::{Deserialize, Serialize};

use crate::VmsimError;

/// The kind of memory reference recorded in a trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessType {
    /// Data load (`L`).
    Load,

    /// Data store (`S`).
    Store,

    /// Instruction fetch (`I`).
    Instruction,

    /// Read-modify-write of a data location (`M`).
    Modify,
}

impl AccessType {
    /// Returns `true` if the access writes to the page.
    pub fn is_write(self) -> bool {
        matches!(self, Self::Store | Self::Modify)
    }

    /// Returns the single-letter trace code for this access type.
    pub fn as_char(self) -> char {
        match self {
            Self::Load => 'L',
            Self::Store => 'S',
            Self::Instruction => 'I',
            Self::Modify => 'M',
        }
    }
}

impl TryFrom<char> for AccessType {
    type Error = VmsimError;

    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            'L' => Ok(Self::Load),
            'S' => Ok(Self::Store),
            'I' => Ok(Self::Instruction),
            'M' => Ok(Self::Modify),
            other => Err(VmsimError::InvalidAccessType(other)),
        }
    }
}

impl std::fmt::Display for AccessType {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
