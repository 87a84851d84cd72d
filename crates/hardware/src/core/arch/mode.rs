//! RISC-V Privilege Modes.
//!
//! This module defines the privilege levels a hart can run at. It implements the following:
//! 1. **Mode Classification:** User (U), Supervisor (S), and Machine (M) modes.
//! 2. **Validation:** Conversion from raw encodings, coercing the legacy hypervisor level.
//! 3. **Observability:** Human-readable naming and display formatting for privilege states.

use crate::common::FatalError;

/// Raw encoding of the legacy hypervisor level; coerced to User on entry.
pub const RAW_HYPERVISOR: u64 = 2;

/// RISC-V privilege mode levels.
///
/// Machine mode is the highest privilege level; comparisons follow the raw encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PrivilegeMode {
    /// User mode (U-mode).
    User = 0,

    /// Supervisor mode (S-mode).
    Supervisor = 1,

    /// Machine mode (M-mode).
    Machine = 3,
}

impl PrivilegeMode {
    /// Converts a raw privilege encoding to a privilege mode.
    ///
    /// The legacy hypervisor encoding (2) becomes `User`.
    ///
    /// # Errors
    ///
    /// Returns [`FatalError::InvalidPrivilege`] for anything above Machine.
    pub const fn from_raw(raw: u64) -> Result<Self, FatalError> {
        match raw {
            0 | RAW_HYPERVISOR => Ok(Self::User),
            1 => Ok(Self::Supervisor),
            3 => Ok(Self::Machine),
            _ => Err(FatalError::InvalidPrivilege(raw)),
        }
    }

    /// Converts a privilege mode to its `u8` representation.
    pub const fn to_u8(self) -> u8 {
        self as u8
    }

    /// Returns the human-readable name of the privilege mode.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Supervisor => "Supervisor",
            Self::Machine => "Machine",
        }
    }
}

impl std::fmt::Display for PrivilegeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
