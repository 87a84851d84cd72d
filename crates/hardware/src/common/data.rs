//! Memory Access Types.
//!
//! This module defines the classification of memory accesses that reach the MMU-fault
//! bridge. The page-table walker uses it to pick the right permission bit and, on
//! failure, the right fault cause (instruction, load, or store/AMO).

use crate::isa::privileged::cause::Exception;

/// Type of memory access that missed in the translation cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Instruction fetch access. Requires Execute (X) permission.
    Fetch,

    /// Data read access. Requires Read (R) permission (or X with `MXR`).
    Read,

    /// Data write or AMO access. Requires Write (W) permission.
    Write,
}

impl AccessType {
    /// Decodes the translation-cache access code: 0 = load, 1 = store, 2 = fetch.
    ///
    /// Any other code is treated as a load.
    pub const fn from_code(code: u32) -> Self {
        match code {
            1 => Self::Write,
            2 => Self::Fetch,
            _ => Self::Read,
        }
    }

    /// Returns `true` for stores and AMOs.
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Write)
    }

    /// Returns the access-fault exception matching this access kind.
    pub const fn access_fault(self) -> Exception {
        match self {
            Self::Fetch => Exception::InstructionAccessFault,
            Self::Read => Exception::LoadAccessFault,
            Self::Write => Exception::StoreAccessFault,
        }
    }

    /// Returns the page-fault exception matching this access kind.
    pub const fn page_fault(self) -> Exception {
        match self {
            Self::Fetch => Exception::InstructionPageFault,
            Self::Read => Exception::LoadPageFault,
            Self::Write => Exception::StorePageFault,
        }
    }
}
