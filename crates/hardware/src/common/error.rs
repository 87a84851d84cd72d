//! Unwind signals and Translation Result definitions.
//!
//! This module defines the control-flow and error types of the privileged core. It provides:
//! 1. **Unwind Signal:** The typed replacement for a non-local jump back to the dispatch loop.
//! 2. **Fatal Errors:** Conditions that must abort emulation instead of reaching the guest.
//! 3. **Translation Results:** The outcome of a page-table walk handed to the MMU-fault bridge.

use std::fmt;

use thiserror::Error;

use super::addr::{PhysAddr, VirtAddr};
use crate::isa::privileged::cause::Exception;

/// Result type of every operation that can unwind to the dispatch loop.
pub type CpuResult<T> = Result<T, Unwind>;

/// Direction of a CSR access, for fatal-error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsrDirection {
    /// `csrr*` read half.
    Read,
    /// `csrr*` write half.
    Write,
}

impl fmt::Display for CsrDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
        })
    }
}

/// Emulator errors with no correct guest-visible behavior.
///
/// When one of these reaches the dispatch loop, emulation of the hart must stop.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FatalError {
    /// Access to a debug-trigger register that this core does not model.
    #[error("CSR {name} ({csr:#05x}) {direction} not implemented")]
    UnimplementedCsr {
        /// CSR number.
        csr: u16,
        /// Architectural register name.
        name: &'static str,
        /// Whether the read or the write half hit the register.
        direction: CsrDirection,
    },

    /// Privilege value above Machine passed to the transition engine.
    #[error("invalid privilege level {0} requested")]
    InvalidPrivilege(u64),
}

/// Signal that unwinds the in-flight instruction back to the dispatch loop.
///
/// Producing an `Unwind::Exception` means the cause (and bad address, if any) has
/// already been recorded in the hart's transient state; nothing else the faulting
/// instruction did may survive.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Unwind {
    /// Guest-visible trap or internal pseudo-cause; the dispatch loop vectors or resumes.
    #[error("exception {0}")]
    Exception(Exception),

    /// Emulation must abort.
    #[error("fatal emulator error: {0}")]
    Fatal(#[from] FatalError),
}

impl Unwind {
    /// Returns the exception carried by this unwind, if it is not fatal.
    pub const fn exception(&self) -> Option<Exception> {
        match self {
            Self::Exception(exception) => Some(*exception),
            Self::Fatal(_) => None,
        }
    }

    /// Returns `true` when the dispatch loop must abort emulation.
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// Fault reported by the page-table walker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranslationFault {
    /// Cause the walker chose (access fault or page fault).
    pub cause: Exception,
    /// Faulting virtual address, recorded as `badaddr`.
    pub badaddr: VirtAddr,
}

/// Result of a virtual-to-physical address translation operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TranslationResult {
    /// The translated physical address, or zero if translation failed.
    pub paddr: PhysAddr,
    /// Fault that occurred during translation, if any.
    pub fault: Option<TranslationFault>,
}

impl TranslationResult {
    /// Creates a successful translation result.
    #[inline]
    pub const fn success(paddr: PhysAddr) -> Self {
        Self { paddr, fault: None }
    }

    /// Creates a translation result indicating a fault occurred.
    #[inline]
    pub const fn fault(cause: Exception, badaddr: VirtAddr) -> Self {
        Self {
            paddr: PhysAddr(0),
            fault: Some(TranslationFault { cause, badaddr }),
        }
    }

    /// Returns `true` if the walk produced a mapping.
    pub const fn is_success(&self) -> bool {
        self.fault.is_none()
    }
}
