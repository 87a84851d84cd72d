//! Common utilities and types used throughout the privileged core.
//!
//! This module provides the building blocks shared by the CSR, trap, and MMU-fault paths:
//! 1. **Address Types:** Strong types for virtual and physical addresses.
//! 2. **Constants:** Page geometry and register-width masks.
//! 3. **Memory Access:** Classification of the access that missed in the translation cache.
//! 4. **Error Handling:** Unwind signals, fatal errors, and translation results.

/// Address type definitions (physical and virtual addresses).
pub mod addr;

/// Architectural constants.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Unwind signal, fatal errors, and translation results.
pub mod error;

pub use addr::{PhysAddr, VirtAddr};
pub use constants::PAGE_SHIFT;
pub use data::AccessType;
pub use error::{
    CpuResult, CsrDirection, FatalError, TranslationFault, TranslationResult, Unwind,
};
