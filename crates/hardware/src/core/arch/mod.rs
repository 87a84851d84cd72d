//! RISC-V architecture-specific components.
//!
//! This module contains the architectural vocabulary of the privileged core.
//! It includes the following modules:
//! 1. **CSRs:** CSR numbers, address decoding, field masks, and register storage.
//! 2. **Counters:** Virtualized cycle and instructions-retired counters.
//! 3. **Fields:** Mask-driven bit-field accessors.
//! 4. **Interrupts:** The pending-interrupt register shared with devices.
//! 5. **Modes:** Privilege mode definitions.

/// Control and Status Register (CSR) definitions and storage.
pub mod csr;

/// Virtualized performance counters.
pub mod counter;

/// Bit-field accessors for CSR values.
pub mod field;

/// Pending-interrupt register shared with devices.
pub mod interrupt;

/// Privilege mode definitions.
pub mod mode;
