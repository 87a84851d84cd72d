//! Core processor implementation.
//!
//! This module contains the privileged state of a hart and the operations the
//! dispatch loop performs on it: CSR access, trap raising, privilege transitions,
//! and the MMU-fault bridge.

/// Architecture-specific components (CSRs, counters, interrupts, privilege modes).
pub mod arch;

/// CPU core implementation (CSR dispatch, traps, MMU-fault bridge).
pub mod cpu;

pub use self::cpu::Cpu;
