//! RISC-V privileged-architecture core.
//!
//! This crate implements the privileged execution semantics of an emulated RISC-V hart,
//! following the 1.9-era privileged specification (`sptbr`, `sbadaddr`, `mstatus.VM`):
//! 1. **CSRs:** Table-driven access control and per-register write masks and side effects.
//! 2. **Traps:** Cause recording and a typed unwind back to the dispatch loop.
//! 3. **Privilege:** `sret`/`mret` and privilege switches with translation flushes.
//! 4. **Counters:** Writable cycle and instructions-retired counters over a raw count.
//! 5. **MMU Bridge:** Turning page-table walk failures into raised exceptions.
//!
//! Instruction decode, the translation and block caches, the page-table walker, and
//! interrupt delivery belong to the embedding emulator and are reached through
//! [`soc::Platform`].

/// Common types and constants (addresses, access types, unwind signal).
pub mod common;
/// Hart configuration (register width, ISA capability, reset state).
pub mod config;
/// CPU core (architectural state, CSR dispatch, traps).
pub mod core;
/// Instruction set vocabulary (trap cause codes).
pub mod isa;
/// Services provided by the embedding emulator.
pub mod soc;

/// Hart configuration; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// Privileged state of one hart; construct with `Cpu::new`.
pub use crate::core::Cpu;
/// Unwind signal carried by every fallible hart operation.
pub use crate::common::{CpuResult, Unwind};
/// The emulator services a hart calls out to.
pub use crate::soc::Platform;
