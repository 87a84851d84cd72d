//! System-on-Chip (SoC) interface.
//!
//! The privileged core does not model a bus or devices. This module holds the
//! trait through which it reaches the translation cache, page-table walker,
//! block cache, and interrupt controller of the surrounding emulator.

/// Platform trait definitions.
pub mod traits;

pub use traits::Platform;
