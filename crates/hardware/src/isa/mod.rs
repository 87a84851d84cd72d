//! Instruction set definitions consumed by the privileged core.
//!
//! Decoding lives in the surrounding dispatch loop; only the privileged
//! architecture's numeric vocabulary (cause codes) is defined here.

/// Privileged architecture definitions (trap causes).
pub mod privileged;
