//! Privileged Architecture Definitions.
//!
//! Defines the trap cause codes of the RISC-V Privileged Specification.
//!
//! # Modules
//!
//! - `cause`: Exception and interrupt cause codes, plus the internal pseudo-causes.

/// Exception and interrupt cause code definitions.
pub mod cause;
