//! Shared pending-interrupt register.
//!
//! `mip` is the one piece of hart state written from outside the hart: timers, interrupt
//! controllers, and inter-processor mailboxes assert and clear their lines while the
//! hart runs. The register is a single atomic word so a masked CSR write never loses a
//! bit a device changed concurrently.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::field;

/// Cloneable handle to a hart's `mip` register.
///
/// Clones refer to the same register.
#[derive(Clone, Debug, Default)]
pub struct PendingInterrupts(Arc<AtomicU64>);

impl PendingInterrupts {
    /// Creates a register with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current pending bits.
    pub fn load(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Asserts the interrupt lines in `bits`, returning the new pending set.
    pub fn raise(&self, bits: u64) -> u64 {
        self.0.fetch_or(bits, Ordering::AcqRel) | bits
    }

    /// Clears the interrupt lines in `bits`, returning the new pending set.
    pub fn lower(&self, bits: u64) -> u64 {
        self.0.fetch_and(!bits, Ordering::AcqRel) & !bits
    }

    /// Replaces the bits selected by `mask` with those of `value` in one atomic step.
    ///
    /// Returns the new pending set.
    pub fn update_masked(&self, mask: u64, value: u64) -> u64 {
        let previous = match self.0.fetch_update(Ordering::AcqRel, Ordering::Acquire, |old| {
            Some(field::merge(old, value, mask))
        }) {
            Ok(old) | Err(old) => old,
        };
        field::merge(previous, value, mask)
    }
}
