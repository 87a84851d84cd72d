//! Virtualized performance counters.
//!
//! The cycle and instructions-retired CSRs are views over one monotonically increasing
//! raw count kept by the dispatch loop. A write does not touch the raw count; it records
//! a new offset and the raw value at the time of the write, so that
//!
//! ```text
//! current = raw - snapshot + offset
//! ```
//!
//! continues counting from the written value.

use crate::common::constants::{HIGH_WORD_MASK, HIGH_WORD_SHIFT, LOW_WORD_MASK};
use crate::config::Xlen;

/// One virtualized counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VirtualCounter {
    snapshot: u64,
    offset: u64,
}

impl VirtualCounter {
    /// Returns the counter value for raw count `raw`.
    #[inline]
    pub const fn current(&self, raw: u64) -> u64 {
        raw.wrapping_sub(self.snapshot).wrapping_add(self.offset)
    }

    /// Writes the low CSR of the counter.
    ///
    /// On RV64 the whole counter is replaced. On RV32 only the low 32 bits are, and the
    /// high half keeps its current value.
    pub fn write_low(&mut self, raw: u64, value: u64, xlen: Xlen) {
        let offset = match xlen {
            Xlen::Rv64 => value,
            Xlen::Rv32 => (self.current(raw) & HIGH_WORD_MASK) | (value & LOW_WORD_MASK),
        };
        self.rebase(raw, offset);
    }

    /// Writes the high 32 bits of the counter (RV32 `*h` CSRs).
    pub fn write_high(&mut self, raw: u64, value: u64) {
        let offset =
            (self.current(raw) & LOW_WORD_MASK) | ((value & LOW_WORD_MASK) << HIGH_WORD_SHIFT);
        self.rebase(raw, offset);
    }

    const fn rebase(&mut self, raw: u64, offset: u64) {
        self.offset = offset;
        self.snapshot = raw;
    }
}

/// The hart's counter state.
///
/// `mcycle` and `minstret` both advance with retired instructions: the core does not
/// model pipeline timing, so one instruction is one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Counters {
    raw: u64,
    /// Virtualized `mcycle`.
    pub cycle: VirtualCounter,
    /// Virtualized `minstret`.
    pub instret: VirtualCounter,
}

impl Counters {
    /// Advances the raw count by `count` retired instructions.
    pub const fn retire(&mut self, count: u64) {
        self.raw = self.raw.wrapping_add(count);
    }

    /// Returns the raw instruction count since reset.
    pub const fn raw(&self) -> u64 {
        self.raw
    }

    /// Returns the current `mcycle` value.
    pub const fn mcycle(&self) -> u64 {
        self.cycle.current(self.raw)
    }

    /// Returns the current `minstret` value.
    pub const fn minstret(&self) -> u64 {
        self.instret.current(self.raw)
    }
}
