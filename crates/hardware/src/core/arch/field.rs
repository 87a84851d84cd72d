//! Typed bit-field accessors for CSR values.
//!
//! Every CSR field in this crate is described by a contiguous mask. These helpers
//! derive the shift from the mask so call sites never shift by hand.

/// Extracts the field selected by `mask`, shifted down to bit 0.
///
/// An empty mask yields 0.
#[inline]
pub const fn get(reg: u64, mask: u64) -> u64 {
    if mask == 0 {
        return 0;
    }
    (reg & mask) >> mask.trailing_zeros()
}

/// Returns `reg` with the field selected by `mask` replaced by `val`.
///
/// Bits of `val` that do not fit in the field are dropped.
#[inline]
pub const fn set(reg: u64, mask: u64, val: u64) -> u64 {
    if mask == 0 {
        return reg;
    }
    (reg & !mask) | ((val << mask.trailing_zeros()) & mask)
}

/// Replaces the bits of `old` selected by `mask` with the same bits of `new`.
#[inline]
pub const fn merge(old: u64, new: u64, mask: u64) -> u64 {
    (old & !mask) | (new & mask)
}

/// Returns `true` if every bit of `mask` is set in `reg`.
#[inline]
pub const fn all_set(reg: u64, mask: u64) -> bool {
    reg & mask == mask
}
