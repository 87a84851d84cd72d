//! Global Architectural Constants.
//!
//! This module defines constants shared by the CSR, trap, and MMU-fault paths. It includes:
//! 1. **Paging Constants:** Page size, shift, and offset mask for address arithmetic.
//! 2. **Register Widths:** XLEN-dependent masks and the RV32 counter split point.

/// Page size in bytes (4KB).
pub const PAGE_SIZE: u64 = 4096;

/// Number of bits to shift to convert between bytes and pages.
pub const PAGE_SHIFT: u64 = 12;

/// Mask for extracting the page offset from an address.
pub const PAGE_OFFSET_MASK: u64 = PAGE_SIZE - 1;

/// Mask selecting the low 32 bits of a 64-bit counter.
pub const LOW_WORD_MASK: u64 = 0x0000_0000_FFFF_FFFF;

/// Mask selecting the high 32 bits of a 64-bit counter.
pub const HIGH_WORD_MASK: u64 = 0xFFFF_FFFF_0000_0000;

/// Shift moving the high half of a counter into the low word.
pub const HIGH_WORD_SHIFT: u64 = 32;

/// Mask for the low two bits of a trap vector or return address.
pub const ALIGN4_MASK: u64 = 0b11;
