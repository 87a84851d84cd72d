//! CSR Access Control and Dispatch.
//!
//! This module implements the CSR instructions of the hart. It provides:
//! 1. **Access Control:** Privilege and read-only checks taken from the CSR table.
//! 2. **Dispatch Table:** One entry per CSR (or CSR range) carrying its access bits and
//!    its read and write functions.
//! 3. **Write Side Effects:** Masking, derived `SD` bit, translation flushes, and
//!    interrupt-controller notification.
//! 4. **Atomic Operations:** `csrrw`, `csrrs`, and `csrrc` semantics layered on the table.

// Table functions share one signature whether or not they can fail, and are only
// ever called through the table's function pointers.
#![allow(clippy::unnecessary_wraps, clippy::missing_const_for_fn)]

use std::cmp::Ordering;
use std::fmt;

use tracing::{debug, error, trace, warn};

use super::Cpu;
use crate::common::constants::{ALIGN4_MASK, HIGH_WORD_SHIFT, PAGE_SHIFT};
use crate::common::{CpuResult, CsrDirection, FatalError, Unwind};
use crate::core::arch::csr::{self, CsrAccess, CsrAddr};
use crate::core::arch::field;
use crate::core::arch::mode::PrivilegeMode;
use crate::isa::privileged::cause::Exception;

/// Selects which atomic CSR instruction to execute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CsrOp {
    /// `csrrw`/`csrrwi`: write unconditionally.
    Swap,
    /// `csrrs`/`csrrsi`: set bits when the source operand is present.
    Set,
    /// `csrrc`/`csrrci`: clear bits when the source operand is present.
    Clear,
}

/// Why a table read or write function refused an access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsrFault {
    /// Guest-visible illegal-instruction trap.
    Illegal,
    /// Register exists but is not modeled; emulation must stop.
    Unimplemented,
}

type CsrResult<T> = Result<T, CsrFault>;

/// Read function of a CSR table entry.
pub type CsrReadFn = fn(&Cpu, CsrAddr) -> CsrResult<u64>;

/// Write function of a CSR table entry. The value is already truncated to XLEN.
pub type CsrWriteFn = fn(&mut Cpu, CsrAddr, u64) -> CsrResult<()>;

/// One row of the CSR dispatch table.
#[derive(Clone, Copy)]
pub struct CsrEntry {
    /// First CSR number covered.
    pub first: CsrAddr,
    /// Last CSR number covered (inclusive).
    pub last: CsrAddr,
    /// Architectural name (of the first register for ranges).
    pub name: &'static str,
    /// Access attributes enforced before any read or write.
    pub access: CsrAccess,
    read: CsrReadFn,
    write: CsrWriteFn,
}

impl CsrEntry {
    /// Returns `true` if `csr` falls in this entry.
    pub const fn contains(&self, csr: CsrAddr) -> bool {
        self.first <= csr && csr <= self.last
    }
}

impl fmt::Debug for CsrEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CsrEntry")
            .field("first", &format_args!("{:#05x}", self.first))
            .field("last", &format_args!("{:#05x}", self.last))
            .field("name", &self.name)
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

const U: u8 = PrivilegeMode::User as u8;
const S: u8 = PrivilegeMode::Supervisor as u8;
const M: u8 = PrivilegeMode::Machine as u8;

const fn rw(
    first: CsrAddr,
    last: CsrAddr,
    name: &'static str,
    min_privilege: u8,
    read: CsrReadFn,
    write: CsrWriteFn,
) -> CsrEntry {
    CsrEntry {
        first,
        last,
        name,
        access: CsrAccess {
            min_privilege,
            read_only: false,
        },
        read,
        write,
    }
}

const fn ro(
    first: CsrAddr,
    last: CsrAddr,
    name: &'static str,
    min_privilege: u8,
    read: CsrReadFn,
) -> CsrEntry {
    CsrEntry {
        first,
        last,
        name,
        access: CsrAccess {
            min_privilege,
            read_only: true,
        },
        read,
        write: write_illegal,
    }
}

/// The CSR dispatch table, sorted by CSR number.
///
/// Numbers not covered by any entry raise illegal-instruction on both read and write.
pub static CSR_TABLE: [CsrEntry; 47] = [
    rw(csr::FFLAGS, csr::FFLAGS, "fflags", U, read_fflags, write_fflags),
    rw(csr::FRM, csr::FRM, "frm", U, read_frm, write_frm),
    rw(csr::FCSR, csr::FCSR, "fcsr", U, read_fcsr, write_fcsr),
    rw(csr::SSTATUS, csr::SSTATUS, "sstatus", S, read_sstatus, write_sstatus),
    rw(csr::SIE, csr::SIE, "sie", S, read_sie, write_sie),
    rw(csr::STVEC, csr::STVEC, "stvec", S, read_stvec, write_stvec),
    rw(csr::SSCRATCH, csr::SSCRATCH, "sscratch", S, read_sscratch, write_sscratch),
    rw(csr::SEPC, csr::SEPC, "sepc", S, read_sepc, write_sepc),
    rw(csr::SCAUSE, csr::SCAUSE, "scause", S, read_scause, write_scause),
    rw(csr::SBADADDR, csr::SBADADDR, "sbadaddr", S, read_sbadaddr, write_sbadaddr),
    rw(csr::SIP, csr::SIP, "sip", S, read_sip, write_sip),
    rw(csr::SPTBR, csr::SPTBR, "sptbr", S, read_sptbr, write_sptbr),
    rw(csr::MSTATUS, csr::MSTATUS, "mstatus", M, read_mstatus, write_mstatus),
    rw(csr::MISA, csr::MISA, "misa", M, read_misa, write_misa),
    rw(csr::MEDELEG, csr::MEDELEG, "medeleg", M, read_medeleg, write_medeleg),
    rw(csr::MIDELEG, csr::MIDELEG, "mideleg", M, read_mideleg, write_mideleg),
    rw(csr::MIE, csr::MIE, "mie", M, read_mie, write_mie),
    rw(csr::MTVEC, csr::MTVEC, "mtvec", M, read_mtvec, write_mtvec),
    rw(csr::MUCOUNTEREN, csr::MUCOUNTEREN, "mucounteren", M, read_mucounteren, write_mucounteren),
    rw(csr::MSCOUNTEREN, csr::MSCOUNTEREN, "mscounteren", M, read_mscounteren, write_mscounteren),
    rw(csr::MHPMEVENT3, csr::MHPMEVENT31, "mhpmevent3", M, read_zero, write_illegal),
    rw(csr::MSCRATCH, csr::MSCRATCH, "mscratch", M, read_mscratch, write_mscratch),
    rw(csr::MEPC, csr::MEPC, "mepc", M, read_mepc, write_mepc),
    rw(csr::MCAUSE, csr::MCAUSE, "mcause", M, read_mcause, write_mcause),
    rw(csr::MBADADDR, csr::MBADADDR, "mbadaddr", M, read_mbadaddr, write_mbadaddr),
    rw(csr::MIP, csr::MIP, "mip", M, read_mip, write_mip),
    rw(csr::TSELECT, csr::TSELECT, "tselect", M, read_tselect, write_tselect),
    rw(csr::TDATA1, csr::TDATA1, "tdata1", M, read_unimplemented, write_unimplemented),
    rw(csr::TDATA2, csr::TDATA2, "tdata2", M, read_unimplemented, write_unimplemented),
    rw(csr::TDATA3, csr::TDATA3, "tdata3", M, read_unimplemented, write_unimplemented),
    rw(csr::DCSR, csr::DCSR, "dcsr", M, read_unimplemented, write_unimplemented),
    rw(csr::MCYCLE, csr::MCYCLE, "mcycle", M, read_mcycle, write_mcycle),
    rw(csr::MINSTRET, csr::MINSTRET, "minstret", M, read_minstret, write_minstret),
    rw(csr::MHPMCOUNTER3, csr::MHPMCOUNTER31, "mhpmcounter3", M, read_zero, write_illegal),
    rw(csr::MCYCLEH, csr::MCYCLEH, "mcycleh", M, read_mcycleh, write_mcycleh),
    rw(csr::MINSTRETH, csr::MINSTRETH, "minstreth", M, read_minstreth, write_minstreth),
    rw(csr::MHPMCOUNTER3H, csr::MHPMCOUNTER31H, "mhpmcounter3h", M, read_zero_rv32, write_illegal),
    ro(csr::CYCLE, csr::CYCLE, "cycle", U, read_user_counter),
    ro(csr::INSTRET, csr::INSTRET, "instret", U, read_user_counter),
    ro(csr::HPMCOUNTER3, csr::HPMCOUNTER31, "hpmcounter3", U, read_zero),
    ro(csr::CYCLEH, csr::CYCLEH, "cycleh", U, read_user_counter_high),
    ro(csr::INSTRETH, csr::INSTRETH, "instreth", U, read_user_counter_high),
    ro(csr::HPMCOUNTER3H, csr::HPMCOUNTER31H, "hpmcounter3h", U, read_zero_rv32),
    ro(csr::MVENDORID, csr::MVENDORID, "mvendorid", M, read_zero),
    ro(csr::MARCHID, csr::MARCHID, "marchid", M, read_zero),
    ro(csr::MIMPID, csr::MIMPID, "mimpid", M, read_zero),
    ro(csr::MHARTID, csr::MHARTID, "mhartid", M, read_zero),
];

/// Looks up the table entry covering `csr`.
pub fn lookup(csr: CsrAddr) -> Option<&'static CsrEntry> {
    CSR_TABLE
        .binary_search_by(|entry| {
            if entry.last < csr {
                Ordering::Less
            } else if entry.first > csr {
                Ordering::Greater
            } else {
                Ordering::Equal
            }
        })
        .ok()
        .and_then(|index| CSR_TABLE.get(index))
}

/// Returns the architectural name of `csr`, if the table knows it.
pub fn csr_name(csr: CsrAddr) -> Option<&'static str> {
    lookup(csr).map(|entry| entry.name)
}

macro_rules! stored_csr {
    ($($read:ident, $write:ident => $field:ident;)*) => {$(
        fn $read(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
            Ok(cpu.csrs.$field)
        }

        fn $write(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
            cpu.csrs.$field = value;
            Ok(())
        }
    )*};
}

stored_csr! {
    read_sscratch, write_sscratch => sscratch;
    read_sepc, write_sepc => sepc;
    read_scause, write_scause => scause;
    read_sbadaddr, write_sbadaddr => sbadaddr;
    read_mscratch, write_mscratch => mscratch;
    read_mepc, write_mepc => mepc;
    read_mcause, write_mcause => mcause;
    read_mbadaddr, write_mbadaddr => mbadaddr;
    read_mucounteren, write_mucounteren => mucounteren;
    read_mscounteren, write_mscounteren => mscounteren;
}

fn read_fflags(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.csrs.fflags)
}

fn write_fflags(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    cpu.mark_fs_dirty();
    cpu.csrs.fflags = value & csr::FFLAGS_MASK;
    Ok(())
}

fn read_frm(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.csrs.frm)
}

fn write_frm(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    cpu.mark_fs_dirty();
    cpu.csrs.frm = value & csr::FRM_MASK;
    Ok(())
}

fn read_fcsr(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    let fcsr = field::set(0, csr::FSR_AEXC, cpu.csrs.fflags);
    Ok(field::set(fcsr, csr::FSR_RD, cpu.csrs.frm))
}

fn write_fcsr(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    cpu.mark_fs_dirty();
    cpu.csrs.fflags = field::get(value, csr::FSR_AEXC);
    cpu.csrs.frm = field::get(value, csr::FSR_RD);
    Ok(())
}

fn read_sstatus(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    let sstatus = cpu.csrs.mstatus & csr::SSTATUS_MASK;
    if ext_state_dirty(sstatus) {
        return Ok(sstatus | csr::mstatus_sd(cpu.xlen));
    }
    Ok(sstatus)
}

fn write_sstatus(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    let mstatus = field::merge(cpu.csrs.mstatus, value, csr::SSTATUS_MASK);
    cpu.commit_mstatus(mstatus);
    Ok(())
}

fn read_sie(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.csrs.mie & cpu.csrs.mideleg)
}

fn write_sie(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    let mie = field::merge(cpu.csrs.mie, value, cpu.csrs.mideleg);
    write_mie(cpu, csr::MIE, mie)
}

fn read_stvec(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.csrs.stvec)
}

fn write_stvec(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    cpu.csrs.stvec = value & !ALIGN4_MASK;
    Ok(())
}

fn read_sip(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.mip.load() & cpu.csrs.mideleg)
}

fn write_sip(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    cpu.install_pending(cpu.csrs.mideleg, value);
    Ok(())
}

fn read_sptbr(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.csrs.sptbr)
}

fn write_sptbr(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    let ppn_bits = u64::from(cpu.phys_addr_bits).saturating_sub(PAGE_SHIFT);
    let mask = if ppn_bits >= 64 {
        u64::MAX
    } else {
        (1 << ppn_bits) - 1
    };
    cpu.csrs.sptbr = value & mask;
    Ok(())
}

fn read_mstatus(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.csrs.mstatus)
}

fn write_mstatus(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    cpu.commit_mstatus(value);
    Ok(())
}

fn read_misa(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.csrs.misa)
}

fn write_misa(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    let value = if value & csr::MISA_EXT_F == 0 {
        value & !csr::MISA_EXT_D
    } else {
        value
    };
    let mask = csr::MISA_WRITABLE & cpu.max_isa;
    cpu.csrs.misa = field::merge(cpu.csrs.misa, value, mask);
    Ok(())
}

fn read_medeleg(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.csrs.medeleg)
}

fn write_medeleg(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    cpu.csrs.medeleg = field::merge(cpu.csrs.medeleg, value, csr::MEDELEG_WRITABLE);
    Ok(())
}

fn read_mideleg(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.csrs.mideleg)
}

fn write_mideleg(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    let dropped = value & !csr::DELEGABLE_INTERRUPTS & cpu.xlen.mask();
    if dropped != 0 {
        warn!(
            hart = cpu.hart_id,
            dropped = format_args!("{dropped:#x}"),
            "non-delegable interrupts ignored"
        );
    }
    cpu.csrs.mideleg = field::merge(cpu.csrs.mideleg, value, csr::DELEGABLE_INTERRUPTS);
    Ok(())
}

fn read_mie(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.csrs.mie)
}

fn write_mie(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    cpu.csrs.mie = field::merge(cpu.csrs.mie, value, csr::ALL_INTERRUPTS);
    Ok(())
}

fn read_mtvec(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.csrs.mtvec)
}

fn write_mtvec(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    cpu.csrs.mtvec = value & !ALIGN4_MASK;
    Ok(())
}

fn read_mip(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.mip.load())
}

fn write_mip(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    cpu.install_pending(csr::MIP_WRITABLE, value);
    Ok(())
}

/// Trigger registers are reachable only from debug mode, which this hart lacks.
fn read_tselect(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(1 << (cpu.xlen.bits() - 5))
}

fn write_tselect(_: &mut Cpu, _: CsrAddr, _: u64) -> CsrResult<()> {
    Ok(())
}

fn read_unimplemented(_: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Err(CsrFault::Unimplemented)
}

fn write_unimplemented(_: &mut Cpu, _: CsrAddr, _: u64) -> CsrResult<()> {
    Err(CsrFault::Unimplemented)
}

fn read_mcycle(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.counters.mcycle())
}

fn write_mcycle(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    let raw = cpu.counters.raw();
    cpu.counters.cycle.write_low(raw, value, cpu.xlen);
    Ok(())
}

fn read_minstret(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(cpu.counters.minstret())
}

fn write_minstret(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    let raw = cpu.counters.raw();
    cpu.counters.instret.write_low(raw, value, cpu.xlen);
    Ok(())
}

fn read_mcycleh(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    cpu.require_rv32()?;
    Ok(cpu.counters.mcycle() >> HIGH_WORD_SHIFT)
}

fn write_mcycleh(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    cpu.require_rv32()?;
    let raw = cpu.counters.raw();
    cpu.counters.cycle.write_high(raw, value);
    Ok(())
}

fn read_minstreth(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    cpu.require_rv32()?;
    Ok(cpu.counters.minstret() >> HIGH_WORD_SHIFT)
}

fn write_minstreth(cpu: &mut Cpu, _: CsrAddr, value: u64) -> CsrResult<()> {
    cpu.require_rv32()?;
    let raw = cpu.counters.raw();
    cpu.counters.instret.write_high(raw, value);
    Ok(())
}

/// `cycle` and `instret`, gated by the counter-enable bitmap of the current privilege.
fn read_user_counter(cpu: &Cpu, csr_number: CsrAddr) -> CsrResult<u64> {
    if !cpu.counter_enabled(csr_number) {
        return Err(CsrFault::Illegal);
    }
    match csr_number {
        csr::CYCLE => Ok(cpu.counters.mcycle()),
        _ => Ok(cpu.counters.minstret()),
    }
}

fn read_user_counter_high(cpu: &Cpu, csr_number: CsrAddr) -> CsrResult<u64> {
    cpu.require_rv32()?;
    if !cpu.counter_enabled(csr_number) {
        return Err(CsrFault::Illegal);
    }
    match csr_number {
        csr::CYCLEH => Ok(cpu.counters.mcycle() >> HIGH_WORD_SHIFT),
        _ => Ok(cpu.counters.minstret() >> HIGH_WORD_SHIFT),
    }
}

fn read_zero(_: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    Ok(0)
}

fn read_zero_rv32(cpu: &Cpu, _: CsrAddr) -> CsrResult<u64> {
    cpu.require_rv32()?;
    Ok(0)
}

fn write_illegal(_: &mut Cpu, _: CsrAddr, _: u64) -> CsrResult<()> {
    Err(CsrFault::Illegal)
}

const fn ext_state_dirty(status: u64) -> bool {
    field::get(status, csr::MSTATUS_FS) == csr::EXT_STATUS_DIRTY
        || field::get(status, csr::MSTATUS_XS) == csr::EXT_STATUS_DIRTY
}

impl Cpu {
    /// Checks that the current privilege may access `csr`.
    ///
    /// Access attributes come from the CSR table; numbers outside it are decoded from
    /// the number itself so the privilege check still precedes the illegal-CSR trap.
    ///
    /// # Arguments
    ///
    /// * `csr` - The 12-bit CSR number.
    /// * `is_write` - Whether the instruction will write the register.
    ///
    /// # Errors
    ///
    /// Raises illegal-instruction, sited at [`Cpu::pc`], when writing a read-only
    /// register or when the register requires a higher privilege.
    pub fn validate_csr(&mut self, csr: CsrAddr, is_write: bool) -> CpuResult<()> {
        let access = lookup(csr).map_or_else(|| CsrAccess::decode(csr), |entry| entry.access);
        let read_only_violation = is_write && access.read_only;
        let privilege_violation = self.privilege.to_u8() < access.min_privilege;
        if read_only_violation || privilege_violation {
            debug!(
                hart = self.hart_id,
                csr = format_args!("{csr:#05x}"),
                privilege = %self.privilege,
                is_write,
                "CSR access denied"
            );
            return Err(self.raise_at(Exception::IllegalInstruction, self.pc));
        }
        Ok(())
    }

    /// Reads a CSR after validating the access.
    ///
    /// # Errors
    ///
    /// Raises illegal-instruction for denied or unknown registers and unwinds fatally
    /// for debug-trigger registers.
    pub fn read_csr(&mut self, csr: CsrAddr) -> CpuResult<u64> {
        self.validate_csr(csr, false)?;
        self.dispatch_read(csr)
    }

    /// Writes a CSR after validating the access.
    ///
    /// # Errors
    ///
    /// Raises illegal-instruction for denied or unknown registers and unwinds fatally
    /// for debug-trigger registers.
    pub fn write_csr(&mut self, csr: CsrAddr, value: u64) -> CpuResult<()> {
        self.validate_csr(csr, true)?;
        self.dispatch_write(csr, value)
    }

    /// `csrrw`: writes `src` and returns the previous value.
    ///
    /// # Errors
    ///
    /// As [`Cpu::write_csr`].
    pub fn csr_swap(&mut self, csr: CsrAddr, src: u64) -> CpuResult<u64> {
        self.validate_csr(csr, true)?;
        let old = self.dispatch_read(csr)?;
        self.dispatch_write(csr, src)?;
        Ok(old)
    }

    /// `csrrs`: sets the bits of `src` and returns the previous value.
    ///
    /// When `src_nonzero` is false (source register `x0` or immediate zero) the
    /// instruction is a pure read: no write happens and only read access is checked.
    ///
    /// # Errors
    ///
    /// As [`Cpu::read_csr`], plus write checks when `src_nonzero` is set.
    pub fn csr_set(&mut self, csr: CsrAddr, src: u64, src_nonzero: bool) -> CpuResult<u64> {
        self.validate_csr(csr, src_nonzero)?;
        let old = self.dispatch_read(csr)?;
        if src_nonzero {
            self.dispatch_write(csr, old | src)?;
        }
        Ok(old)
    }

    /// `csrrc`: clears the bits of `src` and returns the previous value.
    ///
    /// Write behavior follows [`Cpu::csr_set`].
    ///
    /// # Errors
    ///
    /// As [`Cpu::csr_set`].
    pub fn csr_clear(&mut self, csr: CsrAddr, src: u64, src_nonzero: bool) -> CpuResult<u64> {
        self.validate_csr(csr, src_nonzero)?;
        let old = self.dispatch_read(csr)?;
        if src_nonzero {
            self.dispatch_write(csr, old & !src)?;
        }
        Ok(old)
    }

    /// Executes one of the atomic CSR instructions.
    ///
    /// `src_nonzero` is ignored for [`CsrOp::Swap`], which always writes.
    ///
    /// # Errors
    ///
    /// As the selected operation.
    pub fn execute_csr(
        &mut self,
        op: CsrOp,
        csr: CsrAddr,
        src: u64,
        src_nonzero: bool,
    ) -> CpuResult<u64> {
        match op {
            CsrOp::Swap => self.csr_swap(csr, src),
            CsrOp::Set => self.csr_set(csr, src, src_nonzero),
            CsrOp::Clear => self.csr_clear(csr, src, src_nonzero),
        }
    }

    fn dispatch_read(&mut self, csr: CsrAddr) -> CpuResult<u64> {
        let result = lookup(csr)
            .ok_or(CsrFault::Illegal)
            .and_then(|entry| (entry.read)(self, csr));
        match result {
            Ok(value) => {
                let value = value & self.xlen.mask();
                trace!(
                    csr = csr_name(csr).unwrap_or("?"),
                    value = format_args!("{value:#x}"),
                    "CSR read"
                );
                Ok(value)
            }
            Err(fault) => Err(self.csr_fault(csr, fault, CsrDirection::Read)),
        }
    }

    fn dispatch_write(&mut self, csr: CsrAddr, value: u64) -> CpuResult<()> {
        let value = value & self.xlen.mask();
        let result = lookup(csr)
            .ok_or(CsrFault::Illegal)
            .and_then(|entry| (entry.write)(self, csr, value));
        match result {
            Ok(()) => {
                trace!(
                    csr = csr_name(csr).unwrap_or("?"),
                    value = format_args!("{value:#x}"),
                    "CSR write"
                );
                Ok(())
            }
            Err(fault) => Err(self.csr_fault(csr, fault, CsrDirection::Write)),
        }
    }

    fn csr_fault(&mut self, csr: CsrAddr, fault: CsrFault, direction: CsrDirection) -> Unwind {
        match fault {
            CsrFault::Illegal => {
                debug!(
                    hart = self.hart_id,
                    csr = format_args!("{csr:#05x}"),
                    %direction,
                    "illegal CSR access"
                );
                self.raise_at(Exception::IllegalInstruction, self.pc)
            }
            CsrFault::Unimplemented => {
                let name = csr_name(csr).unwrap_or("unknown");
                error!(
                    hart = self.hart_id,
                    csr = format_args!("{csr:#05x}"),
                    name,
                    %direction,
                    "unimplemented CSR accessed; stopping hart"
                );
                Unwind::Fatal(FatalError::UnimplementedCsr {
                    csr,
                    name,
                    direction,
                })
            }
        }
    }

    /// Installs `value` into `mstatus` through its write mask.
    ///
    /// Flushes cached translations when a translation-relevant field changes, keeps
    /// the `VM` field unless the requested scheme is supported, and recomputes `SD`.
    pub(crate) fn commit_mstatus(&mut self, value: u64) {
        let mstatus = self.csrs.mstatus;
        if (value ^ mstatus) & csr::MSTATUS_TRANSLATION_FIELDS != 0 {
            self.flush_translation_cache();
        }

        let mut mask = csr::MSTATUS_WRITABLE;
        let vm = field::get(value, csr::MSTATUS_VM);
        if csr::is_supported_vm(vm) {
            mask |= csr::MSTATUS_VM;
        } else {
            warn!(hart = self.hart_id, vm, "unsupported translation scheme ignored");
        }

        self.csrs.mstatus = self.with_dirty_summary(field::merge(mstatus, value, mask));
    }

    /// Returns `status` with the `SD` bit recomputed from `FS` and `XS`.
    const fn with_dirty_summary(&self, status: u64) -> u64 {
        field::set(
            status,
            csr::mstatus_sd(self.xlen),
            ext_state_dirty(status) as u64,
        )
    }

    const fn mark_fs_dirty(&mut self) {
        let status = field::set(self.csrs.mstatus, csr::MSTATUS_FS, csr::EXT_STATUS_DIRTY);
        self.csrs.mstatus = self.with_dirty_summary(status);
    }

    /// Replaces the software-writable `mip` bits selected by `mask` atomically and
    /// hands the resulting pending set to the interrupt controller.
    fn install_pending(&mut self, mask: u64, value: u64) {
        let installed = self
            .mip
            .update_masked(mask & csr::MIP_WRITABLE, value);
        self.platform.pending_interrupts_changed(installed);
    }

    /// Tests the counter-enable bit for `csr` at the current privilege.
    ///
    /// Machine mode is never gated.
    const fn counter_enabled(&self, csr: CsrAddr) -> bool {
        let enable = match self.privilege {
            PrivilegeMode::User => self.csrs.mucounteren,
            PrivilegeMode::Supervisor => self.csrs.mscounteren,
            PrivilegeMode::Machine => u64::MAX,
        };
        (enable >> (csr & 31)) & 1 != 0
    }

    const fn require_rv32(&self) -> CsrResult<()> {
        if self.xlen.is_rv32() {
            Ok(())
        } else {
            Err(CsrFault::Illegal)
        }
    }
}
