//! Control and Status Register (CSR) definitions and storage.
//!
//! This module defines the CSR vocabulary of a privileged-1.9 era hart. It provides:
//! 1. **Address Definitions:** Constants for the user, supervisor, machine, and debug CSRs.
//! 2. **Address Decoding:** Minimum privilege and read-only attributes encoded in the number.
//! 3. **Field Masks:** Bitmasks for status, ISA, interrupt, and floating-point fields.
//! 4. **Register Storage:** The `Csrs` struct holding the architectural state that is not
//!    shared with devices or derived from counters.

use crate::config::Xlen;
use crate::isa::privileged::cause::interrupt;

/// A 12-bit CSR number.
pub type CsrAddr = u16;

/// Floating-point accrued exception flags CSR address.
pub const FFLAGS: CsrAddr = 0x001;

/// Floating-point dynamic rounding mode CSR address.
pub const FRM: CsrAddr = 0x002;

/// Floating-point control and status register CSR address.
pub const FCSR: CsrAddr = 0x003;

/// Supervisor status register CSR address.
pub const SSTATUS: CsrAddr = 0x100;

/// Supervisor interrupt enable register CSR address.
pub const SIE: CsrAddr = 0x104;

/// Supervisor trap vector base address register CSR address.
pub const STVEC: CsrAddr = 0x105;

/// Supervisor scratch register CSR address.
pub const SSCRATCH: CsrAddr = 0x140;

/// Supervisor exception program counter CSR address.
pub const SEPC: CsrAddr = 0x141;

/// Supervisor cause register CSR address.
pub const SCAUSE: CsrAddr = 0x142;

/// Supervisor bad address register CSR address.
pub const SBADADDR: CsrAddr = 0x143;

/// Supervisor interrupt pending register CSR address.
pub const SIP: CsrAddr = 0x144;

/// Supervisor page-table base register CSR address.
pub const SPTBR: CsrAddr = 0x180;

/// Machine status register CSR address.
pub const MSTATUS: CsrAddr = 0x300;

/// Machine ISA register CSR address.
pub const MISA: CsrAddr = 0x301;

/// Machine exception delegation register CSR address.
pub const MEDELEG: CsrAddr = 0x302;

/// Machine interrupt delegation register CSR address.
pub const MIDELEG: CsrAddr = 0x303;

/// Machine interrupt enable register CSR address.
pub const MIE: CsrAddr = 0x304;

/// Machine trap vector base address register CSR address.
pub const MTVEC: CsrAddr = 0x305;

/// User-mode counter enable register CSR address.
pub const MUCOUNTEREN: CsrAddr = 0x320;

/// Supervisor-mode counter enable register CSR address.
pub const MSCOUNTEREN: CsrAddr = 0x321;

/// First machine performance-monitoring event selector.
pub const MHPMEVENT3: CsrAddr = 0x323;

/// Last machine performance-monitoring event selector.
pub const MHPMEVENT31: CsrAddr = 0x33F;

/// Machine scratch register CSR address.
pub const MSCRATCH: CsrAddr = 0x340;

/// Machine exception program counter CSR address.
pub const MEPC: CsrAddr = 0x341;

/// Machine cause register CSR address.
pub const MCAUSE: CsrAddr = 0x342;

/// Machine bad address register CSR address.
pub const MBADADDR: CsrAddr = 0x343;

/// Machine interrupt pending register CSR address.
pub const MIP: CsrAddr = 0x344;

/// Debug trigger select register CSR address.
pub const TSELECT: CsrAddr = 0x7A0;

/// Debug trigger data 1 register CSR address.
pub const TDATA1: CsrAddr = 0x7A1;

/// Debug trigger data 2 register CSR address.
pub const TDATA2: CsrAddr = 0x7A2;

/// Debug trigger data 3 register CSR address.
pub const TDATA3: CsrAddr = 0x7A3;

/// Debug control and status register CSR address.
pub const DCSR: CsrAddr = 0x7B0;

/// Machine cycle counter CSR address.
pub const MCYCLE: CsrAddr = 0xB00;

/// Machine instructions-retired counter CSR address.
pub const MINSTRET: CsrAddr = 0xB02;

/// First machine performance-monitoring counter.
pub const MHPMCOUNTER3: CsrAddr = 0xB03;

/// Last machine performance-monitoring counter.
pub const MHPMCOUNTER31: CsrAddr = 0xB1F;

/// Upper 32 bits of `mcycle` (RV32 only).
pub const MCYCLEH: CsrAddr = 0xB80;

/// Upper 32 bits of `minstret` (RV32 only).
pub const MINSTRETH: CsrAddr = 0xB82;

/// Upper half of the first machine performance-monitoring counter (RV32 only).
pub const MHPMCOUNTER3H: CsrAddr = 0xB83;

/// Upper half of the last machine performance-monitoring counter (RV32 only).
pub const MHPMCOUNTER31H: CsrAddr = 0xB9F;

/// Cycle counter CSR address (read-only shadow of `mcycle`).
pub const CYCLE: CsrAddr = 0xC00;

/// Wall-clock timer CSR address.
pub const TIME: CsrAddr = 0xC01;

/// Instructions-retired counter CSR address (read-only shadow of `minstret`).
pub const INSTRET: CsrAddr = 0xC02;

/// First user performance-monitoring counter.
pub const HPMCOUNTER3: CsrAddr = 0xC03;

/// Last user performance-monitoring counter.
pub const HPMCOUNTER31: CsrAddr = 0xC1F;

/// Upper 32 bits of `cycle` (RV32 only).
pub const CYCLEH: CsrAddr = 0xC80;

/// Upper 32 bits of `time` (RV32 only).
pub const TIMEH: CsrAddr = 0xC81;

/// Upper 32 bits of `instret` (RV32 only).
pub const INSTRETH: CsrAddr = 0xC82;

/// Upper half of the first user performance-monitoring counter (RV32 only).
pub const HPMCOUNTER3H: CsrAddr = 0xC83;

/// Upper half of the last user performance-monitoring counter (RV32 only).
pub const HPMCOUNTER31H: CsrAddr = 0xC9F;

/// Machine vendor ID CSR address.
pub const MVENDORID: CsrAddr = 0xF11;

/// Machine architecture ID CSR address.
pub const MARCHID: CsrAddr = 0xF12;

/// Machine implementation ID CSR address.
pub const MIMPID: CsrAddr = 0xF13;

/// Machine hardware thread ID CSR address.
pub const MHARTID: CsrAddr = 0xF14;

/// Access attributes encoded in a CSR number.
///
/// Bits \[9:8\] hold the lowest privilege level allowed to touch the register and
/// bits \[11:10\] equal to `0b11` mark it read-only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CsrAccess {
    /// Minimum raw privilege level (0 = U, 1 = S, 2 = H, 3 = M).
    pub min_privilege: u8,
    /// Any write traps as an illegal instruction.
    pub read_only: bool,
}

impl CsrAccess {
    /// Decodes the access attributes of `csr`.
    pub const fn decode(csr: CsrAddr) -> Self {
        Self {
            min_privilege: ((csr >> 8) & 0b11) as u8,
            read_only: (csr >> 10) & 0b11 == 0b11,
        }
    }
}

/// User interrupt enable.
pub const MSTATUS_UIE: u64 = 1 << 0;
/// Supervisor interrupt enable.
pub const MSTATUS_SIE: u64 = 1 << 1;
/// Hypervisor interrupt enable (legacy).
pub const MSTATUS_HIE: u64 = 1 << 2;
/// Machine interrupt enable.
pub const MSTATUS_MIE: u64 = 1 << 3;
/// User previous interrupt enable.
pub const MSTATUS_UPIE: u64 = 1 << 4;
/// Supervisor previous interrupt enable.
pub const MSTATUS_SPIE: u64 = 1 << 5;
/// Hypervisor previous interrupt enable (legacy).
pub const MSTATUS_HPIE: u64 = 1 << 6;
/// Machine previous interrupt enable.
pub const MSTATUS_MPIE: u64 = 1 << 7;
/// Supervisor previous privilege.
pub const MSTATUS_SPP: u64 = 1 << 8;
/// Hypervisor previous privilege (legacy).
pub const MSTATUS_HPP: u64 = 0b11 << 9;
/// Machine previous privilege.
pub const MSTATUS_MPP: u64 = 0b11 << 11;
/// Floating-point unit state.
pub const MSTATUS_FS: u64 = 0b11 << 13;
/// Extension state.
pub const MSTATUS_XS: u64 = 0b11 << 15;
/// Modify privilege for loads and stores.
pub const MSTATUS_MPRV: u64 = 1 << 17;
/// Protect user memory from supervisor access.
pub const MSTATUS_PUM: u64 = 1 << 18;
/// Make executable pages readable.
pub const MSTATUS_MXR: u64 = 1 << 19;
/// Virtual memory scheme selector.
pub const MSTATUS_VM: u64 = 0x1F << 24;
/// Dirty-state summary on RV32.
pub const MSTATUS32_SD: u64 = 1 << 31;
/// Dirty-state summary on RV64.
pub const MSTATUS64_SD: u64 = 1 << 63;

/// `mstatus` bits a CSR write may change, before the `VM` field is considered.
pub const MSTATUS_WRITABLE: u64 = MSTATUS_SIE
    | MSTATUS_SPIE
    | MSTATUS_MIE
    | MSTATUS_MPIE
    | MSTATUS_SPP
    | MSTATUS_FS
    | MSTATUS_MPRV
    | MSTATUS_PUM
    | MSTATUS_MPP
    | MSTATUS_MXR;

/// `mstatus` fields whose change invalidates cached translations.
pub const MSTATUS_TRANSLATION_FIELDS: u64 =
    MSTATUS_VM | MSTATUS_MPP | MSTATUS_MPRV | MSTATUS_PUM | MSTATUS_MXR;

/// The view of `mstatus` visible through `sstatus` (`SD` is computed separately).
pub const SSTATUS_MASK: u64 =
    MSTATUS_SIE | MSTATUS_SPIE | MSTATUS_SPP | MSTATUS_FS | MSTATUS_XS | MSTATUS_PUM;

/// Value of a two-bit `FS`/`XS` field meaning "dirty".
pub const EXT_STATUS_DIRTY: u64 = 0b11;

/// Returns the `SD` bit position for the given register width.
pub const fn mstatus_sd(xlen: Xlen) -> u64 {
    match xlen {
        Xlen::Rv32 => MSTATUS32_SD,
        Xlen::Rv64 => MSTATUS64_SD,
    }
}

/// `mstatus.VM` value: no translation.
pub const VM_MBARE: u64 = 0;
/// `mstatus.VM` value: single base-and-bound (not supported).
pub const VM_MBB: u64 = 1;
/// `mstatus.VM` value: separate instruction and data base-and-bound (not supported).
pub const VM_MBBID: u64 = 2;
/// `mstatus.VM` value: Sv32 paging.
pub const VM_SV32: u64 = 8;
/// `mstatus.VM` value: Sv39 paging.
pub const VM_SV39: u64 = 9;
/// `mstatus.VM` value: Sv48 paging.
pub const VM_SV48: u64 = 10;

/// Returns `true` for the translation schemes the walker implements.
pub const fn is_supported_vm(vm: u64) -> bool {
    matches!(vm, VM_MBARE | VM_SV32 | VM_SV39 | VM_SV48)
}

/// User software interrupt pending.
pub const MIP_USIP: u64 = 1 << interrupt::USER_SOFTWARE;
/// Supervisor software interrupt pending.
pub const MIP_SSIP: u64 = 1 << interrupt::SUPERVISOR_SOFTWARE;
/// Hypervisor software interrupt pending (legacy).
pub const MIP_HSIP: u64 = 1 << interrupt::HYPERVISOR_SOFTWARE;
/// Machine software interrupt pending.
pub const MIP_MSIP: u64 = 1 << interrupt::MACHINE_SOFTWARE;
/// User timer interrupt pending.
pub const MIP_UTIP: u64 = 1 << interrupt::USER_TIMER;
/// Supervisor timer interrupt pending.
pub const MIP_STIP: u64 = 1 << interrupt::SUPERVISOR_TIMER;
/// Hypervisor timer interrupt pending (legacy).
pub const MIP_HTIP: u64 = 1 << interrupt::HYPERVISOR_TIMER;
/// Machine timer interrupt pending.
pub const MIP_MTIP: u64 = 1 << interrupt::MACHINE_TIMER;
/// User external interrupt pending.
pub const MIP_UEIP: u64 = 1 << interrupt::USER_EXTERNAL;
/// Supervisor external interrupt pending.
pub const MIP_SEIP: u64 = 1 << interrupt::SUPERVISOR_EXTERNAL;
/// Hypervisor external interrupt pending (legacy).
pub const MIP_HEIP: u64 = 1 << interrupt::HYPERVISOR_EXTERNAL;
/// Machine external interrupt pending.
pub const MIP_MEIP: u64 = 1 << interrupt::MACHINE_EXTERNAL;
/// Coprocessor interrupt pending.
pub const MIP_COP: u64 = 1 << interrupt::COPROCESSOR;

/// Interrupts machine mode may delegate to supervisor mode.
pub const DELEGABLE_INTERRUPTS: u64 = MIP_SSIP | MIP_STIP | MIP_SEIP | MIP_COP;

/// Every interrupt an `mie` write may enable.
pub const ALL_INTERRUPTS: u64 = DELEGABLE_INTERRUPTS | MIP_MSIP | MIP_MTIP | MIP_MEIP;

/// `mip` bits software may change; the rest belong to devices.
pub const MIP_WRITABLE: u64 = MIP_SSIP | MIP_STIP;

/// Exception causes 0 through 11 may be delegated.
pub const MEDELEG_WRITABLE: u64 = (1 << 12) - 1;

/// Accrued exception flags within `fcsr`.
pub const FSR_AEXC: u64 = 0x1F;
/// Rounding mode within `fcsr`.
pub const FSR_RD: u64 = 0x7 << 5;
/// Width mask of `fflags`.
pub const FFLAGS_MASK: u64 = 0x1F;
/// Width mask of `frm`.
pub const FRM_MASK: u64 = 0x7;

/// Returns the `misa` bit for an extension letter (`b'A'..=b'Z'`).
pub const fn misa_ext(letter: u8) -> u64 {
    1 << (letter - b'A')
}

/// Atomic extension.
pub const MISA_EXT_A: u64 = misa_ext(b'A');
/// Compressed extension.
pub const MISA_EXT_C: u64 = misa_ext(b'C');
/// Double-precision floating point.
pub const MISA_EXT_D: u64 = misa_ext(b'D');
/// Single-precision floating point.
pub const MISA_EXT_F: u64 = misa_ext(b'F');
/// Base integer ISA.
pub const MISA_EXT_I: u64 = misa_ext(b'I');
/// Integer multiply and divide.
pub const MISA_EXT_M: u64 = misa_ext(b'M');
/// Supervisor mode.
pub const MISA_EXT_S: u64 = misa_ext(b'S');
/// User mode.
pub const MISA_EXT_U: u64 = misa_ext(b'U');

/// Extensions software may toggle in `misa`; further limited by the hart's maximum ISA.
pub const MISA_WRITABLE: u64 = MISA_EXT_M | MISA_EXT_A | MISA_EXT_F | MISA_EXT_D | MISA_EXT_C;

/// Returns the `misa.MXL` bits for the given register width.
pub const fn misa_mxl(xlen: Xlen) -> u64 {
    match xlen {
        Xlen::Rv32 => 1 << 30,
        Xlen::Rv64 => 2 << 62,
    }
}

/// Architectural CSR storage.
///
/// `mip` is absent because devices share it (see [`super::interrupt::PendingInterrupts`]),
/// and the counters live in [`super::counter::Counters`]. Fields are plain storage; every
/// masking and side effect is applied by the CPU's CSR write path.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Csrs {
    /// Machine status register.
    pub mstatus: u64,
    /// Machine ISA register.
    pub misa: u64,
    /// Machine exception delegation.
    pub medeleg: u64,
    /// Machine interrupt delegation.
    pub mideleg: u64,
    /// Machine interrupt enable.
    pub mie: u64,
    /// Machine trap vector base address.
    pub mtvec: u64,
    /// Machine scratch register.
    pub mscratch: u64,
    /// Machine exception program counter.
    pub mepc: u64,
    /// Machine trap cause.
    pub mcause: u64,
    /// Machine bad address.
    pub mbadaddr: u64,
    /// Supervisor trap vector base address.
    pub stvec: u64,
    /// Supervisor scratch register.
    pub sscratch: u64,
    /// Supervisor exception program counter.
    pub sepc: u64,
    /// Supervisor trap cause.
    pub scause: u64,
    /// Supervisor bad address.
    pub sbadaddr: u64,
    /// Supervisor page-table base (physical page number).
    pub sptbr: u64,
    /// Counters readable from user mode, one bit per counter.
    pub mucounteren: u64,
    /// Counters readable from supervisor mode, one bit per counter.
    pub mscounteren: u64,
    /// Floating-point accrued exception flags.
    pub fflags: u64,
    /// Floating-point rounding mode.
    pub frm: u64,
}

impl Csrs {
    /// Creates reset-state storage with `misa` set to `misa`.
    pub fn new(misa: u64) -> Self {
        Self {
            misa,
            ..Self::default()
        }
    }
}
