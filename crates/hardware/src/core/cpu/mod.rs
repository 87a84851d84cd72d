//! CPU Core Definition and Initialization.
//!
//! This module defines the `Cpu` structure, which holds the privileged state of one hart.
//! It coordinates the following:
//! 1. **State Management:** Privilege level, CSR storage, counters, and program counter.
//! 2. **Transient Trap State:** Pending cause, bad address, and wait-for-interrupt flag.
//! 3. **Interrupt Sharing:** The `mip` handle devices use to assert interrupt lines.
//! 4. **System Integration:** The `Platform` through which translation and block caches
//!    are reached.
//!
//! Fields are private: the dispatch loop mutates hart state only through CSR access,
//! trap raising, and privilege transitions.

/// Control and Status Register access and dispatch.
pub mod csr;

/// MMU-fault bridge between the page-table walker and the exception raiser.
pub mod memory;

/// Exception raising and privilege transitions.
pub mod trap;

use std::fmt;

use crate::common::CpuResult;
use crate::config::{Config, Xlen};
use crate::core::arch::counter::Counters;
use crate::core::arch::csr::Csrs;
use crate::core::arch::interrupt::PendingInterrupts;
use crate::core::arch::mode::PrivilegeMode;
use crate::isa::privileged::cause::Exception;
use crate::soc::Platform;

pub use self::csr::CsrOp;

/// Privileged state of one hart.
pub struct Cpu {
    privilege: PrivilegeMode,
    csrs: Csrs,
    mip: PendingInterrupts,
    counters: Counters,
    pc: u64,
    exception_index: Option<Exception>,
    badaddr: u64,
    wfi: bool,
    xlen: Xlen,
    max_isa: u64,
    phys_addr_bits: u32,
    hart_id: u64,
    platform: Box<dyn Platform>,
}

impl Cpu {
    /// Creates a hart in its reset state.
    ///
    /// `misa` starts at the configured maximum ISA and every other CSR at zero.
    ///
    /// # Arguments
    ///
    /// * `config` - Hart parameters; see [`Config::validate`].
    /// * `platform` - The emulator services this hart calls out to.
    ///
    /// # Errors
    ///
    /// Returns a fatal unwind if the configured reset privilege is above Machine.
    pub fn new(config: &Config, platform: Box<dyn Platform>) -> CpuResult<Self> {
        let privilege = PrivilegeMode::from_raw(config.reset_privilege_raw())?;
        let max_isa = config.max_isa();
        tracing::debug!(
            hart = config.hart_id,
            xlen = config.xlen.bits(),
            misa = format_args!("{max_isa:#x}"),
            %privilege,
            "hart reset"
        );
        Ok(Self {
            privilege,
            csrs: Csrs::new(max_isa),
            mip: PendingInterrupts::new(),
            counters: Counters::default(),
            pc: 0,
            exception_index: None,
            badaddr: 0,
            wfi: false,
            xlen: config.xlen,
            max_isa,
            phys_addr_bits: config.phys_addr_bits(),
            hart_id: config.hart_id,
            platform,
        })
    }

    /// Returns the current privilege level.
    pub const fn privilege(&self) -> PrivilegeMode {
        self.privilege
    }

    /// Returns the CSR storage, for inspection by the dispatch loop and debuggers.
    pub const fn csrs(&self) -> &Csrs {
        &self.csrs
    }

    /// Returns the register width of this hart.
    pub const fn xlen(&self) -> Xlen {
        self.xlen
    }

    /// Returns the hart number.
    pub const fn hart_id(&self) -> u64 {
        self.hart_id
    }

    /// Returns the address of the instruction being executed.
    pub const fn pc(&self) -> u64 {
        self.pc
    }

    /// Records the address of the instruction about to execute.
    ///
    /// Traps raised by CSR access control are sited at this address.
    pub const fn set_pc(&mut self, pc: u64) {
        self.pc = pc;
    }

    /// Returns the pending exception cause, if one was raised and not yet taken.
    pub const fn exception_index(&self) -> Option<Exception> {
        self.exception_index
    }

    /// Takes the pending exception cause, leaving none pending.
    pub const fn take_exception(&mut self) -> Option<Exception> {
        self.exception_index.take()
    }

    /// Returns the faulting address recorded with the last exception.
    pub const fn badaddr(&self) -> u64 {
        self.badaddr
    }

    /// Returns `true` while the hart is parked by `wfi`.
    pub const fn is_waiting_for_interrupt(&self) -> bool {
        self.wfi
    }

    /// Returns a handle to this hart's pending-interrupt register for devices.
    pub fn pending_interrupts(&self) -> PendingInterrupts {
        self.mip.clone()
    }

    /// Advances the raw counter by `count` retired instructions.
    pub const fn retire(&mut self, count: u64) {
        self.counters.retire(count);
    }

    /// Returns the raw instruction count since reset, ignoring counter writes.
    pub const fn raw_instruction_count(&self) -> u64 {
        self.counters.raw()
    }
}

impl fmt::Debug for Cpu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cpu")
            .field("hart_id", &self.hart_id)
            .field("xlen", &self.xlen)
            .field("privilege", &self.privilege)
            .field("pc", &format_args!("{:#x}", self.pc))
            .field("exception_index", &self.exception_index)
            .field("badaddr", &format_args!("{:#x}", self.badaddr))
            .field("wfi", &self.wfi)
            .field("mip", &format_args!("{:#x}", self.mip.load()))
            .field("csrs", &self.csrs)
            .field("counters", &self.counters)
            .finish_non_exhaustive()
    }
}
