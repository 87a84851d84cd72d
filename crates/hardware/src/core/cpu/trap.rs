//! Trap Raising and Privilege Transitions.
//!
//! This module implements how the hart leaves the instruction it is executing. It performs
//! the following:
//! 1. **Exception Raising:** Records the cause (and bad address) and produces the
//!    [`Unwind`] signal the dispatch loop catches.
//! 2. **State Restoration:** Reconciles partially executed translated blocks before unwinding.
//! 3. **Privilege Switching:** Validates and commits privilege changes, flushing translations.
//! 4. **Return Handling:** Implements `SRET` and `MRET` for returning from trap handlers.
//!
//! Vectoring into `stvec`/`mtvec` (and the `medeleg` decision) belongs to the dispatch
//! loop, which consumes [`Cpu::take_exception`] after catching the unwind.

use tracing::{debug, trace};

use super::Cpu;
use crate::common::constants::ALIGN4_MASK;
use crate::common::{CpuResult, Unwind};
use crate::core::arch::csr;
use crate::core::arch::field;
use crate::core::arch::mode::PrivilegeMode;
use crate::isa::privileged::cause::Exception;

impl Cpu {
    /// Records `cause` as pending and returns the signal that unwinds to the dispatch loop.
    ///
    /// Callers return the signal immediately: `return Err(self.raise(cause));`.
    pub fn raise(&mut self, cause: Exception) -> Unwind {
        trace!(hart = self.hart_id, %cause, pc = format_args!("{:#x}", self.pc), "raise");
        self.exception_index = Some(cause);
        Unwind::Exception(cause)
    }

    /// Records `cause` and the faulting address `badaddr`, then unwinds.
    pub fn raise_with_badaddr(&mut self, cause: Exception, badaddr: u64) -> Unwind {
        self.badaddr = badaddr;
        self.raise(cause)
    }

    /// Raises `cause` from inside translated code at guest address `pc`.
    ///
    /// The platform first reconciles architectural registers to the instruction at `pc`
    /// so that nothing the block executed after it survives the unwind.
    pub fn raise_at(&mut self, cause: Exception, pc: u64) -> Unwind {
        if let Some(restored) = self.platform.restore_state(pc) {
            self.pc = restored;
        }
        self.raise(cause)
    }

    /// Stops the hart for the debugger.
    pub fn raise_debug(&mut self) -> Unwind {
        self.raise(Exception::Debug)
    }

    /// Parks the hart until an interrupt is pending (`wfi`).
    ///
    /// The dispatch loop resumes the hart with [`Cpu::resume_from_wfi`].
    pub fn wait_for_interrupt(&mut self) -> Unwind {
        self.wfi = true;
        self.raise(Exception::WaitForInterrupt)
    }

    /// Clears the wait-for-interrupt state once an interrupt is delivered.
    pub const fn resume_from_wfi(&mut self) {
        self.wfi = false;
    }

    /// Drops every cached translation of this hart.
    pub fn flush_translation_cache(&mut self) {
        trace!(hart = self.hart_id, "translation cache flush");
        self.platform.flush_tlb();
    }

    /// `fence.i`: drops cached translations and translated blocks.
    pub fn fence_i(&mut self) {
        self.flush_translation_cache();
        self.platform.flush_block_cache();
    }

    /// Switches the hart to privilege level `level` (raw encoding).
    ///
    /// The legacy hypervisor level becomes User. Cached translations are flushed on every
    /// switch because their permission checks depend on the privilege they were made at.
    ///
    /// # Errors
    ///
    /// Unwinds fatally when `level` is above Machine.
    pub fn set_privilege(&mut self, level: u64) -> CpuResult<()> {
        let privilege = PrivilegeMode::from_raw(level)?;
        self.flush_translation_cache();
        debug!(
            hart = self.hart_id,
            from = %self.privilege,
            to = %privilege,
            "privilege change"
        );
        self.privilege = privilege;
        Ok(())
    }

    /// Executes `sret` and returns the PC to resume at.
    ///
    /// # Errors
    ///
    /// Raises illegal-instruction below Supervisor mode and
    /// instruction-address-misaligned when `sepc` is not 4-byte aligned. Neither
    /// changes any state besides the recorded cause.
    pub fn return_from_supervisor_trap(&mut self) -> CpuResult<u64> {
        if self.privilege < PrivilegeMode::Supervisor {
            return Err(self.raise(Exception::IllegalInstruction));
        }

        let target = self.csrs.sepc;
        if target & ALIGN4_MASK != 0 {
            return Err(self.raise(Exception::InstructionAddressMisaligned));
        }

        let mstatus = self.csrs.mstatus;
        let previous = field::get(mstatus, csr::MSTATUS_SPP);
        let mstatus = field::set(
            mstatus,
            csr::MSTATUS_UIE << previous,
            field::get(mstatus, csr::MSTATUS_SPIE),
        );
        let mstatus = field::set(mstatus, csr::MSTATUS_SPIE, 0);
        let mstatus = field::set(mstatus, csr::MSTATUS_SPP, PrivilegeMode::User as u64);

        self.set_privilege(previous)?;
        self.commit_mstatus(mstatus);
        Ok(target & self.xlen.mask())
    }

    /// Executes `mret` and returns the PC to resume at.
    ///
    /// Unlike `sret`, the return address is not checked for alignment.
    ///
    /// # Errors
    ///
    /// Raises illegal-instruction below Machine mode.
    pub fn return_from_machine_trap(&mut self) -> CpuResult<u64> {
        if self.privilege < PrivilegeMode::Machine {
            return Err(self.raise(Exception::IllegalInstruction));
        }

        let target = self.csrs.mepc;
        let mstatus = self.csrs.mstatus;
        let previous = field::get(mstatus, csr::MSTATUS_MPP);
        let mstatus = field::set(
            mstatus,
            csr::MSTATUS_UIE << previous,
            field::get(mstatus, csr::MSTATUS_MPIE),
        );
        let mstatus = field::set(mstatus, csr::MSTATUS_MPIE, 0);
        let mstatus = field::set(mstatus, csr::MSTATUS_MPP, PrivilegeMode::User as u64);

        self.set_privilege(previous)?;
        self.commit_mstatus(mstatus);
        Ok(target & self.xlen.mask())
    }
}
