//! Platform trait for the privileged core's external collaborators.
//!
//! This module defines the `Platform` trait through which the privileged core reaches
//! the parts of the emulator it does not own. It provides:
//! 1. **Translation Cache:** Invalidation and installation of cached translations.
//! 2. **Page-Table Walker:** Resolution of a virtual address against the current CSRs.
//! 3. **Block Cache:** Invalidation and precise-state restoration for translated code.
//! 4. **Interrupt Controller:** Notification when software changes the pending set.
//!
//! Implementors must be `Send` so a hart can be moved onto its own thread.

use crate::common::{AccessType, PhysAddr, TranslationResult, VirtAddr};
use crate::core::arch::csr::Csrs;
use crate::core::arch::mode::PrivilegeMode;

/// Services the surrounding emulator provides to one hart.
pub trait Platform: Send {
    /// Drops every cached virtual-to-physical translation of this hart.
    fn flush_tlb(&mut self);

    /// Drops every translated block of this hart.
    fn flush_block_cache(&mut self) {}

    /// Walks the page table for `vaddr` as seen by an access of kind `access` at
    /// translation privilege `mode`, using `sptbr` and `mstatus` from `csrs`.
    ///
    /// A failed walk reports the cause and faulting address it chose.
    fn walk_page_table(
        &mut self,
        csrs: &Csrs,
        vaddr: VirtAddr,
        access: AccessType,
        mode: PrivilegeMode,
    ) -> TranslationResult;

    /// Installs a page mapping into the translation cache.
    fn install_translation(
        &mut self,
        vaddr: VirtAddr,
        paddr: PhysAddr,
        access: AccessType,
        mode: PrivilegeMode,
    );

    /// Called after a CSR write installed `mip` as the new pending set.
    fn pending_interrupts_changed(&mut self, _mip: u64) {}

    /// Reconciles architectural state to the guest instruction at `pc` inside the
    /// translated block that is executing.
    ///
    /// Returns the restored guest PC, or `None` if `pc` is not in translated code.
    fn restore_state(&mut self, _pc: u64) -> Option<u64> {
        None
    }
}
