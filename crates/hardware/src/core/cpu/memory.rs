//! MMU-Fault Bridge.
//!
//! The translation cache calls into the hart when an access misses. This module resolves
//! the miss through the platform's page-table walker and either installs the mapping or
//! turns the walker's fault into a raised exception.

use tracing::trace;

use super::Cpu;
use crate::common::{AccessType, CpuResult, PhysAddr, VirtAddr};
use crate::core::arch::mode::PrivilegeMode;

impl Cpu {
    /// Handles a translation-cache miss.
    ///
    /// # Arguments
    ///
    /// * `vaddr` - The virtual address that missed.
    /// * `access` - The kind of access (Fetch/Read/Write).
    /// * `mode` - The privilege the access is translated at (differs from the current
    ///   privilege under `MPRV`).
    ///
    /// # Returns
    ///
    /// The physical address now installed for `vaddr`; the access can be retried.
    ///
    /// # Errors
    ///
    /// Raises the access or page fault chosen by the walker, with the faulting address
    /// recorded as `badaddr`.
    pub fn on_tlb_miss(
        &mut self,
        vaddr: VirtAddr,
        access: AccessType,
        mode: PrivilegeMode,
    ) -> CpuResult<PhysAddr> {
        let result = self
            .platform
            .walk_page_table(&self.csrs, vaddr, access, mode);

        if let Some(fault) = result.fault {
            trace!(
                hart = self.hart_id,
                %vaddr,
                ?access,
                %mode,
                cause = %fault.cause,
                "page walk failed"
            );
            return Err(self.raise_with_badaddr(fault.cause, fault.badaddr.val()));
        }

        trace!(hart = self.hart_id, %vaddr, paddr = %result.paddr, ?access, "tlb fill");
        self.platform
            .install_translation(vaddr, result.paddr, access, mode);
        Ok(result.paddr)
    }
}
