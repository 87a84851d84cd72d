//! # CSR Dispatch Tests
//!
//! Verifies the per-register write masks and side effects: `mstatus` and its `sstatus`
//! alias, the derived `SD` bit, interrupt and delegation masks, trap-vector alignment,
//! `sptbr` and `misa` masking, floating-point CSRs, and the debug-trigger registers.

use crate::common::harness::TestContext;
use pretty_assertions::assert_eq;
use rstest::rstest;
use rvpriv_core::Unwind;
use rvpriv_core::common::{CsrDirection, FatalError};
use rvpriv_core::config::{Config, Xlen};
use rvpriv_core::core::arch::csr::{self, CsrAddr};
use rvpriv_core::core::arch::field;
use rvpriv_core::core::arch::mode::PrivilegeMode;

/// Registers whose write is `(v & mask) | (previous & !mask)`.
#[rstest]
#[case::mie(csr::MIE, csr::ALL_INTERRUPTS)]
#[case::mideleg(csr::MIDELEG, csr::DELEGABLE_INTERRUPTS)]
#[case::medeleg(csr::MEDELEG, csr::MEDELEG_WRITABLE)]
#[case::mtvec(csr::MTVEC, !0b11)]
#[case::stvec(csr::STVEC, !0b11)]
#[case::mscratch(csr::MSCRATCH, u64::MAX)]
#[case::mepc(csr::MEPC, u64::MAX)]
#[case::mcause(csr::MCAUSE, u64::MAX)]
#[case::mbadaddr(csr::MBADADDR, u64::MAX)]
#[case::sscratch(csr::SSCRATCH, u64::MAX)]
#[case::sepc(csr::SEPC, u64::MAX)]
#[case::scause(csr::SCAUSE, u64::MAX)]
#[case::sbadaddr(csr::SBADADDR, u64::MAX)]
#[case::mucounteren(csr::MUCOUNTEREN, u64::MAX)]
#[case::mscounteren(csr::MSCOUNTEREN, u64::MAX)]
#[case::fflags(csr::FFLAGS, csr::FFLAGS_MASK)]
#[case::frm(csr::FRM, csr::FRM_MASK)]
fn write_applies_register_mask(#[case] number: CsrAddr, #[case] mask: u64) {
    let mut ctx = TestContext::new();
    for (previous, value) in [
        (0, u64::MAX),
        (u64::MAX, 0),
        (0x5555_5555_5555_5555, 0xAAAA_AAAA_AAAA_AAAA),
        (0x0123_4567_89AB_CDEF, 0xFEDC_BA98_7654_3210),
    ] {
        ctx.cpu.write_csr(number, previous).unwrap();
        let previous = ctx.cpu.read_csr(number).unwrap();
        ctx.cpu.write_csr(number, value).unwrap();
        assert_eq!(
            ctx.cpu.read_csr(number).unwrap(),
            (value & mask) | (previous & !mask),
            "{number:#05x}"
        );
    }
}

/// Only the architecturally writable `mstatus` fields change; `SD` follows `FS`.
#[test]
fn mstatus_write_mask() {
    let mut ctx = TestContext::new();
    ctx.cpu.write_csr(csr::MSTATUS, u64::MAX).unwrap();
    assert_eq!(
        ctx.cpu.read_csr(csr::MSTATUS).unwrap(),
        csr::MSTATUS_WRITABLE | csr::MSTATUS64_SD
    );

    ctx.cpu.write_csr(csr::MSTATUS, 0).unwrap();
    assert_eq!(ctx.cpu.read_csr(csr::MSTATUS).unwrap(), 0);
}

/// `SD` is set exactly when `FS` reads as dirty.
#[rstest]
#[case(0, false)]
#[case(1, false)]
#[case(2, false)]
#[case(3, true)]
fn mstatus_sd_tracks_fs(#[case] fs: u64, #[case] dirty: bool) {
    let mut ctx = TestContext::new();
    ctx.cpu
        .write_csr(csr::MSTATUS, field::set(0, csr::MSTATUS_FS, fs) | csr::MSTATUS64_SD)
        .unwrap();
    let mstatus = ctx.cpu.read_csr(csr::MSTATUS).unwrap();
    assert_eq!(mstatus & csr::MSTATUS64_SD != 0, dirty);
}

/// An unsupported `VM` value leaves the scheme alone while other fields still update.
#[rstest]
#[case(csr::VM_MBB)]
#[case(csr::VM_MBBID)]
#[case(11)]
#[case(0x1F)]
fn mstatus_ignores_unsupported_vm(#[case] vm: u64) {
    let mut ctx = TestContext::new();
    let sv39 = field::set(0, csr::MSTATUS_VM, csr::VM_SV39);
    ctx.cpu.write_csr(csr::MSTATUS, sv39).unwrap();

    let request = field::set(csr::MSTATUS_MIE | csr::MSTATUS_PUM, csr::MSTATUS_VM, vm);
    ctx.cpu.write_csr(csr::MSTATUS, request).unwrap();

    let mstatus = ctx.cpu.read_csr(csr::MSTATUS).unwrap();
    assert_eq!(field::get(mstatus, csr::MSTATUS_VM), csr::VM_SV39);
    assert_ne!(mstatus & csr::MSTATUS_MIE, 0);
    assert_ne!(mstatus & csr::MSTATUS_PUM, 0);
}

/// Supported schemes are installed.
#[rstest]
#[case(csr::VM_MBARE)]
#[case(csr::VM_SV32)]
#[case(csr::VM_SV39)]
#[case(csr::VM_SV48)]
fn mstatus_accepts_supported_vm(#[case] vm: u64) {
    let mut ctx = TestContext::new();
    ctx.cpu
        .write_csr(csr::MSTATUS, field::set(0, csr::MSTATUS_VM, vm))
        .unwrap();
    let mstatus = ctx.cpu.read_csr(csr::MSTATUS).unwrap();
    assert_eq!(field::get(mstatus, csr::MSTATUS_VM), vm);
}

/// Changing a translation-relevant field flushes the TLB before the value lands;
/// other changes do not.
#[rstest]
#[case::mprv(csr::MSTATUS_MPRV, true)]
#[case::pum(csr::MSTATUS_PUM, true)]
#[case::mxr(csr::MSTATUS_MXR, true)]
#[case::mpp(csr::MSTATUS_MPP, true)]
#[case::vm(field::set(0, csr::MSTATUS_VM, csr::VM_SV39), true)]
#[case::mie(csr::MSTATUS_MIE, false)]
#[case::fs(csr::MSTATUS_FS, false)]
fn mstatus_flushes_on_translation_change(#[case] bits: u64, #[case] flushes: bool) {
    let mut ctx = TestContext::new();
    ctx.cpu.write_csr(csr::MSTATUS, bits).unwrap();
    assert_eq!(ctx.log().tlb_flushes, usize::from(flushes));

    ctx.cpu.write_csr(csr::MSTATUS, bits).unwrap();
    assert_eq!(ctx.log().tlb_flushes, usize::from(flushes), "rewrite must not flush");
}

/// An unsupported `VM` request still counts as a change for flushing purposes.
#[test]
fn mstatus_unsupported_vm_request_still_flushes() {
    let mut ctx = TestContext::new();
    ctx.cpu
        .write_csr(csr::MSTATUS, field::set(0, csr::MSTATUS_VM, csr::VM_MBB))
        .unwrap();
    assert_eq!(ctx.log().tlb_flushes, 1);
    assert_eq!(ctx.cpu.read_csr(csr::MSTATUS).unwrap(), 0);
}

/// `sstatus` exposes only the supervisor view of `mstatus`, plus `SD`.
#[test]
fn sstatus_read_is_masked_view() {
    let mut ctx = TestContext::new();
    ctx.cpu
        .write_csr(
            csr::MSTATUS,
            csr::MSTATUS_MIE | csr::MSTATUS_SIE | csr::MSTATUS_MPP | csr::MSTATUS_PUM,
        )
        .unwrap();
    assert_eq!(
        ctx.cpu.read_csr(csr::SSTATUS).unwrap(),
        csr::MSTATUS_SIE | csr::MSTATUS_PUM
    );

    ctx.cpu.write_csr(csr::MSTATUS, csr::MSTATUS_FS).unwrap();
    assert_eq!(
        ctx.cpu.read_csr(csr::SSTATUS).unwrap(),
        csr::MSTATUS_FS | csr::MSTATUS64_SD
    );
}

/// An `sstatus` write merges into `mstatus` and goes through its write path.
#[test]
fn sstatus_write_merges_into_mstatus() {
    let mut ctx = TestContext::new();
    ctx.cpu
        .write_csr(csr::MSTATUS, csr::MSTATUS_MIE | csr::MSTATUS_MPP)
        .unwrap();
    ctx.log().tlb_flushes = 0;

    ctx.cpu.write_csr(csr::SSTATUS, u64::MAX).unwrap();
    let mstatus = ctx.cpu.read_csr(csr::MSTATUS).unwrap();
    assert_eq!(
        mstatus,
        csr::MSTATUS_MIE
            | csr::MSTATUS_MPP
            | csr::MSTATUS_SIE
            | csr::MSTATUS_SPIE
            | csr::MSTATUS_SPP
            | csr::MSTATUS_FS
            | csr::MSTATUS_PUM
            | csr::MSTATUS64_SD
    );
    assert_eq!(ctx.log().tlb_flushes, 1, "PUM changed through the alias");

    ctx.cpu.write_csr(csr::SSTATUS, 0).unwrap();
    assert_eq!(
        ctx.cpu.read_csr(csr::MSTATUS).unwrap(),
        csr::MSTATUS_MIE | csr::MSTATUS_MPP
    );
}

/// Software can only change `SSIP` and `STIP`; device lines survive and the
/// interrupt controller sees the installed value.
#[test]
fn mip_write_touches_only_supervisor_software_and_timer() {
    let mut ctx = TestContext::new();
    let device = ctx.cpu.pending_interrupts();
    let _ = device.raise(csr::MIP_MTIP | csr::MIP_SEIP);

    ctx.cpu.write_csr(csr::MIP, u64::MAX).unwrap();
    let expected = csr::MIP_MTIP | csr::MIP_SEIP | csr::MIP_SSIP | csr::MIP_STIP;
    assert_eq!(ctx.cpu.read_csr(csr::MIP).unwrap(), expected);
    assert_eq!(ctx.log().notified_mip, vec![expected]);

    ctx.cpu.write_csr(csr::MIP, 0).unwrap();
    assert_eq!(
        ctx.cpu.read_csr(csr::MIP).unwrap(),
        csr::MIP_MTIP | csr::MIP_SEIP
    );
    assert_eq!(device.load(), csr::MIP_MTIP | csr::MIP_SEIP);
}

/// `sip` writes outside `mideleg` leave the corresponding `mip` bits unchanged.
#[test]
fn sip_write_respects_mideleg() {
    let mut ctx = TestContext::new().at(PrivilegeMode::Supervisor);
    ctx.poke(csr::MIDELEG, csr::MIP_STIP);
    ctx.poke(csr::MIP, csr::MIP_SSIP);

    ctx.cpu.write_csr(csr::SIP, csr::MIP_STIP).unwrap();
    assert_eq!(ctx.peek(csr::MIP), csr::MIP_SSIP | csr::MIP_STIP);

    ctx.cpu.write_csr(csr::SIP, 0).unwrap();
    assert_eq!(ctx.peek(csr::MIP), csr::MIP_SSIP, "SSIP is not delegated");
}

/// `sip` and `sie` reads are masked by `mideleg`.
#[test]
fn sip_and_sie_reads_are_delegation_masked() {
    let mut ctx = TestContext::new();
    ctx.cpu
        .write_csr(csr::MIE, csr::MIP_STIP | csr::MIP_MTIP | csr::MIP_SSIP)
        .unwrap();
    ctx.cpu
        .write_csr(csr::MIP, csr::MIP_SSIP | csr::MIP_STIP)
        .unwrap();
    ctx.cpu.write_csr(csr::MIDELEG, csr::MIP_STIP).unwrap();

    assert_eq!(ctx.cpu.read_csr(csr::SIE).unwrap(), csr::MIP_STIP);
    assert_eq!(ctx.cpu.read_csr(csr::SIP).unwrap(), csr::MIP_STIP);
}

/// `sie` writes land in `mie` only for delegated bits.
#[test]
fn sie_write_respects_mideleg() {
    let mut ctx = TestContext::new();
    ctx.cpu
        .write_csr(csr::MIDELEG, csr::MIP_SEIP | csr::MIP_STIP)
        .unwrap();
    ctx.cpu.write_csr(csr::MIE, csr::MIP_MTIP).unwrap();

    ctx.cpu.write_csr(csr::SIE, u64::MAX).unwrap();
    assert_eq!(
        ctx.cpu.read_csr(csr::MIE).unwrap(),
        csr::MIP_MTIP | csr::MIP_SEIP | csr::MIP_STIP
    );

    ctx.cpu.write_csr(csr::SIE, 0).unwrap();
    assert_eq!(ctx.cpu.read_csr(csr::MIE).unwrap(), csr::MIP_MTIP);
}

/// `sptbr` keeps only the physical page number bits.
#[rstest]
#[case(Xlen::Rv64, None, (1 << 38) - 1)]
#[case(Xlen::Rv32, None, (1 << 22) - 1)]
#[case(Xlen::Rv64, Some(44), (1 << 32) - 1)]
fn sptbr_masked_to_physical_page_number(
    #[case] xlen: Xlen,
    #[case] phys_addr_bits: Option<u32>,
    #[case] mask: u64,
) {
    let mut ctx = TestContext::with_config(&Config {
        xlen,
        phys_addr_bits,
        ..Config::default()
    });
    ctx.cpu.write_csr(csr::SPTBR, u64::MAX).unwrap();
    assert_eq!(ctx.cpu.read_csr(csr::SPTBR).unwrap(), mask);
}

/// Clearing F in `misa` clears D regardless of the written D bit.
#[rstest]
#[case(csr::MISA_EXT_D)]
#[case(0)]
fn misa_clearing_f_clears_d(#[case] d_bit: u64) {
    let mut ctx = TestContext::new();
    let misa = ctx.cpu.read_csr(csr::MISA).unwrap();
    ctx.cpu
        .write_csr(csr::MISA, (misa & !csr::MISA_EXT_F & !csr::MISA_EXT_D) | d_bit)
        .unwrap();
    let misa = ctx.cpu.read_csr(csr::MISA).unwrap();
    assert_eq!(misa & (csr::MISA_EXT_F | csr::MISA_EXT_D), 0);
}

/// Only M, A, F, D and C toggle, and never beyond the configured maximum.
#[test]
fn misa_write_mask_limited_by_max_isa() {
    let mut ctx = TestContext::with_config(&Config {
        max_isa: Some(csr::misa_mxl(Xlen::Rv64) | csr::MISA_EXT_I | csr::MISA_EXT_M | csr::MISA_EXT_C),
        ..Config::default()
    });
    let reset = ctx.cpu.read_csr(csr::MISA).unwrap();

    ctx.cpu.write_csr(csr::MISA, 0).unwrap();
    assert_eq!(
        ctx.cpu.read_csr(csr::MISA).unwrap(),
        csr::misa_mxl(Xlen::Rv64) | csr::MISA_EXT_I
    );

    ctx.cpu.write_csr(csr::MISA, u64::MAX).unwrap();
    assert_eq!(ctx.cpu.read_csr(csr::MISA).unwrap(), reset);
}

/// `fcsr` packs `fflags` and `frm`; every floating-point CSR write dirties `FS`.
#[test]
fn fcsr_packs_flags_and_rounding_mode() {
    let mut ctx = TestContext::new();
    ctx.cpu.write_csr(csr::FCSR, 0xFFF).unwrap();
    assert_eq!(ctx.cpu.read_csr(csr::FFLAGS).unwrap(), 0x1F);
    assert_eq!(ctx.cpu.read_csr(csr::FRM).unwrap(), 0x7);
    assert_eq!(ctx.cpu.read_csr(csr::FCSR).unwrap(), 0xFF);

    ctx.cpu.write_csr(csr::FRM, 0b010).unwrap();
    assert_eq!(ctx.cpu.read_csr(csr::FCSR).unwrap(), 0x5F);

    let mstatus = ctx.cpu.read_csr(csr::MSTATUS).unwrap();
    assert_eq!(field::get(mstatus, csr::MSTATUS_FS), csr::EXT_STATUS_DIRTY);
    assert_ne!(mstatus & csr::MSTATUS64_SD, 0);
}

/// User-mode floating-point CSR writes dirty `FS` too.
#[rstest]
#[case(csr::FFLAGS)]
#[case(csr::FRM)]
#[case(csr::FCSR)]
fn fp_csr_write_marks_fs_dirty(#[case] number: CsrAddr) {
    let mut ctx = TestContext::new().at(PrivilegeMode::User);
    ctx.cpu.write_csr(number, 0).unwrap();
    let mstatus = ctx.peek(csr::MSTATUS);
    assert_eq!(field::get(mstatus, csr::MSTATUS_FS), csr::EXT_STATUS_DIRTY);
}

/// `tselect` reads the debug-only sentinel and ignores writes.
#[rstest]
#[case(Xlen::Rv64, 1 << 59)]
#[case(Xlen::Rv32, 1 << 27)]
fn tselect_is_hardwired(#[case] xlen: Xlen, #[case] sentinel: u64) {
    let mut ctx = TestContext::with_config(&Config {
        xlen,
        ..Config::default()
    });
    ctx.cpu.write_csr(csr::TSELECT, 0x1234).unwrap();
    assert_eq!(ctx.cpu.read_csr(csr::TSELECT).unwrap(), sentinel);
}

/// Debug-trigger registers stop emulation instead of trapping into the guest.
#[rstest]
#[case(csr::TDATA1, "tdata1")]
#[case(csr::TDATA2, "tdata2")]
#[case(csr::TDATA3, "tdata3")]
#[case(csr::DCSR, "dcsr")]
fn debug_trigger_registers_are_fatal(#[case] number: CsrAddr, #[case] name: &'static str) {
    let mut ctx = TestContext::new();

    let read = ctx.cpu.read_csr(number).unwrap_err();
    assert!(read.is_fatal());
    assert_eq!(
        read,
        Unwind::Fatal(FatalError::UnimplementedCsr {
            csr: number,
            name,
            direction: CsrDirection::Read,
        })
    );

    let write = ctx.cpu.write_csr(number, 0).unwrap_err();
    assert_eq!(
        write,
        Unwind::Fatal(FatalError::UnimplementedCsr {
            csr: number,
            name,
            direction: CsrDirection::Write,
        })
    );
    assert_eq!(ctx.cpu.exception_index(), None, "fatal errors never reach the guest");
}

/// Identification registers read as zero.
#[rstest]
#[case(csr::MVENDORID)]
#[case(csr::MARCHID)]
#[case(csr::MIMPID)]
#[case(csr::MHARTID)]
fn id_registers_read_zero(#[case] number: CsrAddr) {
    let mut ctx = TestContext::with_config(&Config {
        hart_id: 7,
        ..Config::default()
    });
    assert_eq!(ctx.cpu.read_csr(number).unwrap(), 0);
}

/// RV32 truncates written values and places `SD` at bit 31.
#[test]
fn rv32_truncates_to_register_width() {
    let mut ctx = TestContext::rv32();
    ctx.cpu
        .write_csr(csr::MSCRATCH, 0xDEAD_BEEF_1234_5678)
        .unwrap();
    assert_eq!(ctx.cpu.read_csr(csr::MSCRATCH).unwrap(), 0x1234_5678);

    ctx.cpu.write_csr(csr::MSTATUS, csr::MSTATUS_FS).unwrap();
    assert_eq!(
        ctx.cpu.read_csr(csr::MSTATUS).unwrap(),
        csr::MSTATUS_FS | csr::MSTATUS32_SD
    );
    assert_eq!(
        ctx.cpu.read_csr(csr::SSTATUS).unwrap(),
        csr::MSTATUS_FS | csr::MSTATUS32_SD
    );
}
