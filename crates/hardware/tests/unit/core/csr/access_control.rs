//! # CSR Access Control Tests
//!
//! Verifies that every CSR access is checked against the privilege and read-only bits
//! encoded in its number before any dispatch happens, and that denied accesses trap
//! at the instruction being executed.

use crate::common::harness::TestContext;
use pretty_assertions::assert_eq;
use rstest::rstest;
use rvpriv_core::Unwind;
use rvpriv_core::core::arch::csr::{self, CsrAccess};
use rvpriv_core::core::arch::mode::PrivilegeMode;
use rvpriv_core::core::cpu::csr::lookup;
use rvpriv_core::isa::privileged::cause::Exception;

const ILLEGAL: Unwind = Unwind::Exception(Exception::IllegalInstruction);

/// Sweeps all 4096 CSR numbers at every privilege, for reads and writes.
#[test]
fn validate_follows_number_encoding_for_every_csr() {
    for mode in [
        PrivilegeMode::User,
        PrivilegeMode::Supervisor,
        PrivilegeMode::Machine,
    ] {
        let mut ctx = TestContext::new().at(mode);
        for number in 0..4096u16 {
            let access = lookup(number).map_or_else(|| CsrAccess::decode(number), |e| e.access);
            assert_eq!(access, CsrAccess::decode(number));

            let privileged_enough = mode.to_u8() >= access.min_privilege;
            for is_write in [false, true] {
                let allowed = privileged_enough && !(is_write && access.read_only);
                let result = ctx.cpu.validate_csr(number, is_write);
                if allowed {
                    assert_eq!(result, Ok(()), "{number:#05x} write={is_write} at {mode}");
                } else {
                    assert_eq!(result, Err(ILLEGAL), "{number:#05x} write={is_write} at {mode}");
                }
            }
        }
    }
}

/// Read-only counters and ID registers reject writes even from Machine mode.
#[rstest]
#[case(csr::CYCLE)]
#[case(csr::INSTRET)]
#[case(csr::HPMCOUNTER3)]
#[case(csr::MVENDORID)]
#[case(csr::MHARTID)]
fn write_to_read_only_csr_is_illegal(#[case] number: u16) {
    let mut ctx = TestContext::new();
    assert_eq!(ctx.cpu.write_csr(number, 0), Err(ILLEGAL));
    assert_eq!(ctx.cpu.exception_index(), Some(Exception::IllegalInstruction));
}

/// Lower privileges cannot reach higher-privilege registers.
#[rstest]
#[case(PrivilegeMode::User, csr::SSTATUS)]
#[case(PrivilegeMode::User, csr::MSTATUS)]
#[case(PrivilegeMode::Supervisor, csr::MSTATUS)]
#[case(PrivilegeMode::Supervisor, csr::MEPC)]
#[case(PrivilegeMode::Supervisor, csr::MCYCLE)]
fn access_above_current_privilege_is_illegal(#[case] mode: PrivilegeMode, #[case] number: u16) {
    let mut ctx = TestContext::new().at(mode);
    assert_eq!(ctx.cpu.read_csr(number), Err(ILLEGAL));
    assert_eq!(ctx.cpu.write_csr(number, 0), Err(ILLEGAL));
}

/// Supervisor mode reaches its own registers and the user floating-point ones.
#[test]
fn supervisor_reaches_supervisor_and_user_csrs() {
    let mut ctx = TestContext::new().at(PrivilegeMode::Supervisor);
    assert_eq!(ctx.cpu.write_csr(csr::SSCRATCH, 0x55), Ok(()));
    assert_eq!(ctx.cpu.read_csr(csr::SSCRATCH), Ok(0x55));
    assert_eq!(ctx.cpu.write_csr(csr::FFLAGS, 0x3), Ok(()));
    assert_eq!(ctx.cpu.exception_index(), None);
}

/// A denied access is sited at the current instruction: the platform restores state
/// for the recorded PC before the unwind.
#[test]
fn denied_access_restores_state_at_pc() {
    let mut ctx = TestContext::new().at(PrivilegeMode::User);
    ctx.cpu.set_pc(0x8000_0010);
    ctx.log().restore_to = Some(0x8000_0010);

    assert_eq!(ctx.cpu.read_csr(csr::MSTATUS), Err(ILLEGAL));
    assert_eq!(ctx.log().restore_requests, vec![0x8000_0010]);
    assert_eq!(ctx.cpu.pc(), 0x8000_0010);
}

/// `csrrs` with a zero source is a read: it passes on a read-only register where an
/// unconditional write would trap.
#[rstest]
#[case(csr::CYCLE)]
#[case(csr::MHARTID)]
#[case(csr::MIMPID)]
fn set_with_zero_source_on_read_only_csr_succeeds(#[case] number: u16) {
    let mut ctx = TestContext::new();
    assert!(ctx.cpu.csr_set(number, 0, false).is_ok());
    assert!(ctx.cpu.csr_clear(number, 0, false).is_ok());
    assert_eq!(ctx.cpu.exception_index(), None);

    assert_eq!(ctx.cpu.csr_set(number, 1, true), Err(ILLEGAL));
    assert_eq!(ctx.cpu.csr_swap(number, 0), Err(ILLEGAL));
}

/// Numbers outside the table pass the privilege check but trap in dispatch.
#[rstest]
#[case(csr::TIME)]
#[case(csr::TIMEH)]
#[case(0x7FF)]
#[case(0x306)]
fn unknown_csr_is_illegal(#[case] number: u16) {
    let mut ctx = TestContext::new();
    assert_eq!(ctx.cpu.validate_csr(number, false), Ok(()));
    assert_eq!(ctx.cpu.read_csr(number), Err(ILLEGAL));
    assert_eq!(ctx.cpu.take_exception(), Some(Exception::IllegalInstruction));
}
