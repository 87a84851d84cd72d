//! RISC-V Trap Cause Codes.
//!
//! This module defines the cause codes recorded in `mcause`/`scause` and in the
//! hart's pending `exception_index`. Exception codes are the architectural values;
//! two extra pseudo-causes (debug stop and wait-for-interrupt) live above the
//! architectural range and are only ever seen by the dispatch loop.

use std::fmt;

/// Interrupt numbers (bit positions in `mip`/`mie`/`mideleg`).
pub mod interrupt {
    /// User software interrupt.
    pub const USER_SOFTWARE: u32 = 0;
    /// Supervisor software interrupt.
    pub const SUPERVISOR_SOFTWARE: u32 = 1;
    /// Hypervisor software interrupt (legacy encoding, never delegable).
    pub const HYPERVISOR_SOFTWARE: u32 = 2;
    /// Machine software interrupt.
    pub const MACHINE_SOFTWARE: u32 = 3;
    /// User timer interrupt.
    pub const USER_TIMER: u32 = 4;
    /// Supervisor timer interrupt.
    pub const SUPERVISOR_TIMER: u32 = 5;
    /// Hypervisor timer interrupt (legacy encoding).
    pub const HYPERVISOR_TIMER: u32 = 6;
    /// Machine timer interrupt.
    pub const MACHINE_TIMER: u32 = 7;
    /// User external interrupt.
    pub const USER_EXTERNAL: u32 = 8;
    /// Supervisor external interrupt.
    pub const SUPERVISOR_EXTERNAL: u32 = 9;
    /// Hypervisor external interrupt (legacy encoding).
    pub const HYPERVISOR_EXTERNAL: u32 = 10;
    /// Machine external interrupt.
    pub const MACHINE_EXTERNAL: u32 = 11;
    /// Coprocessor interrupt.
    pub const COPROCESSOR: u32 = 12;
}

/// Exception code definitions.
pub mod exception {
    /// Instruction address misaligned (0).
    pub const INSTRUCTION_ADDRESS_MISALIGNED: u32 = 0;
    /// Instruction access fault (1).
    pub const INSTRUCTION_ACCESS_FAULT: u32 = 1;
    /// Illegal instruction (2).
    pub const ILLEGAL_INSTRUCTION: u32 = 2;
    /// Breakpoint (3).
    pub const BREAKPOINT: u32 = 3;
    /// Load address misaligned (4).
    pub const LOAD_ADDRESS_MISALIGNED: u32 = 4;
    /// Load access fault (5).
    pub const LOAD_ACCESS_FAULT: u32 = 5;
    /// Store/AMO address misaligned (6).
    pub const STORE_ADDRESS_MISALIGNED: u32 = 6;
    /// Store/AMO access fault (7).
    pub const STORE_ACCESS_FAULT: u32 = 7;
    /// Environment call from U-mode (8).
    pub const ENVIRONMENT_CALL_FROM_U_MODE: u32 = 8;
    /// Environment call from S-mode (9).
    pub const ENVIRONMENT_CALL_FROM_S_MODE: u32 = 9;
    /// Environment call from H-mode (10).
    pub const ENVIRONMENT_CALL_FROM_H_MODE: u32 = 10;
    /// Environment call from M-mode (11).
    pub const ENVIRONMENT_CALL_FROM_M_MODE: u32 = 11;
    /// Instruction page fault (12).
    pub const INSTRUCTION_PAGE_FAULT: u32 = 12;
    /// Load page fault (13).
    pub const LOAD_PAGE_FAULT: u32 = 13;
    /// Store/AMO page fault (15).
    pub const STORE_PAGE_FAULT: u32 = 15;
}

/// Emulator-internal pseudo-causes, outside the architectural code space.
pub mod internal {
    /// Stop requested by the debugger.
    pub const DEBUG: u32 = 0x1_0002;
    /// Hart parked by `wfi` until an interrupt is pending.
    pub const WAIT_FOR_INTERRUPT: u32 = 0x1_0004;
}

/// A pending exception cause.
///
/// Every value here can be recorded in the hart's `exception_index` by the
/// exception raiser. Vectoring to `mtvec`/`stvec` and delegation through
/// `medeleg` are the dispatch loop's job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Exception {
    /// PC not aligned to the instruction width.
    InstructionAddressMisaligned,
    /// Instruction fetch hit a protected or missing region.
    InstructionAccessFault,
    /// Bad encoding, bad CSR, or insufficient privilege.
    IllegalInstruction,
    /// `ebreak` or hardware breakpoint.
    Breakpoint,
    /// Misaligned load.
    LoadAddressMisaligned,
    /// Load hit a protected or missing region.
    LoadAccessFault,
    /// Misaligned store or AMO.
    StoreAddressMisaligned,
    /// Store or AMO hit a protected or missing region.
    StoreAccessFault,
    /// `ecall` from U-mode.
    EnvironmentCallFromUMode,
    /// `ecall` from S-mode.
    EnvironmentCallFromSMode,
    /// `ecall` from H-mode.
    EnvironmentCallFromHMode,
    /// `ecall` from M-mode.
    EnvironmentCallFromMMode,
    /// Instruction fetch page fault.
    InstructionPageFault,
    /// Load page fault.
    LoadPageFault,
    /// Store or AMO page fault.
    StorePageFault,
    /// Debugger stop (internal).
    Debug,
    /// Wait-for-interrupt park (internal).
    WaitForInterrupt,
}

impl Exception {
    /// Returns the cause code recorded for this exception.
    pub const fn code(self) -> u32 {
        use self::exception as e;
        match self {
            Self::InstructionAddressMisaligned => e::INSTRUCTION_ADDRESS_MISALIGNED,
            Self::InstructionAccessFault => e::INSTRUCTION_ACCESS_FAULT,
            Self::IllegalInstruction => e::ILLEGAL_INSTRUCTION,
            Self::Breakpoint => e::BREAKPOINT,
            Self::LoadAddressMisaligned => e::LOAD_ADDRESS_MISALIGNED,
            Self::LoadAccessFault => e::LOAD_ACCESS_FAULT,
            Self::StoreAddressMisaligned => e::STORE_ADDRESS_MISALIGNED,
            Self::StoreAccessFault => e::STORE_ACCESS_FAULT,
            Self::EnvironmentCallFromUMode => e::ENVIRONMENT_CALL_FROM_U_MODE,
            Self::EnvironmentCallFromSMode => e::ENVIRONMENT_CALL_FROM_S_MODE,
            Self::EnvironmentCallFromHMode => e::ENVIRONMENT_CALL_FROM_H_MODE,
            Self::EnvironmentCallFromMMode => e::ENVIRONMENT_CALL_FROM_M_MODE,
            Self::InstructionPageFault => e::INSTRUCTION_PAGE_FAULT,
            Self::LoadPageFault => e::LOAD_PAGE_FAULT,
            Self::StorePageFault => e::STORE_PAGE_FAULT,
            Self::Debug => internal::DEBUG,
            Self::WaitForInterrupt => internal::WAIT_FOR_INTERRUPT,
        }
    }

    /// Looks up the exception for a cause code.
    pub const fn from_code(code: u32) -> Option<Self> {
        use self::exception as e;
        Some(match code {
            e::INSTRUCTION_ADDRESS_MISALIGNED => Self::InstructionAddressMisaligned,
            e::INSTRUCTION_ACCESS_FAULT => Self::InstructionAccessFault,
            e::ILLEGAL_INSTRUCTION => Self::IllegalInstruction,
            e::BREAKPOINT => Self::Breakpoint,
            e::LOAD_ADDRESS_MISALIGNED => Self::LoadAddressMisaligned,
            e::LOAD_ACCESS_FAULT => Self::LoadAccessFault,
            e::STORE_ADDRESS_MISALIGNED => Self::StoreAddressMisaligned,
            e::STORE_ACCESS_FAULT => Self::StoreAccessFault,
            e::ENVIRONMENT_CALL_FROM_U_MODE => Self::EnvironmentCallFromUMode,
            e::ENVIRONMENT_CALL_FROM_S_MODE => Self::EnvironmentCallFromSMode,
            e::ENVIRONMENT_CALL_FROM_H_MODE => Self::EnvironmentCallFromHMode,
            e::ENVIRONMENT_CALL_FROM_M_MODE => Self::EnvironmentCallFromMMode,
            e::INSTRUCTION_PAGE_FAULT => Self::InstructionPageFault,
            e::LOAD_PAGE_FAULT => Self::LoadPageFault,
            e::STORE_PAGE_FAULT => Self::StorePageFault,
            internal::DEBUG => Self::Debug,
            internal::WAIT_FOR_INTERRUPT => Self::WaitForInterrupt,
            _ => return None,
        })
    }

    /// Returns `true` for the pseudo-causes that never reach a guest trap vector.
    pub const fn is_internal(self) -> bool {
        matches!(self, Self::Debug | Self::WaitForInterrupt)
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}({})", self.code())
    }
}
