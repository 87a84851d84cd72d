//! Configuration system for the privileged core.
//!
//! This module defines the per-hart parameters the privileged core needs at construction.
//! It provides:
//! 1. **Defaults:** Baseline ISA capability and physical-address width per register width.
//! 2. **Structures:** The flat `Config` record and the `Xlen` register-width selector.
//! 3. **Validation:** `ConfigError` for combinations no hart can be built from.
//!
//! Configuration is supplied as JSON by the embedding emulator, or use `Config::default()`
//! for an RV64 hart that resets into Machine mode.

use serde::Deserialize;
use thiserror::Error;

use crate::common::constants::PAGE_SHIFT;
use crate::core::arch::csr::{
    MISA_EXT_A, MISA_EXT_C, MISA_EXT_D, MISA_EXT_F, MISA_EXT_I, MISA_EXT_M, MISA_EXT_S,
    MISA_EXT_U, misa_mxl,
};
use crate::core::arch::mode::{PrivilegeMode, RAW_HYPERVISOR};

/// Default configuration constants for the privileged core.
mod defaults {
    /// Physical-address width of an RV64 hart (Sv39/Sv48 era implementations).
    pub const PHYS_ADDR_BITS_RV64: u32 = 50;

    /// Physical-address width of an RV32 hart (Sv32 produces 34-bit addresses).
    pub const PHYS_ADDR_BITS_RV32: u32 = 34;

    /// Harts reset into Machine mode.
    pub const RESET_PRIVILEGE: u64 = 3;
}

/// Register width of the emulated hart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum Xlen {
    /// 32-bit registers.
    Rv32,
    /// 64-bit registers.
    #[default]
    Rv64,
}

impl Xlen {
    /// Returns the register width in bits.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Rv32 => 32,
            Self::Rv64 => 64,
        }
    }

    /// Returns the mask every CSR value is truncated to.
    pub const fn mask(self) -> u64 {
        match self {
            Self::Rv32 => 0xFFFF_FFFF,
            Self::Rv64 => u64::MAX,
        }
    }

    /// Returns `true` for RV32, where the counters have separate high-half CSRs.
    pub const fn is_rv32(self) -> bool {
        matches!(self, Self::Rv32)
    }
}

/// Errors detected while loading or validating a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The JSON document could not be parsed.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// `max_isa` does not advertise the base integer ISA.
    #[error("max_isa {0:#x} lacks the base integer ISA")]
    MissingBaseIsa(u64),

    /// Physical-address width cannot hold a page or exceeds the register width.
    #[error("phys_addr_bits {bits} out of range for {xlen:?}")]
    PhysAddrBits {
        /// Requested width.
        bits: u32,
        /// Configured register width.
        xlen: Xlen,
    },

    /// Reset privilege is the legacy hypervisor level or above Machine.
    #[error("reset_privilege {0} is not User, Supervisor or Machine")]
    ResetPrivilege(u64),
}

/// Per-hart configuration.
///
/// # Examples
///
/// ```
/// use rvpriv_core::config::{Config, Xlen};
///
/// let config = Config::from_json(r#"{ "xlen": "Rv32", "hart_id": 2 }"#).unwrap();
/// assert_eq!(config.xlen, Xlen::Rv32);
/// assert_eq!(config.phys_addr_bits(), 34);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Register width.
    pub xlen: Xlen,

    /// Maximum `misa` capability; defaults to IMAFDC with S and U for the chosen width.
    pub max_isa: Option<u64>,

    /// Physical-address width used to mask `sptbr`; defaults per register width.
    pub phys_addr_bits: Option<u32>,

    /// Hart number, attached to tracing output.
    pub hart_id: u64,

    /// Raw privilege level at construction; defaults to Machine.
    pub reset_privilege: Option<u64>,
}

impl Config {
    /// Parses a configuration from JSON and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the JSON is malformed or describes an invalid hart.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration for combinations no hart can be built from.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let max_isa = self.max_isa();
        if max_isa & MISA_EXT_I == 0 {
            return Err(ConfigError::MissingBaseIsa(max_isa));
        }

        let bits = self.phys_addr_bits();
        if u64::from(bits) <= PAGE_SHIFT || bits > self.xlen.bits() + 2 {
            return Err(ConfigError::PhysAddrBits {
                bits,
                xlen: self.xlen,
            });
        }

        let raw = self.reset_privilege_raw();
        if raw == RAW_HYPERVISOR || PrivilegeMode::from_raw(raw).is_err() {
            return Err(ConfigError::ResetPrivilege(raw));
        }
        Ok(())
    }

    /// Returns the effective maximum `misa` value, including the `MXL` field.
    pub fn max_isa(&self) -> u64 {
        self.max_isa.unwrap_or_else(|| {
            misa_mxl(self.xlen)
                | MISA_EXT_I
                | MISA_EXT_M
                | MISA_EXT_A
                | MISA_EXT_F
                | MISA_EXT_D
                | MISA_EXT_C
                | MISA_EXT_S
                | MISA_EXT_U
        })
    }

    /// Returns the effective physical-address width.
    pub fn phys_addr_bits(&self) -> u32 {
        self.phys_addr_bits.unwrap_or(match self.xlen {
            Xlen::Rv32 => defaults::PHYS_ADDR_BITS_RV32,
            Xlen::Rv64 => defaults::PHYS_ADDR_BITS_RV64,
        })
    }

    /// Returns the raw reset privilege level.
    pub fn reset_privilege_raw(&self) -> u64 {
        self.reset_privilege.unwrap_or(defaults::RESET_PRIVILEGE)
    }
}
