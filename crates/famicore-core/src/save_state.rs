//! Versioned save states.
//!
//! A save state is a self-describing record of CPU, PPU, APU, bus, SRAM,
//! and mapper state, framed as:
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ magic   "FCSS"   (4 bytes)   │
//! │ version u32 LE   (4 bytes)   │
//! ├──────────────────────────────┤
//! │ postcard payload (variable)  │
//! └──────────────────────────────┘
//! ```
//!
//! Loaders reject unknown major versions and refuse states recorded from a
//! different cartridge; a failed load leaves the emulator untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use famicore_apu::Apu;
use famicore_cpu::CpuState;
use famicore_mappers::MapperState;
use famicore_ppu::PpuState;

use crate::bus::BusState;

/// Magic bytes at the start of a save-state blob.
pub const SAVE_STATE_MAGIC: &[u8; 4] = b"FCSS";

/// Current save-state major version.
pub const SAVE_STATE_VERSION: u32 = 1;

/// Save-state errors.
#[derive(Debug, Error)]
pub enum SaveStateError {
    /// Blob does not start with the FCSS magic.
    #[error("invalid save-state magic (expected 'FCSS')")]
    InvalidMagic,

    /// Blob was written by an incompatible major version.
    #[error("unsupported save-state version {0} (current: {SAVE_STATE_VERSION})")]
    UnsupportedVersion(u32),

    /// Payload failed to decode.
    #[error("corrupt save state: {0}")]
    Corrupt(String),

    /// State was recorded from a different cartridge.
    #[error("save state belongs to a different cartridge")]
    CartridgeMismatch,
}

/// Complete machine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState {
    /// md5 digest of the cartridge this state belongs to.
    pub cartridge_hash: [u8; 16],
    /// CPU registers and signals.
    pub cpu: CpuState,
    /// PPU state including the fetch pipeline.
    pub ppu: PpuState,
    /// Whole APU (channels, frame counter, resampler).
    pub apu: Apu,
    /// Bus RAM, open bus, pending signals, controllers.
    pub bus: BusState,
    /// Battery/work RAM contents.
    pub sram: Vec<u8>,
    /// CHR-RAM contents; empty for CHR-ROM cartridges.
    pub chr_ram: Vec<u8>,
    /// Mapper banking and IRQ registers.
    pub mapper: MapperState,
    /// Frames presented so far.
    pub frame_count: u64,
}

impl SaveState {
    /// Serialize with the framing header.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SaveStateError> {
        let payload =
            postcard::to_stdvec(self).map_err(|err| SaveStateError::Corrupt(err.to_string()))?;

        let mut bytes = Vec::with_capacity(8 + payload.len());
        bytes.extend_from_slice(SAVE_STATE_MAGIC);
        bytes.extend_from_slice(&SAVE_STATE_VERSION.to_le_bytes());
        bytes.extend_from_slice(&payload);
        Ok(bytes)
    }

    /// Parse a framed blob, validating magic and version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SaveStateError> {
        if bytes.len() < 8 || &bytes[0..4] != SAVE_STATE_MAGIC {
            return Err(SaveStateError::InvalidMagic);
        }

        let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        if version != SAVE_STATE_VERSION {
            return Err(SaveStateError::UnsupportedVersion(version));
        }

        postcard::from_bytes(&bytes[8..]).map_err(|err| SaveStateError::Corrupt(err.to_string()))
    }
}
