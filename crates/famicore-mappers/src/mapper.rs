//! Mapper trait and shared types.
//!
//! A mapper translates logical PRG addresses (CPU $4020-$FFFF) and CHR
//! addresses (PPU $0000-$1FFF) to cartridge storage, decodes bank-switch
//! register writes, and may count CPU cycles or scanlines to raise IRQs.

use serde::{Deserialize, Serialize};

use crate::cartridge::Cartridge;

/// Nametable mirroring mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mirroring {
    /// $2000/$2400 share one table, $2800/$2C00 the other.
    #[default]
    Horizontal,
    /// $2000/$2800 share one table, $2400/$2C00 the other.
    Vertical,
    /// All four quadrants map to the lower physical table.
    SingleLower,
    /// All four quadrants map to the upper physical table.
    SingleUpper,
    /// Four distinct tables (cartridge-provided VRAM).
    FourScreen,
}

/// Snapshot of mapper-internal registers for save states.
///
/// CHR-RAM and SRAM contents are captured separately through the cartridge;
/// these variants carry only the banking and IRQ registers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapperState {
    /// NROM has no registers.
    Nrom,
    /// MMC1 serial port and bank registers.
    Mmc1 {
        /// In-flight shift register.
        shift: u8,
        /// Bits accumulated in the shift register.
        shift_count: u8,
        /// Control register ($8000-$9FFF).
        control: u8,
        /// CHR bank 0 register.
        chr_bank_0: u8,
        /// CHR bank 1 register.
        chr_bank_1: u8,
        /// PRG bank register.
        prg_bank: u8,
    },
    /// UxROM PRG bank select.
    Uxrom {
        /// Switchable 16 KiB bank at $8000.
        prg_bank: u8,
    },
    /// CNROM CHR bank select.
    Cnrom {
        /// 8 KiB CHR bank.
        chr_bank: u8,
    },
    /// MMC3 banking and IRQ state.
    Mmc3 {
        /// Bank-select register ($8000).
        bank_select: u8,
        /// R0-R7 bank registers.
        banks: [u8; 8],
        /// Mirroring register ($A000).
        mirroring: u8,
        /// IRQ reload latch ($C000).
        irq_latch: u8,
        /// Scanline counter.
        irq_counter: u8,
        /// Counter reload requested ($C001).
        irq_reload: bool,
        /// IRQ generation enabled ($E001).
        irq_enabled: bool,
        /// IRQ line asserted.
        irq_pending: bool,
    },
    /// AxROM PRG bank and nametable select.
    Axrom {
        /// Switchable 32 KiB bank.
        prg_bank: u8,
        /// True when the upper nametable is selected.
        upper_nametable: bool,
    },
}

/// Cartridge address translation.
///
/// The default implementations make simple mappers cheap: no IRQs, no
/// timing hooks, no reset side effects.
pub trait Mapper {
    /// Read from CPU address space ($4020-$FFFF; $6000-$7FFF is SRAM).
    fn read_prg(&self, addr: u16) -> u8;

    /// Write to CPU address space; $8000+ usually hits bank registers.
    fn write_prg(&mut self, addr: u16, value: u8);

    /// Read from PPU pattern space ($0000-$1FFF).
    fn read_chr(&self, addr: u16) -> u8;

    /// Write to PPU pattern space (CHR-RAM only).
    fn write_chr(&mut self, addr: u16, value: u8);

    /// Current nametable mirroring.
    fn mirroring(&self) -> Mirroring;

    /// Advance mapper timing by CPU cycles.
    fn step_cycles(&mut self, _cycles: u8) {}

    /// Notify the mapper that the PPU finished a rendered scanline.
    /// MMC3 clocks its IRQ counter here.
    fn notify_scanline(&mut self) {}

    /// True while the mapper asserts its IRQ line.
    fn irq_pending(&self) -> bool {
        false
    }

    /// Deassert the mapper IRQ line.
    fn irq_acknowledge(&mut self) {}

    /// The owned cartridge.
    fn cartridge(&self) -> &Cartridge;

    /// Mutable access to the owned cartridge (SRAM persistence, renaming).
    fn cartridge_mut(&mut self) -> &mut Cartridge;

    /// Snapshot mapper registers.
    fn save_state(&self) -> MapperState;

    /// Restore mapper registers. Mismatched variants are ignored; the
    /// caller validates the cartridge identity first.
    fn load_state(&mut self, state: &MapperState);

    /// Return registers to power-on values.
    fn reset(&mut self) {}
}
