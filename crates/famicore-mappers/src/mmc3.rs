//! Mapper 4: MMC3.
//!
//! Fine-grained banking (8 KiB PRG, 1 KiB CHR) plus the scanline IRQ
//! counter used for status bars and split screens. The counter is clocked
//! once per rendered scanline; when it decrements to zero with IRQs
//! enabled, the mapper asserts the CPU IRQ line until acknowledged.

use crate::cartridge::Cartridge;
use crate::mapper::{Mapper, MapperState, Mirroring};

const PRG_8K: usize = 0x2000;
const CHR_1K: usize = 0x0400;

/// MMC3 (mapper 4).
pub struct Mmc3 {
    cart: Cartridge,
    /// Bank select: register index (0-2), PRG mode (6), CHR mode (7).
    bank_select: u8,
    /// R0-R7 bank registers.
    banks: [u8; 8],
    /// $A000 mirroring register (bit 0).
    mirroring: u8,
    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,
}

impl Mmc3 {
    /// Wrap a cartridge in MMC3 translation.
    #[must_use]
    pub fn new(cart: Cartridge) -> Self {
        Self {
            cart,
            bank_select: 0,
            banks: [0; 8],
            mirroring: 0,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
        }
    }

    fn prg_bank_count(&self) -> usize {
        self.cart.prg_rom().len() / PRG_8K
    }

    /// Map a CPU window ($8000/$A000/$C000/$E000) to an 8 KiB PRG bank.
    fn prg_bank_for(&self, window: usize) -> usize {
        let count = self.prg_bank_count();
        let swap = self.bank_select & 0x40 != 0;
        let bank = match (window, swap) {
            (0, false) | (2, true) => self.banks[6] as usize,
            (0, true) | (2, false) => count - 2,
            (1, _) => self.banks[7] as usize,
            _ => count - 1,
        };
        bank % count
    }

    /// Map a PPU address to a CHR offset honoring the CHR A12 inversion.
    fn chr_offset(&self, addr: u16) -> usize {
        let addr = addr as usize & 0x1FFF;
        let invert = self.bank_select & 0x80 != 0;
        let region = if invert { addr ^ 0x1000 } else { addr };

        let bank = match region {
            // Two 2 KiB windows (R0, R1); bit 0 of the register is ignored.
            0x0000..=0x07FF => (self.banks[0] & 0xFE) as usize * CHR_1K + (region & 0x07FF),
            0x0800..=0x0FFF => (self.banks[1] & 0xFE) as usize * CHR_1K + (region & 0x07FF),
            // Four 1 KiB windows (R2-R5).
            0x1000..=0x13FF => self.banks[2] as usize * CHR_1K + (region & 0x03FF),
            0x1400..=0x17FF => self.banks[3] as usize * CHR_1K + (region & 0x03FF),
            0x1800..=0x1BFF => self.banks[4] as usize * CHR_1K + (region & 0x03FF),
            _ => self.banks[5] as usize * CHR_1K + (region & 0x03FF),
        };
        bank % self.cart.chr().len()
    }
}

impl Mapper for Mmc3 {
    fn read_prg(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.cart.read_sram((addr - 0x6000) as usize),
            0x8000..=0xFFFF => {
                let window = (addr as usize - 0x8000) / PRG_8K;
                let base = self.prg_bank_for(window) * PRG_8K;
                self.cart.prg_rom()[base + (addr as usize & 0x1FFF)]
            }
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        match (addr, addr & 1) {
            (0x6000..=0x7FFF, _) => self.cart.write_sram((addr - 0x6000) as usize, value),
            (0x8000..=0x9FFF, 0) => self.bank_select = value,
            (0x8000..=0x9FFF, _) => {
                self.banks[(self.bank_select & 0x07) as usize] = value;
            }
            (0xA000..=0xBFFF, 0) => self.mirroring = value & 0x01,
            (0xA000..=0xBFFF, _) => {
                // PRG-RAM protect; write protection is not modeled.
            }
            (0xC000..=0xDFFF, 0) => self.irq_latch = value,
            (0xC000..=0xDFFF, _) => self.irq_reload = true,
            (0xE000..=0xFFFF, 0) => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            (0xE000..=0xFFFF, _) => self.irq_enabled = true,
            _ => {}
        }
    }

    fn read_chr(&self, addr: u16) -> u8 {
        self.cart.chr()[self.chr_offset(addr)]
    }

    fn write_chr(&mut self, addr: u16, value: u8) {
        let offset = self.chr_offset(addr);
        self.cart.write_chr(offset, value);
    }

    fn mirroring(&self) -> Mirroring {
        if self.cart.mirroring() == Mirroring::FourScreen {
            Mirroring::FourScreen
        } else if self.mirroring & 0x01 == 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }

    fn notify_scanline(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }

        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    fn irq_acknowledge(&mut self) {
        self.irq_pending = false;
    }

    fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cart
    }

    fn save_state(&self) -> MapperState {
        MapperState::Mmc3 {
            bank_select: self.bank_select,
            banks: self.banks,
            mirroring: self.mirroring,
            irq_latch: self.irq_latch,
            irq_counter: self.irq_counter,
            irq_reload: self.irq_reload,
            irq_enabled: self.irq_enabled,
            irq_pending: self.irq_pending,
        }
    }

    fn load_state(&mut self, state: &MapperState) {
        if let MapperState::Mmc3 {
            bank_select,
            banks,
            mirroring,
            irq_latch,
            irq_counter,
            irq_reload,
            irq_enabled,
            irq_pending,
        } = state
        {
            self.bank_select = *bank_select;
            self.banks = *banks;
            self.mirroring = *mirroring;
            self.irq_latch = *irq_latch;
            self.irq_counter = *irq_counter;
            self.irq_reload = *irq_reload;
            self.irq_enabled = *irq_enabled;
            self.irq_pending = *irq_pending;
        }
    }

    fn reset(&mut self) {
        self.bank_select = 0;
        self.banks = [0; 8];
        self.mirroring = 0;
        self.irq_latch = 0;
        self.irq_counter = 0;
        self.irq_reload = false;
        self.irq_enabled = false;
        self.irq_pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::build_ines;

    fn mmc3_with_banks(prg_16k: u8, chr_8k: u8) -> Mmc3 {
        Mmc3::new(Cartridge::from_ines(&build_ines(prg_16k, chr_8k, 4, 0)).unwrap())
    }

    fn set_bank(mmc3: &mut Mmc3, register: u8, value: u8) {
        mmc3.write_prg(0x8000, register);
        mmc3.write_prg(0x8001, value);
    }

    #[test]
    fn prg_mode_0_layout() {
        // 4 x 16 KiB = 8 x 8 KiB banks; build_ines marks each 16 KiB bank.
        let mut mmc3 = mmc3_with_banks(4, 1);
        set_bank(&mut mmc3, 6, 2);
        set_bank(&mut mmc3, 7, 3);

        assert_eq!(mmc3.read_prg(0x8000), 1, "R6 -> 8 KiB bank 2");
        assert_eq!(mmc3.read_prg(0xA000), 1, "R7 -> 8 KiB bank 3");
        assert_eq!(mmc3.read_prg(0xC000), 3, "second-to-last fixed");
        assert_eq!(mmc3.read_prg(0xE000), 3, "last fixed");
    }

    #[test]
    fn prg_mode_1_swaps_windows() {
        let mut mmc3 = mmc3_with_banks(4, 1);
        set_bank(&mut mmc3, 6, 0);
        mmc3.write_prg(0x8000, 0x46); // PRG swap mode, register 6
        mmc3.write_prg(0x8001, 0);

        assert_eq!(mmc3.read_prg(0x8000), 3, "$8000 now second-to-last");
        assert_eq!(mmc3.read_prg(0xC000), 0, "$C000 now R6");
    }

    #[test]
    fn mirroring_register() {
        let mut mmc3 = mmc3_with_banks(2, 1);
        mmc3.write_prg(0xA000, 0x00);
        assert_eq!(mmc3.mirroring(), Mirroring::Vertical);
        mmc3.write_prg(0xA000, 0x01);
        assert_eq!(mmc3.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn scanline_counter_raises_irq() {
        let mut mmc3 = mmc3_with_banks(2, 1);
        mmc3.write_prg(0xC000, 3); // latch
        mmc3.write_prg(0xC001, 0); // reload on next clock
        mmc3.write_prg(0xE001, 0); // enable

        // Clock 1 reloads to 3, clocks 2-4 count down to 0.
        for _ in 0..3 {
            mmc3.notify_scanline();
            assert!(!mmc3.irq_pending());
        }
        mmc3.notify_scanline();
        assert!(mmc3.irq_pending());

        mmc3.irq_acknowledge();
        assert!(!mmc3.irq_pending());
    }

    #[test]
    fn irq_disable_acknowledges() {
        let mut mmc3 = mmc3_with_banks(2, 1);
        mmc3.write_prg(0xC000, 1);
        mmc3.write_prg(0xC001, 0);
        mmc3.write_prg(0xE001, 0);
        mmc3.notify_scanline();
        mmc3.notify_scanline();
        assert!(mmc3.irq_pending());

        mmc3.write_prg(0xE000, 0);
        assert!(!mmc3.irq_pending());
    }

    #[test]
    fn chr_inversion_swaps_pattern_halves() {
        let mut mmc3 = mmc3_with_banks(2, 2); // 16 x 1 KiB CHR banks
        set_bank(&mut mmc3, 0, 0); // 2 KiB window at $0000 -> banks 0-1
        set_bank(&mut mmc3, 2, 8); // 1 KiB window at $1000 -> bank 8

        let plain_low = mmc3.read_chr(0x0000);
        let plain_high = mmc3.read_chr(0x1000);

        mmc3.write_prg(0x8000, 0x80); // invert A12
        assert_eq!(mmc3.read_chr(0x1000), plain_low);
        assert_eq!(mmc3.read_chr(0x0000), plain_high);
    }

    #[test]
    fn state_round_trip() {
        let mut mmc3 = mmc3_with_banks(4, 1);
        set_bank(&mut mmc3, 6, 2);
        mmc3.write_prg(0xC000, 5);
        let state = mmc3.save_state();

        mmc3.reset();
        mmc3.load_state(&state);
        assert_eq!(mmc3.read_prg(0x8000), 1);
        if let MapperState::Mmc3 { irq_latch, .. } = mmc3.save_state() {
            assert_eq!(irq_latch, 5);
        } else {
            panic!("wrong state variant");
        }
    }
}
