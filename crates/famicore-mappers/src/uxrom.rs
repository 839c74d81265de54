//! Mapper 2: UxROM.
//!
//! 16 KiB switchable PRG bank at $8000, last bank fixed at $C000. CHR is
//! always 8 KiB of RAM (or unbanked ROM on a few boards).

use crate::cartridge::{Cartridge, PRG_BANK_SIZE};
use crate::mapper::{Mapper, MapperState, Mirroring};

/// UxROM (mapper 2).
pub struct Uxrom {
    cart: Cartridge,
    prg_bank: u8,
}

impl Uxrom {
    /// Wrap a cartridge in UxROM translation.
    #[must_use]
    pub fn new(cart: Cartridge) -> Self {
        Self { cart, prg_bank: 0 }
    }

    fn bank_base(&self, bank: usize) -> usize {
        (bank % self.cart.prg_banks()) * PRG_BANK_SIZE
    }
}

impl Mapper for Uxrom {
    fn read_prg(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.cart.read_sram((addr - 0x6000) as usize),
            0x8000..=0xBFFF => {
                let base = self.bank_base(self.prg_bank as usize);
                self.cart.prg_rom()[base + (addr as usize - 0x8000)]
            }
            0xC000..=0xFFFF => {
                let base = self.bank_base(self.cart.prg_banks() - 1);
                self.cart.prg_rom()[base + (addr as usize - 0xC000)]
            }
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.cart.write_sram((addr - 0x6000) as usize, value),
            0x8000..=0xFFFF => self.prg_bank = value,
            _ => {}
        }
    }

    fn read_chr(&self, addr: u16) -> u8 {
        self.cart.chr()[addr as usize & 0x1FFF]
    }

    fn write_chr(&mut self, addr: u16, value: u8) {
        self.cart.write_chr(addr as usize & 0x1FFF, value);
    }

    fn mirroring(&self) -> Mirroring {
        self.cart.mirroring()
    }

    fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cart
    }

    fn save_state(&self) -> MapperState {
        MapperState::Uxrom {
            prg_bank: self.prg_bank,
        }
    }

    fn load_state(&mut self, state: &MapperState) {
        if let MapperState::Uxrom { prg_bank } = state {
            self.prg_bank = *prg_bank;
        }
    }

    fn reset(&mut self) {
        self.prg_bank = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::build_ines;

    fn uxrom_with_banks(banks: u8) -> Uxrom {
        // build_ines fills each PRG bank with its index.
        Uxrom::new(Cartridge::from_ines(&build_ines(banks, 0, 2, 0)).unwrap())
    }

    #[test]
    fn switchable_window_follows_bank_register() {
        let mut uxrom = uxrom_with_banks(4);
        assert_eq!(uxrom.read_prg(0x8000), 0);
        uxrom.write_prg(0x8000, 2);
        assert_eq!(uxrom.read_prg(0x8000), 2);
    }

    #[test]
    fn fixed_window_is_last_bank() {
        let mut uxrom = uxrom_with_banks(4);
        assert_eq!(uxrom.read_prg(0xC000), 3);
        uxrom.write_prg(0x8000, 1);
        assert_eq!(uxrom.read_prg(0xC000), 3, "fixed bank unaffected");
    }

    #[test]
    fn bank_select_wraps_at_bank_count() {
        let mut uxrom = uxrom_with_banks(4);
        uxrom.write_prg(0x8000, 6);
        assert_eq!(uxrom.read_prg(0x8000), 2);
    }

    #[test]
    fn state_round_trip() {
        let mut uxrom = uxrom_with_banks(4);
        uxrom.write_prg(0x8000, 3);
        let state = uxrom.save_state();

        uxrom.reset();
        assert_eq!(uxrom.read_prg(0x8000), 0);
        uxrom.load_state(&state);
        assert_eq!(uxrom.read_prg(0x8000), 3);
    }
}
