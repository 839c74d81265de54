//! Mapper 0: NROM.
//!
//! No banking at all. 16 KiB PRG images are mirrored across the 32 KiB
//! window; CHR is a flat 8 KiB.

use crate::cartridge::Cartridge;
use crate::mapper::{Mapper, MapperState, Mirroring};

/// NROM (mapper 0).
pub struct Nrom {
    cart: Cartridge,
    prg_mask: usize,
}

impl Nrom {
    /// Wrap a cartridge in NROM translation.
    #[must_use]
    pub fn new(cart: Cartridge) -> Self {
        // 16 KiB images repeat at $C000; 32 KiB fills the window.
        let prg_mask = cart.prg_rom().len() - 1;
        Self { cart, prg_mask }
    }
}

impl Mapper for Nrom {
    fn read_prg(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.cart.read_sram((addr - 0x6000) as usize),
            0x8000..=0xFFFF => self.cart.prg_rom()[(addr as usize - 0x8000) & self.prg_mask],
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        if let 0x6000..=0x7FFF = addr {
            self.cart.write_sram((addr - 0x6000) as usize, value);
        }
        // No registers; ROM writes are ignored.
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
        MapperState::Nrom
    }

    fn load_state(&mut self, _state: &MapperState) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::build_ines;
    use crate::cartridge::PRG_BANK_SIZE;

    #[test]
    fn prg_16k_mirrors_to_upper_window() {
        let cart = Cartridge::from_ines(&build_ines(1, 1, 0, 0)).unwrap();
        let nrom = Nrom::new(cart);
        assert_eq!(nrom.read_prg(0x8000), nrom.read_prg(0xC000));
        assert_eq!(nrom.read_prg(0xBFFF), nrom.read_prg(0xFFFF));
    }

    #[test]
    fn prg_32k_is_flat() {
        let mut data = build_ines(2, 1, 0, 0);
        data[16] = 0x11; // first PRG byte
        data[16 + PRG_BANK_SIZE] = 0x22; // first byte of second bank
        let nrom = Nrom::new(Cartridge::from_ines(&data).unwrap());
        assert_eq!(nrom.read_prg(0x8000), 0x11);
        assert_eq!(nrom.read_prg(0xC000), 0x22);
    }

    #[test]
    fn rom_writes_ignored() {
        let cart = Cartridge::from_ines(&build_ines(1, 1, 0, 0)).unwrap();
        let mut nrom = Nrom::new(cart);
        let before = nrom.read_prg(0x8000);
        nrom.write_prg(0x8000, 0xFF);
        assert_eq!(nrom.read_prg(0x8000), before);
    }

    #[test]
    fn sram_window() {
        let cart = Cartridge::from_ines(&build_ines(1, 1, 0, 0)).unwrap();
        let mut nrom = Nrom::new(cart);
        nrom.write_prg(0x6010, 0x42);
        assert_eq!(nrom.read_prg(0x6010), 0x42);
    }
}
