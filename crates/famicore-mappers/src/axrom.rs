//! Mapper 7: AxROM.
//!
//! 32 KiB PRG banks switched as a unit; writes also pick which single
//! nametable the whole background uses (single-screen mirroring).

use crate::cartridge::Cartridge;
use crate::mapper::{Mapper, MapperState, Mirroring};

const PRG_WINDOW: usize = 0x8000;

/// AxROM (mapper 7).
pub struct Axrom {
    cart: Cartridge,
    prg_bank: u8,
    upper_nametable: bool,
}

impl Axrom {
    /// Wrap a cartridge in AxROM translation.
    #[must_use]
    pub fn new(cart: Cartridge) -> Self {
        Self {
            cart,
            prg_bank: 0,
            upper_nametable: false,
        }
    }

    fn prg_base(&self) -> usize {
        let banks = (self.cart.prg_rom().len() / PRG_WINDOW).max(1);
        (self.prg_bank as usize % banks) * PRG_WINDOW
    }
}

impl Mapper for Axrom {
    fn read_prg(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => self.cart.read_sram((addr - 0x6000) as usize),
            0x8000..=0xFFFF => self.cart.prg_rom()[self.prg_base() + (addr as usize - 0x8000)],
            _ => 0,
        }
    }

    fn write_prg(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => self.cart.write_sram((addr - 0x6000) as usize, value),
            0x8000..=0xFFFF => {
                self.prg_bank = value & 0x07;
                self.upper_nametable = value & 0x10 != 0;
            }
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
        if self.upper_nametable {
            Mirroring::SingleUpper
        } else {
            Mirroring::SingleLower
        }
    }

    fn cartridge(&self) -> &Cartridge {
        &self.cart
    }

    fn cartridge_mut(&mut self) -> &mut Cartridge {
        &mut self.cart
    }

    fn save_state(&self) -> MapperState {
        MapperState::Axrom {
            prg_bank: self.prg_bank,
            upper_nametable: self.upper_nametable,
        }
    }

    fn load_state(&mut self, state: &MapperState) {
        if let MapperState::Axrom {
            prg_bank,
            upper_nametable,
        } = state
        {
            self.prg_bank = *prg_bank;
            self.upper_nametable = *upper_nametable;
        }
    }

    fn reset(&mut self) {
        self.prg_bank = 0;
        self.upper_nametable = false;
    }
}
