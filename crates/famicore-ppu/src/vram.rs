//! PPU-side memory: nametable CIRAM and palette RAM.
//!
//! The PPU address space routes $2000-$3EFF into 2 KiB of internal CIRAM
//! through the cartridge's mirroring mode, and $3F00-$3FFF into 32 bytes of
//! palette RAM. Pattern table traffic ($0000-$1FFF) belongs to the mapper
//! and never reaches this module.
//!
//! Palette mirroring: $3F10/$3F14/$3F18/$3F1C alias $3F00/$3F04/$3F08/$3F0C.

use serde::{Deserialize, Serialize};

/// Nametable mirroring as seen by the PPU.
///
/// Mirrors the cartridge-side enum; the core converts when wiring the two
/// crates together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mirroring {
    /// Two tables stacked vertically: $2000/$2400 share, $2800/$2C00 share.
    #[default]
    Horizontal,
    /// Two tables side by side: $2000/$2800 share, $2400/$2C00 share.
    Vertical,
    /// Everything maps to the lower table.
    SingleLower,
    /// Everything maps to the upper table.
    SingleUpper,
    /// Four distinct tables using extra VRAM.
    FourScreen,
}

/// Nametable and palette storage.
#[derive(Debug, Clone)]
pub struct Vram {
    /// 2 KiB internal nametable RAM.
    ciram: Vec<u8>,
    /// Extra 2 KiB for four-screen cartridges.
    four_screen: Vec<u8>,
    /// 32 bytes of palette RAM.
    palette: [u8; 32],
    mirroring: Mirroring,
}

impl Vram {
    /// Fresh VRAM with the given mirroring.
    #[must_use]
    pub fn new(mirroring: Mirroring) -> Self {
        Self {
            ciram: vec![0; 0x800],
            four_screen: if mirroring == Mirroring::FourScreen {
                vec![0; 0x800]
            } else {
                Vec::new()
            },
            palette: [0; 32],
            mirroring,
        }
    }

    /// Current mirroring mode.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Change the mirroring mode (mappers flip this at runtime).
    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.mirroring = mirroring;
        if mirroring == Mirroring::FourScreen && self.four_screen.is_empty() {
            self.four_screen = vec![0; 0x800];
        }
    }

    /// Map a $2000-$3EFF address to a physical CIRAM offset.
    ///
    /// The four logical quadrants collapse onto the two physical tables
    /// according to the mirror mode; four-screen uses all four.
    fn nametable_offset(&self, addr: u16) -> usize {
        let addr = addr as usize & 0x0FFF;
        let quadrant = addr / 0x400;
        let offset = addr & 0x3FF;

        let table = match self.mirroring {
            Mirroring::Horizontal => quadrant / 2,
            Mirroring::Vertical => quadrant % 2,
            Mirroring::SingleLower => 0,
            Mirroring::SingleUpper => 1,
            Mirroring::FourScreen => quadrant,
        };
        table * 0x400 + offset
    }

    /// Read a nametable byte.
    #[must_use]
    pub fn read_nametable(&self, addr: u16) -> u8 {
        let offset = self.nametable_offset(addr);
        if offset < 0x800 {
            self.ciram[offset]
        } else {
            self.four_screen[offset - 0x800]
        }
    }

    /// Write a nametable byte.
    pub fn write_nametable(&mut self, addr: u16, value: u8) {
        let offset = self.nametable_offset(addr);
        if offset < 0x800 {
            self.ciram[offset] = value;
        } else {
            self.four_screen[offset - 0x800] = value;
        }
    }

    /// Collapse a $3F00-$3FFF address to a palette index, applying the
    /// sprite-backdrop mirror rule.
    fn palette_index(addr: u16) -> usize {
        let mut index = addr as usize & 0x1F;
        if index >= 0x10 && index % 4 == 0 {
            index -= 0x10;
        }
        index
    }

    /// Read palette RAM.
    #[must_use]
    pub fn read_palette(&self, addr: u16) -> u8 {
        self.palette[Self::palette_index(addr)]
    }

    /// Write palette RAM.
    pub fn write_palette(&mut self, addr: u16, value: u8) {
        self.palette[Self::palette_index(addr)] = value;
    }

    /// Raw CIRAM contents (save states).
    #[must_use]
    pub fn ciram(&self) -> &[u8] {
        &self.ciram
    }

    /// Raw four-screen RAM contents, empty unless four-screen.
    #[must_use]
    pub fn four_screen(&self) -> &[u8] {
        &self.four_screen
    }

    /// Raw palette contents.
    #[must_use]
    pub fn palette(&self) -> &[u8; 32] {
        &self.palette
    }

    /// Restore raw contents from a save state.
    pub fn restore(&mut self, ciram: &[u8], four_screen: &[u8], palette: &[u8]) {
        if ciram.len() == self.ciram.len() {
            self.ciram.copy_from_slice(ciram);
        } else {
            log::warn!("CIRAM snapshot is {} bytes, expected 2048", ciram.len());
        }
        if four_screen.len() == self.four_screen.len() {
            self.four_screen.copy_from_slice(four_screen);
        } else if !four_screen.is_empty() {
            self.four_screen = four_screen.to_vec();
        }
        if palette.len() == 32 {
            self.palette.copy_from_slice(palette);
        }
    }
}

/// Serde helper mirroring `Vram` with owned buffers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VramState {
    /// CIRAM contents.
    pub ciram: Vec<u8>,
    /// Four-screen RAM contents.
    pub four_screen: Vec<u8>,
    /// Palette RAM contents.
    pub palette: Vec<u8>,
    /// Mirroring mode.
    pub mirroring: Mirroring,
}
