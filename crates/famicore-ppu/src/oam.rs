//! Object Attribute Memory: the 64-entry sprite list.
//!
//! Each sprite is four bytes:
//!
//! ```text
//! Byte 0: Y position (top of sprite minus 1)
//! Byte 1: tile index (8x16 mode: bit 0 selects the pattern table)
//! Byte 2: attributes
//!   76543210
//!   |||   ++- palette (sprite palettes 4-7)
//!   ||+------ priority (1: behind background)
//!   |+------- flip horizontally
//!   +-------- flip vertically
//! Byte 3: X position
//! ```
//!
//! Attribute bits 2-4 do not physically exist; they read back as zero.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Sprite attribute byte.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct SpriteAttributes: u8 {
        /// Palette select, bit 0.
        const PALETTE_LO = 0x01;
        /// Palette select, bit 1.
        const PALETTE_HI = 0x02;
        /// Sprite renders behind opaque background pixels.
        const BEHIND_BACKGROUND = 0x20;
        /// Mirror the sprite horizontally.
        const FLIP_HORIZONTAL = 0x40;
        /// Mirror the sprite vertically.
        const FLIP_VERTICAL = 0x80;
    }
}

impl SpriteAttributes {
    /// Sprite palette index (4-7).
    #[inline]
    #[must_use]
    pub fn palette(self) -> u8 {
        (self.bits() & 0x03) + 4
    }
}

/// One decoded sprite entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprite {
    /// Y position (top minus 1).
    pub y: u8,
    /// Tile index.
    pub tile: u8,
    /// Attribute byte.
    pub attributes: SpriteAttributes,
    /// X position.
    pub x: u8,
    /// Index of this sprite in primary OAM (0 is the sprite-0-hit sprite).
    pub oam_index: u8,
}

impl Sprite {
    /// Decode four OAM bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8], oam_index: u8) -> Self {
        Self {
            y: bytes[0],
            tile: bytes[1],
            attributes: SpriteAttributes::from_bits_truncate(bytes[2]),
            x: bytes[3],
            oam_index,
        }
    }

    /// True when this sprite covers `scanline` given the current height.
    #[must_use]
    pub fn covers_scanline(&self, scanline: u16, height: u8) -> bool {
        let top = u16::from(self.y);
        scanline >= top && scanline < top + u16::from(height)
    }
}

/// Bits of the attribute byte that physically exist in OAM.
const ATTRIBUTE_MASK: u8 = 0xE3;

/// Primary OAM: 256 bytes, 64 sprites, plus the OAMADDR pointer.
#[derive(Debug, Clone)]
pub struct Oam {
    data: Vec<u8>,
    addr: u8,
}

impl Oam {
    /// Fresh zeroed OAM.
    #[must_use]
    pub fn new() -> Self {
        Self {
            data: vec![0; 256],
            addr: 0,
        }
    }

    /// Set OAMADDR ($2003).
    pub fn set_addr(&mut self, addr: u8) {
        self.addr = addr;
    }

    /// Current OAMADDR.
    #[must_use]
    pub fn addr(&self) -> u8 {
        self.addr
    }

    /// OAMDATA read ($2004); does not advance the address.
    #[must_use]
    pub fn read(&self) -> u8 {
        self.data[self.addr as usize]
    }

    /// OAMDATA write ($2004); advances the address.
    pub fn write(&mut self, value: u8) {
        let value = if self.addr % 4 == 2 {
            value & ATTRIBUTE_MASK
        } else {
            value
        };
        self.data[self.addr as usize] = value;
        self.addr = self.addr.wrapping_add(1);
    }

    /// OAM DMA: copy a 256-byte page starting at the current OAMADDR.
    pub fn dma_write(&mut self, page: &[u8; 256]) {
        for &byte in page {
            self.write(byte);
        }
    }

    /// Raw OAM contents.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Restore raw contents from a save state.
    pub fn restore(&mut self, data: &[u8], addr: u8) {
        if data.len() == self.data.len() {
            self.data.copy_from_slice(data);
        }
        self.addr = addr;
    }
}

impl Default for Oam {
    fn default() -> Self {
        Self::new()
    }
}

/// Secondary OAM: up to eight sprites selected for the next scanline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecondaryOam {
    sprites: Vec<Sprite>,
}

impl SecondaryOam {
    /// Capacity in sprites (32 bytes).
    pub const CAPACITY: usize = 8;

    /// Empty secondary OAM.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sprites: Vec::with_capacity(Self::CAPACITY),
        }
    }

    /// Drop all selected sprites (dot 65 of each visible scanline).
    pub fn clear(&mut self) {
        self.sprites.clear();
    }

    /// Add a sprite. Returns false when already full (overflow condition).
    pub fn push(&mut self, sprite: Sprite) -> bool {
        if self.sprites.len() < Self::CAPACITY {
            self.sprites.push(sprite);
            true
        } else {
            false
        }
    }

    /// Selected sprites, in OAM order.
    #[must_use]
    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites
    }

    /// Number of selected sprites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    /// True when no sprites were selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }
}
