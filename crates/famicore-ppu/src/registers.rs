//! PPU control, mask, and status registers.
//!
//! ```text
//! PPUCTRL ($2000, write)      PPUMASK ($2001, write)
//! 7  bit  0                   7  bit  0
//! VPHB SINN                   BGRs bMmG
//! |||| ||++- nametable base   |||| |||+- greyscale
//! |||| |+--- VRAM increment   |||| ||+-- show BG in left 8 px
//! |||| +---- sprite table     |||| |+--- show sprites in left 8 px
//! |||+------ BG table         |||| +---- show background
//! ||+------- sprite size      |||+------ show sprites
//! |+-------- master/slave     ||+------- emphasize red
//! +--------- NMI enable       |+-------- emphasize green
//!                             +--------- emphasize blue
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// PPUCTRL ($2000), write-only.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Ctrl: u8 {
        /// Nametable select, bit 0.
        const NAMETABLE_LO = 0x01;
        /// Nametable select, bit 1.
        const NAMETABLE_HI = 0x02;
        /// VRAM address increment: 0 adds 1, 1 adds 32.
        const VRAM_INCREMENT = 0x04;
        /// Sprite pattern table for 8x8 sprites.
        const SPRITE_TABLE = 0x08;
        /// Background pattern table.
        const BG_TABLE = 0x10;
        /// Sprite size: 0 is 8x8, 1 is 8x16.
        const SPRITE_SIZE = 0x20;
        /// Master/slave select; ignored on the NES.
        const MASTER_SLAVE = 0x40;
        /// Raise NMI at the start of vblank.
        const NMI_ENABLE = 0x80;
    }
}

impl Ctrl {
    /// VRAM address step per PPUDATA access.
    #[inline]
    #[must_use]
    pub fn vram_increment(self) -> u16 {
        if self.contains(Self::VRAM_INCREMENT) {
            32
        } else {
            1
        }
    }

    /// Pattern table base for 8x8 sprites.
    #[inline]
    #[must_use]
    pub fn sprite_table_base(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Background pattern table base.
    #[inline]
    #[must_use]
    pub fn bg_table_base(self) -> u16 {
        if self.contains(Self::BG_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite height in pixels (8 or 16).
    #[inline]
    #[must_use]
    pub fn sprite_height(self) -> u8 {
        if self.contains(Self::SPRITE_SIZE) {
            16
        } else {
            8
        }
    }

    /// True when vblank should raise NMI.
    #[inline]
    #[must_use]
    pub fn nmi_enabled(self) -> bool {
        self.contains(Self::NMI_ENABLE)
    }
}

bitflags! {
    /// PPUMASK ($2001), write-only.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Mask: u8 {
        /// Greyscale output.
        const GREYSCALE = 0x01;
        /// Show background in the left 8 pixels.
        const BG_LEFT = 0x02;
        /// Show sprites in the left 8 pixels.
        const SPRITE_LEFT = 0x04;
        /// Enable background rendering.
        const SHOW_BG = 0x08;
        /// Enable sprite rendering.
        const SHOW_SPRITES = 0x10;
        /// Emphasize red.
        const EMPHASIZE_RED = 0x20;
        /// Emphasize green.
        const EMPHASIZE_GREEN = 0x40;
        /// Emphasize blue.
        const EMPHASIZE_BLUE = 0x80;
    }
}

impl Mask {
    /// True when either background or sprites are enabled.
    #[inline]
    #[must_use]
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Self::SHOW_BG | Self::SHOW_SPRITES)
    }
}

bitflags! {
    /// PPUSTATUS ($2002), read-only. Bits 0-4 are open bus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Status: u8 {
        /// More than eight sprites landed on a scanline.
        const SPRITE_OVERFLOW = 0x20;
        /// An opaque sprite-0 pixel overlapped an opaque background pixel.
        const SPRITE_ZERO_HIT = 0x40;
        /// Currently in vertical blank.
        const VBLANK = 0x80;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ctrl_decoding() {
        let ctrl = Ctrl::from_bits_truncate(0x80 | 0x20 | 0x04);
        assert!(ctrl.nmi_enabled());
        assert_eq!(ctrl.sprite_height(), 16);
        assert_eq!(ctrl.vram_increment(), 32);
        assert_eq!(ctrl.bg_table_base(), 0x0000);

        let ctrl = Ctrl::from_bits_truncate(0x10 | 0x08);
        assert_eq!(ctrl.bg_table_base(), 0x1000);
        assert_eq!(ctrl.sprite_table_base(), 0x1000);
        assert_eq!(ctrl.vram_increment(), 1);
    }

    #[test]
    fn mask_rendering_enabled() {
        assert!(!Mask::empty().rendering_enabled());
        assert!(Mask::SHOW_BG.rendering_enabled());
        assert!(Mask::SHOW_SPRITES.rendering_enabled());
    }

    #[test]
    fn status_bits() {
        let status = Status::VBLANK | Status::SPRITE_ZERO_HIT;
        assert_eq!(status.bits() & 0xC0, 0xC0);
    }
}
