//! Sprite evaluation and rendering.
//!
//! During dots 65-256 of each visible scanline the evaluator scans primary
//! OAM and collects up to eight sprites that cover the *next* scanline into
//! secondary OAM, flagging overflow past eight. During dots 257-320 the
//! pattern bytes for the selected sprites are fetched and loaded into the
//! renderer, which serves per-pixel lookups for the following scanline.

use serde::{Deserialize, Serialize};

use crate::oam::{SecondaryOam, Sprite, SpriteAttributes};

/// Scans primary OAM for sprites covering the next scanline.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SpriteEvaluator {
    /// Next OAM slot to examine (0-63).
    next_slot: u8,
    /// Sprite 0 was selected for the next scanline.
    sprite_zero_selected: bool,
    /// More than eight sprites were found.
    overflow: bool,
}

impl SpriteEvaluator {
    /// Fresh evaluator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin evaluation for a new scanline (dot 65).
    pub fn start(&mut self) {
        self.next_slot = 0;
        self.sprite_zero_selected = false;
        self.overflow = false;
    }

    /// Examine one OAM slot. Called once per evaluation dot; slots past 63
    /// are no-ops. Returns true when the overflow flag was newly raised.
    pub fn step(
        &mut self,
        oam: &[u8],
        target_scanline: u16,
        sprite_height: u8,
        secondary: &mut SecondaryOam,
    ) -> bool {
        if self.next_slot >= 64 {
            return false;
        }

        let slot = self.next_slot;
        self.next_slot += 1;

        let base = usize::from(slot) * 4;
        let sprite = Sprite::from_bytes(&oam[base..base + 4], slot);
        if !sprite.covers_scanline(target_scanline, sprite_height) {
            return false;
        }

        if secondary.push(sprite) {
            if slot == 0 {
                self.sprite_zero_selected = true;
            }
            false
        } else if self.overflow {
            false
        } else {
            self.overflow = true;
            true
        }
    }

    /// True when sprite 0 made the cut for the next scanline.
    #[must_use]
    pub fn sprite_zero_selected(&self) -> bool {
        self.sprite_zero_selected
    }
}

/// A sprite pixel produced by the renderer.
#[derive(Debug, Clone, Copy)]
pub struct SpritePixel {
    /// 2-bit pattern value (never 0).
    pub pattern: u8,
    /// Palette index (4-7).
    pub palette: u8,
    /// Sprite renders behind opaque background.
    pub behind_background: bool,
    /// This pixel belongs to OAM sprite 0.
    pub sprite_zero: bool,
}

/// One loaded sprite: pattern row plus position and attributes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SpriteUnit {
    x: u8,
    pattern_lo: u8,
    pattern_hi: u8,
    attributes: SpriteAttributes,
    sprite_zero: bool,
}

/// Holds the eight sprite pattern rows for the current scanline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpriteRenderer {
    units: Vec<SpriteUnit>,
}

impl SpriteRenderer {
    /// Fresh renderer with no sprites loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the previous scanline's sprites (dot 257).
    pub fn clear(&mut self) {
        self.units.clear();
    }

    /// Load one sprite's pattern row. The pattern bytes must already be
    /// horizontally flipped when the attribute asks for it.
    pub fn load(&mut self, sprite: &Sprite, pattern_lo: u8, pattern_hi: u8) {
        self.units.push(SpriteUnit {
            x: sprite.x,
            pattern_lo,
            pattern_hi,
            attributes: sprite.attributes,
            sprite_zero: sprite.oam_index == 0,
        });
    }

    /// Highest-priority opaque sprite pixel at screen column `x`.
    ///
    /// Sprites earlier in OAM win ties regardless of the behind-background
    /// bit; priority against the background is resolved by the caller.
    #[must_use]
    pub fn pixel(&self, x: u16) -> Option<SpritePixel> {
        for unit in &self.units {
            let offset = x.wrapping_sub(u16::from(unit.x));
            if offset >= 8 {
                continue;
            }
            let bit = 7 - offset;
            let p0 = unit.pattern_lo >> bit & 1;
            let p1 = unit.pattern_hi >> bit & 1;
            let pattern = p1 << 1 | p0;
            if pattern == 0 {
                continue;
            }
            return Some(SpritePixel {
                pattern,
                palette: unit.attributes.palette(),
                behind_background: unit.attributes.contains(SpriteAttributes::BEHIND_BACKGROUND),
                sprite_zero: unit.sprite_zero,
            });
        }
        None
    }
}

/// Pattern address for one row of a sprite, handling 8x16 table select and
/// vertical flip. Returns the address of the low bitplane byte.
#[must_use]
pub fn sprite_pattern_addr(sprite: &Sprite, row: u16, height: u8, table_8x8: u16) -> u16 {
    let mut row = row & (u16::from(height) - 1);
    if sprite.attributes.contains(SpriteAttributes::FLIP_VERTICAL) {
        row = u16::from(height) - 1 - row;
    }

    if height == 16 {
        let table = u16::from(sprite.tile & 0x01) * 0x1000;
        let mut tile = u16::from(sprite.tile & 0xFE);
        if row >= 8 {
            tile += 1;
            row -= 8;
        }
        table + tile * 16 + row
    } else {
        table_8x8 + u16::from(sprite.tile) * 16 + row
    }
}

/// Reverse the pixel order of a pattern byte (horizontal flip).
#[inline]
#[must_use]
pub fn flip_pattern(byte: u8) -> u8 {
    byte.reverse_bits()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oam::SecondaryOam;

    fn sprite(y: u8, tile: u8, attr: u8, x: u8, index: u8) -> Sprite {
        Sprite::from_bytes(&[y, tile, attr, x], index)
    }

    #[test]
    fn evaluator_selects_covering_sprites() {
        let mut oam = vec![0xFF; 256];
        // Sprite 3 covers scanline 50.
        oam[12] = 48;
        let mut evaluator = SpriteEvaluator::new();
        let mut secondary = SecondaryOam::new();

        evaluator.start();
        for _ in 0..64 {
            evaluator.step(&oam, 50, 8, &mut secondary);
        }

        assert_eq!(secondary.len(), 1);
        assert_eq!(secondary.sprites()[0].oam_index, 3);
        assert!(!evaluator.sprite_zero_selected());
    }

    #[test]
    fn evaluator_flags_overflow_on_ninth_sprite() {
        let mut oam = vec![0xFF; 256];
        for slot in 0..9 {
            oam[slot * 4] = 20;
        }
        let mut evaluator = SpriteEvaluator::new();
        let mut secondary = SecondaryOam::new();

        evaluator.start();
        let mut overflowed = false;
        for _ in 0..64 {
            overflowed |= evaluator.step(&oam, 24, 8, &mut secondary);
        }

        assert!(overflowed);
        assert_eq!(secondary.len(), 8);
        assert!(evaluator.sprite_zero_selected());
    }

    #[test]
    fn renderer_priority_follows_oam_order() {
        let mut renderer = SpriteRenderer::new();
        renderer.load(&sprite(0, 0, 0x01, 10, 2), 0xFF, 0x00);
        renderer.load(&sprite(0, 0, 0x02, 10, 5), 0xFF, 0xFF);

        let pixel = renderer.pixel(12).unwrap();
        assert_eq!(pixel.palette, 5, "earlier OAM entry wins");
        assert_eq!(pixel.pattern, 1);
    }

    #[test]
    fn renderer_skips_transparent_pixels() {
        let mut renderer = SpriteRenderer::new();
        // First sprite transparent at offset 0, second opaque.
        renderer.load(&sprite(0, 0, 0x00, 10, 1), 0x7F, 0x00);
        renderer.load(&sprite(0, 0, 0x01, 10, 3), 0x80, 0x00);

        let pixel = renderer.pixel(10).unwrap();
        assert_eq!(pixel.palette, 5);
    }

    #[test]
    fn renderer_window_is_eight_pixels() {
        let mut renderer = SpriteRenderer::new();
        renderer.load(&sprite(0, 0, 0x00, 100, 0), 0xFF, 0x00);

        assert!(renderer.pixel(99).is_none());
        assert!(renderer.pixel(100).is_some());
        assert!(renderer.pixel(107).is_some());
        assert!(renderer.pixel(108).is_none());
    }

    #[test]
    fn pattern_addr_8x8() {
        let s = sprite(10, 0x42, 0x00, 0, 1);
        assert_eq!(sprite_pattern_addr(&s, 3, 8, 0x1000), 0x1000 + 0x42 * 16 + 3);
    }

    #[test]
    fn pattern_addr_8x8_vertical_flip() {
        let s = sprite(10, 0x42, 0x80, 0, 1);
        assert_eq!(sprite_pattern_addr(&s, 3, 8, 0x0000), 0x42 * 16 + 4);
    }

    #[test]
    fn pattern_addr_8x16_uses_tile_bit_for_table() {
        let s = sprite(10, 0x43, 0x00, 0, 1); // odd tile: table $1000, tile $42
        assert_eq!(sprite_pattern_addr(&s, 0, 16, 0x0000), 0x1000 + 0x42 * 16);
        // Rows 8-15 come from the next tile.
        assert_eq!(sprite_pattern_addr(&s, 9, 16, 0x0000), 0x1000 + 0x43 * 16 + 1);
    }

    #[test]
    fn pattern_addr_8x16_vertical_flip() {
        let s = sprite(10, 0x02, 0x80, 0, 1);
        // Row 0 flipped is row 15: second tile, row 7.
        assert_eq!(sprite_pattern_addr(&s, 0, 16, 0x0000), 0x03 * 16 + 7);
    }

    #[test]
    fn flip_pattern_reverses_bits() {
        assert_eq!(flip_pattern(0b1000_0000), 0b0000_0001);
        assert_eq!(flip_pattern(0b1100_0000), 0b0000_0011);
    }
}
