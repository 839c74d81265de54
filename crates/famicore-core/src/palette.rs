//! The 2C02 master palette.
//!
//! The PPU emits 6-bit palette indices; this table maps them to RGB for
//! the host. Values are the widely used composite-derived set.

/// 64-entry palette of RGB triples, indexed by the PPU color (0-63).
#[rustfmt::skip]
pub const NES_PALETTE: [(u8, u8, u8); 64] = [
    (0x66, 0x66, 0x66), (0x00, 0x2A, 0x88), (0x14, 0x12, 0xA7), (0x3B, 0x00, 0xA4),
    (0x5C, 0x00, 0x7E), (0x6E, 0x00, 0x40), (0x6C, 0x06, 0x00), (0x56, 0x1D, 0x00),
    (0x33, 0x35, 0x00), (0x0B, 0x48, 0x00), (0x00, 0x52, 0x00), (0x00, 0x4F, 0x08),
    (0x00, 0x40, 0x4D), (0x00, 0x00, 0x00), (0x00, 0x00, 0x00), (0x00, 0x00, 0x00),
    (0xAD, 0xAD, 0xAD), (0x15, 0x5F, 0xD9), (0x42, 0x40, 0xFF), (0x75, 0x27, 0xFE),
    (0xA0, 0x1A, 0xCC), (0xB7, 0x1E, 0x7B), (0xB5, 0x31, 0x20), (0x99, 0x4E, 0x00),
    (0x6B, 0x6D, 0x00), (0x38, 0x87, 0x00), (0x0C, 0x93, 0x00), (0x00, 0x8F, 0x32),
    (0x00, 0x7C, 0x8D), (0x00, 0x00, 0x00), (0x00, 0x00, 0x00), (0x00, 0x00, 0x00),
    (0xFF, 0xFE, 0xFF), (0x64, 0xB0, 0xFF), (0x92, 0x90, 0xFF), (0xC6, 0x76, 0xFF),
    (0xF3, 0x6A, 0xFF), (0xFE, 0x6E, 0xCC), (0xFE, 0x81, 0x70), (0xEA, 0x9E, 0x22),
    (0xBC, 0xBE, 0x00), (0x88, 0xD8, 0x00), (0x5C, 0xE4, 0x30), (0x45, 0xE0, 0x82),
    (0x48, 0xCD, 0xDE), (0x4F, 0x4F, 0x4F), (0x00, 0x00, 0x00), (0x00, 0x00, 0x00),
    (0xFF, 0xFE, 0xFF), (0xC0, 0xDF, 0xFF), (0xD3, 0xD2, 0xFF), (0xE8, 0xC8, 0xFF),
    (0xFB, 0xC2, 0xFF), (0xFE, 0xC4, 0xEA), (0xFE, 0xCC, 0xC5), (0xF7, 0xD8, 0xA5),
    (0xE4, 0xE5, 0x94), (0xCF, 0xEF, 0x96), (0xBD, 0xF4, 0xAB), (0xB3, 0xF3, 0xCC),
    (0xB5, 0xEB, 0xF2), (0xB8, 0xB8, 0xB8), (0x00, 0x00, 0x00), (0x00, 0x00, 0x00),
];

/// RGB triple for a palette index (masked to 6 bits).
#[inline]
#[must_use]
pub fn palette_rgb(index: u8) -> (u8, u8, u8) {
    NES_PALETTE[usize::from(index & 0x3F)]
}

/// RGBA8888 word for a palette index, alpha fully opaque.
#[inline]
#[must_use]
pub fn palette_rgba(index: u8) -> u32 {
    let (r, g, b) = palette_rgb(index);
    u32::from_be_bytes([r, g, b, 0xFF])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_64_entries() {
        assert_eq!(NES_PALETTE.len(), 64);
    }

    #[test]
    fn index_wraps_at_64() {
        assert_eq!(palette_rgb(0x40), palette_rgb(0x00));
        assert_eq!(palette_rgb(0x7F), palette_rgb(0x3F));
    }

    #[test]
    fn rgba_is_opaque() {
        assert_eq!(palette_rgba(0x0D) & 0xFF, 0xFF);
        assert_eq!(palette_rgba(0x20), u32::from_be_bytes([0xFF, 0xFE, 0xFF, 0xFF]));
    }
}
