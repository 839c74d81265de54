//! PPU scanline/dot timing.
//!
//! NTSC geometry: 341 dots per scanline, 262 scanlines per frame.
//!
//! ```text
//! Scanline   Role
//! --------   ----
//! 0-239      visible (fetch tiles, emit pixels)
//! 240        post-render idle
//! 241-260    vblank (flag set at 241 dot 1)
//! 261        pre-render (flags cleared at dot 1)
//! ```
//!
//! On odd frames with rendering enabled the pre-render line is one dot
//! short: dot 339 is skipped.

use serde::{Deserialize, Serialize};

/// Scanline where vblank begins.
pub const VBLANK_SCANLINE: u16 = 241;
/// The pre-render scanline (also written as scanline -1).
pub const PRERENDER_SCANLINE: u16 = 261;
/// Dots per scanline.
pub const DOTS_PER_SCANLINE: u16 = 341;

/// PPU position within the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Timing {
    scanline: u16,
    dot: u16,
    frame: u64,
}

impl Timing {
    /// Start of frame 0.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            scanline: 0,
            dot: 0,
            frame: 0,
        }
    }

    /// Current scanline (0-261).
    #[inline]
    #[must_use]
    pub const fn scanline(self) -> u16 {
        self.scanline
    }

    /// Current dot within the scanline (0-340).
    #[inline]
    #[must_use]
    pub const fn dot(self) -> u16 {
        self.dot
    }

    /// Frames completed so far; parity drives the odd-frame skip.
    #[inline]
    #[must_use]
    pub const fn frame(self) -> u64 {
        self.frame
    }

    /// True on frames with odd parity.
    #[inline]
    #[must_use]
    pub const fn odd_frame(self) -> bool {
        self.frame % 2 == 1
    }

    /// Visible scanlines 0-239.
    #[inline]
    #[must_use]
    pub const fn on_visible_scanline(self) -> bool {
        self.scanline < 240
    }

    /// The pre-render scanline.
    #[inline]
    #[must_use]
    pub const fn on_prerender_scanline(self) -> bool {
        self.scanline == PRERENDER_SCANLINE
    }

    /// Visible or pre-render: scanlines where the fetch pipeline runs.
    #[inline]
    #[must_use]
    pub const fn on_rendering_scanline(self) -> bool {
        self.on_visible_scanline() || self.on_prerender_scanline()
    }

    /// Dots 1-256, where pixels are produced.
    #[inline]
    #[must_use]
    pub const fn on_visible_dot(self) -> bool {
        self.dot >= 1 && self.dot <= 256
    }

    /// Dots 321-336, prefetch of next scanline's first tiles.
    #[inline]
    #[must_use]
    pub const fn on_prefetch_dot(self) -> bool {
        self.dot >= 321 && self.dot <= 336
    }

    /// Scanline 241 dot 1: vblank flag set, NMI considered.
    #[inline]
    #[must_use]
    pub const fn at_vblank_set(self) -> bool {
        self.scanline == VBLANK_SCANLINE && self.dot == 1
    }

    /// Pre-render dot 1: vblank/sprite flags cleared.
    #[inline]
    #[must_use]
    pub const fn at_vblank_clear(self) -> bool {
        self.scanline == PRERENDER_SCANLINE && self.dot == 1
    }

    /// Dot 257: horizontal scroll reload.
    #[inline]
    #[must_use]
    pub const fn at_horizontal_copy(self) -> bool {
        self.dot == 257
    }

    /// Pre-render dots 280-304: vertical scroll reload.
    #[inline]
    #[must_use]
    pub const fn in_vertical_copy(self) -> bool {
        self.on_prerender_scanline() && self.dot >= 280 && self.dot <= 304
    }

    /// Dots 65-256 of visible scanlines: sprite evaluation window.
    #[inline]
    #[must_use]
    pub const fn in_sprite_eval(self) -> bool {
        self.dot >= 65 && self.dot <= 256
    }

    /// Dots 257-320: sprite pattern fetch window.
    #[inline]
    #[must_use]
    pub const fn in_sprite_fetch(self) -> bool {
        self.dot >= 257 && self.dot <= 320
    }

    /// Dot 260 of rendering scanlines: the point where MMC3-style scanline
    /// counters are clocked (the PPU's A12 rise during sprite fetches).
    #[inline]
    #[must_use]
    pub const fn at_scanline_counter_tick(self) -> bool {
        self.dot == 260 && self.on_rendering_scanline()
    }

    /// Advance one dot. Returns true when a frame just completed.
    pub fn tick(&mut self, rendering_enabled: bool) -> bool {
        self.dot += 1;

        // Odd-frame skip: pre-render dot 339 vanishes when rendering.
        if rendering_enabled
            && self.odd_frame()
            && self.scanline == PRERENDER_SCANLINE
            && self.dot == 339
        {
            self.dot = 340;
        }

        if self.dot >= DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline > PRERENDER_SCANLINE {
                self.scanline = 0;
                self.frame = self.frame.wrapping_add(1);
                return true;
            }
        }

        false
    }

    /// Jump to an absolute position (save-state restore).
    pub fn restore(&mut self, scanline: u16, dot: u16, frame: u64) {
        self.scanline = scanline % 262;
        self.dot = dot % DOTS_PER_SCANLINE;
        self.frame = frame;
    }
}
