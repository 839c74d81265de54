//! The 2C02 PPU.
//!
//! One [`Ppu::step`] advances a single dot. Pattern table traffic goes
//! through a caller-supplied CHR callback so the PPU holds no mapper
//! reference; nametables and palette RAM are internal.
//!
//! CPU-visible registers ($2000-$2007, mirrored through $3FFF):
//!
//! ```text
//! $2000 PPUCTRL    $2001 PPUMASK   $2002 PPUSTATUS  $2003 OAMADDR
//! $2004 OAMDATA    $2005 PPUSCROLL $2006 PPUADDR    $2007 PPUDATA
//! ```

use crate::background::Background;
use crate::oam::{Oam, SecondaryOam};
use crate::registers::{Ctrl, Mask, Status};
use crate::scroll::Scroll;
use crate::sprites::{flip_pattern, sprite_pattern_addr, SpriteEvaluator, SpriteRenderer};
use crate::state::PpuState;
use crate::timing::Timing;
use crate::vram::{Mirroring, Vram, VramState};

/// Frame width in pixels.
pub const FRAME_WIDTH: usize = 256;
/// Frame height in pixels.
pub const FRAME_HEIGHT: usize = 240;
/// Framebuffer length in pixels.
pub const FRAME_SIZE: usize = FRAME_WIDTH * FRAME_HEIGHT;

/// Open-bus decay horizon, roughly one second of dots.
const OPEN_BUS_DECAY_DOTS: u32 = 5_300_000;

/// Signals produced by one dot.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepEvents {
    /// The frame just completed; the framebuffer is ready to present.
    pub frame_complete: bool,
    /// An NMI edge should be delivered to the CPU.
    pub nmi: bool,
    /// A rendered scanline ended; mappers with scanline counters clock now.
    pub scanline_tick: bool,
}

/// Picture Processing Unit.
pub struct Ppu {
    ctrl: Ctrl,
    mask: Mask,
    status: Status,
    scroll: Scroll,
    timing: Timing,
    vram: Vram,
    oam: Oam,
    secondary_oam: SecondaryOam,
    evaluator: SpriteEvaluator,
    sprite_renderer: SpriteRenderer,
    background: Background,
    /// 256x240 palette indices.
    frame_buffer: Vec<u8>,
    /// PPUDATA buffered-read register.
    read_buffer: u8,
    /// Last value driven on the register bus.
    open_bus: u8,
    open_bus_decay: u32,
    /// NMI edge waiting for delivery to the CPU.
    nmi_pending: bool,
}

impl Ppu {
    /// Create a PPU with the given nametable mirroring.
    #[must_use]
    pub fn new(mirroring: Mirroring) -> Self {
        Self {
            ctrl: Ctrl::empty(),
            mask: Mask::empty(),
            status: Status::empty(),
            scroll: Scroll::new(),
            timing: Timing::new(),
            vram: Vram::new(mirroring),
            oam: Oam::new(),
            secondary_oam: SecondaryOam::new(),
            evaluator: SpriteEvaluator::new(),
            sprite_renderer: SpriteRenderer::new(),
            background: Background::new(),
            frame_buffer: vec![0; FRAME_SIZE],
            read_buffer: 0,
            open_bus: 0,
            open_bus_decay: 0,
            nmi_pending: false,
        }
    }

    /// Return to power-on state, keeping the mirroring mode.
    pub fn reset(&mut self) {
        let mirroring = self.vram.mirroring();
        *self = Self::new(mirroring);
    }

    /// Update mirroring (mappers switch nametable layout at runtime).
    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        self.vram.set_mirroring(mirroring);
    }

    /// Framebuffer of palette indices (0-63), row-major 256x240.
    #[must_use]
    pub fn frame_buffer(&self) -> &[u8] {
        &self.frame_buffer
    }

    /// Current scanline (0-261; 261 is the pre-render line).
    #[must_use]
    pub fn scanline(&self) -> u16 {
        self.timing.scanline()
    }

    /// Current dot (0-340).
    #[must_use]
    pub fn dot(&self) -> u16 {
        self.timing.dot()
    }

    /// Frames completed since power-on.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.timing.frame()
    }

    /// True while the vblank flag is set.
    #[must_use]
    pub fn in_vblank(&self) -> bool {
        self.status.contains(Status::VBLANK)
    }

    fn refresh_open_bus(&mut self, value: u8) {
        self.open_bus = value;
        self.open_bus_decay = OPEN_BUS_DECAY_DOTS;
    }

    /// Read a CPU-visible register. `read_chr` services pattern-table
    /// fetches for PPUDATA.
    pub fn read_register<F>(&mut self, addr: u16, mut read_chr: F) -> u8
    where
        F: FnMut(u16) -> u8,
    {
        match addr & 0x07 {
            // Write-only registers float to open bus.
            0 | 1 | 3 | 5 | 6 => self.open_bus,

            2 => {
                let value = (self.status.bits() & 0xE0) | (self.open_bus & 0x1F);

                // Reading on the exact dot vblank begins suppresses the NMI.
                if self.timing.at_vblank_set() {
                    self.nmi_pending = false;
                }

                self.status.remove(Status::VBLANK);
                self.scroll.reset_latch();
                self.open_bus = value;
                value
            }

            4 => {
                let value = self.oam.read();
                self.refresh_open_bus(value);
                value
            }

            _ => {
                let addr = self.scroll.vram_addr() & 0x3FFF;
                let value = if addr < 0x2000 {
                    read_chr(addr)
                } else if addr < 0x3F00 {
                    self.vram.read_nametable(addr)
                } else {
                    self.vram.read_palette(addr)
                };

                let result = if addr >= 0x3F00 {
                    // Palette reads bypass the buffer, but refill it with the
                    // nametable byte underneath; bits 6-7 are open bus.
                    self.read_buffer = self.vram.read_nametable(addr - 0x1000);
                    (value & 0x3F) | (self.open_bus & 0xC0)
                } else {
                    let buffered = self.read_buffer;
                    self.read_buffer = value;
                    buffered
                };

                self.scroll.increment_vram(self.ctrl.vram_increment());
                self.refresh_open_bus(result);
                result
            }
        }
    }

    /// Inspect a register without side effects (debugger/save-state path).
    #[must_use]
    pub fn peek_register(&self, addr: u16) -> u8 {
        match addr & 0x07 {
            2 => (self.status.bits() & 0xE0) | (self.open_bus & 0x1F),
            4 => self.oam.read(),
            _ => self.open_bus,
        }
    }

    /// Write a CPU-visible register.
    pub fn write_register<F>(&mut self, addr: u16, value: u8, mut write_chr: F)
    where
        F: FnMut(u16, u8),
    {
        self.refresh_open_bus(value);

        match addr & 0x07 {
            0 => {
                let was_enabled = self.ctrl.nmi_enabled();
                self.ctrl = Ctrl::from_bits_truncate(value);
                self.scroll.write_ctrl(value);

                // Enabling NMI while the vblank flag is set raises a fresh
                // edge immediately.
                if !was_enabled && self.ctrl.nmi_enabled() && self.status.contains(Status::VBLANK)
                {
                    self.nmi_pending = true;
                }
            }
            1 => self.mask = Mask::from_bits_truncate(value),
            2 => {}
            3 => self.oam.set_addr(value),
            4 => self.oam.write(value),
            5 => self.scroll.write_scroll(value),
            6 => self.scroll.write_addr(value),
            _ => {
                let addr = self.scroll.vram_addr() & 0x3FFF;
                if addr < 0x2000 {
                    write_chr(addr, value);
                } else if addr < 0x3F00 {
                    self.vram.write_nametable(addr, value);
                } else {
                    self.vram.write_palette(addr, value);
                }
                self.scroll.increment_vram(self.ctrl.vram_increment());
            }
        }
    }

    /// OAM DMA: copy a full page into OAM starting at the current OAMADDR.
    pub fn write_oam_dma(&mut self, page: &[u8; 256]) {
        self.oam.dma_write(page);
    }

    /// Advance one dot.
    pub fn step<F>(&mut self, mut read_chr: F) -> StepEvents
    where
        F: FnMut(u16) -> u8,
    {
        if self.open_bus_decay > 0 {
            self.open_bus_decay -= 1;
            if self.open_bus_decay == 0 {
                self.open_bus = 0;
            }
        }

        let rendering = self.mask.rendering_enabled();
        let mut events = StepEvents {
            frame_complete: self.timing.tick(rendering),
            ..StepEvents::default()
        };

        if self.timing.at_vblank_set() {
            self.status.insert(Status::VBLANK);
            if self.ctrl.nmi_enabled() {
                self.nmi_pending = true;
            }
        }

        if self.timing.at_vblank_clear() {
            self.status
                .remove(Status::VBLANK | Status::SPRITE_ZERO_HIT | Status::SPRITE_OVERFLOW);
            self.nmi_pending = false;
        }

        if rendering && self.timing.on_rendering_scanline() {
            self.run_background_pipeline(&mut read_chr);
            self.run_sprite_pipeline(&mut read_chr);

            if self.timing.on_visible_scanline() && self.timing.on_visible_dot() {
                self.render_pixel();
            }

            if self.timing.at_horizontal_copy() {
                self.scroll.copy_horizontal();
            }
            if self.timing.in_vertical_copy() {
                self.scroll.copy_vertical();
            }

            events.scanline_tick = self.timing.at_scanline_counter_tick();
        }

        if self.nmi_pending {
            self.nmi_pending = false;
            events.nmi = true;
        }

        events
    }

    /// Background fetches and shifts for the current dot.
    fn run_background_pipeline<F>(&mut self, read_chr: &mut F)
    where
        F: FnMut(u16) -> u8,
    {
        if !(self.timing.on_visible_dot() || self.timing.on_prefetch_dot()) {
            return;
        }

        self.background.shift();

        match self.timing.dot() % 8 {
            1 => {
                let value = self.vram.read_nametable(self.scroll.nametable_addr());
                self.background.set_nametable_byte(value);
            }
            3 => {
                let value = self.vram.read_nametable(self.scroll.attribute_addr());
                self.background
                    .set_attribute_byte(value, self.scroll.coarse_x(), self.scroll.coarse_y());
            }
            5 => {
                let addr = self.bg_pattern_addr();
                self.background.set_pattern_lo(read_chr(addr));
            }
            7 => {
                let addr = self.bg_pattern_addr() + 8;
                self.background.set_pattern_hi(read_chr(addr));
            }
            0 => {
                self.background.reload_shift_registers();
                self.scroll.increment_x();
            }
            _ => {}
        }

        if self.timing.dot() == 256 {
            self.scroll.increment_y();
        }
    }

    fn bg_pattern_addr(&self) -> u16 {
        self.ctrl.bg_table_base()
            + u16::from(self.background.nametable_byte()) * 16
            + u16::from(self.scroll.fine_y())
    }

    /// Sprite evaluation (dots 65-256) and pattern fetch (dots 257-320).
    fn run_sprite_pipeline<F>(&mut self, read_chr: &mut F)
    where
        F: FnMut(u16) -> u8,
    {
        let dot = self.timing.dot();

        if dot == 65 {
            self.secondary_oam.clear();
            self.evaluator.start();
        }

        // Evaluation targets the next scanline; the pre-render line only
        // clears, so scanline 0 shows no sprites (as on hardware).
        if self.timing.on_visible_scanline() && self.timing.in_sprite_eval() {
            let target = self.timing.scanline() + 1;
            let overflowed = self.evaluator.step(
                self.oam.data(),
                target,
                self.ctrl.sprite_height(),
                &mut self.secondary_oam,
            );
            if overflowed {
                self.status.insert(Status::SPRITE_OVERFLOW);
            }
        }

        if dot == 257 {
            self.sprite_renderer.clear();
        }

        // One sprite's pattern row is fetched per 8-dot slot.
        if self.timing.in_sprite_fetch() && (dot - 257) % 8 == 7 {
            let index = usize::from((dot - 257) / 8);
            if index < self.secondary_oam.len() {
                let sprite = self.secondary_oam.sprites()[index];
                let height = self.ctrl.sprite_height();
                let target = self.timing.scanline() + 1;
                let row = target - u16::from(sprite.y);

                let addr =
                    sprite_pattern_addr(&sprite, row, height, self.ctrl.sprite_table_base());
                let mut lo = read_chr(addr);
                let mut hi = read_chr(addr + 8);

                if sprite
                    .attributes
                    .contains(crate::oam::SpriteAttributes::FLIP_HORIZONTAL)
                {
                    lo = flip_pattern(lo);
                    hi = flip_pattern(hi);
                }

                self.sprite_renderer.load(&sprite, lo, hi);
            }
        }
    }

    /// Mux background and sprite pixels into the framebuffer.
    fn render_pixel(&mut self) {
        let x = self.timing.dot() - 1;
        let y = self.timing.scanline();

        let (mut bg_pattern, bg_palette) = if self.mask.contains(Mask::SHOW_BG) {
            self.background.pixel(self.scroll.fine_x())
        } else {
            (0, 0)
        };
        if x < 8 && !self.mask.contains(Mask::BG_LEFT) {
            bg_pattern = 0;
        }

        let sprite = if self.mask.contains(Mask::SHOW_SPRITES)
            && !(x < 8 && !self.mask.contains(Mask::SPRITE_LEFT))
        {
            self.sprite_renderer.pixel(x)
        } else {
            None
        };

        let (pattern, palette) = match (bg_pattern, sprite) {
            (0, None) => (0, 0),
            (0, Some(s)) => (s.pattern, s.palette),
            (_, None) => (bg_pattern, bg_palette),
            (_, Some(s)) => {
                if s.sprite_zero && x < 255 {
                    self.status.insert(Status::SPRITE_ZERO_HIT);
                }
                if s.behind_background {
                    (bg_pattern, bg_palette)
                } else {
                    (s.pattern, s.palette)
                }
            }
        };

        let color = if pattern == 0 {
            self.vram.read_palette(0x3F00)
        } else {
            self.vram
                .read_palette(0x3F00 + u16::from(palette) * 4 + u16::from(pattern))
        };

        let offset = usize::from(y) * FRAME_WIDTH + usize::from(x);
        self.frame_buffer[offset] = color & 0x3F;
    }

    /// Snapshot the PPU for a save state.
    #[must_use]
    pub fn save_state(&self) -> PpuState {
        PpuState {
            ctrl: self.ctrl.bits(),
            mask: self.mask.bits(),
            status: self.status.bits(),
            scroll_v: self.scroll.vram_addr(),
            scroll_t: self.scroll.temp_addr(),
            scroll_x: self.scroll.fine_x(),
            scroll_w: self.scroll.write_latch(),
            scanline: self.timing.scanline(),
            dot: self.timing.dot(),
            frame: self.timing.frame(),
            vram: VramState {
                ciram: self.vram.ciram().to_vec(),
                four_screen: self.vram.four_screen().to_vec(),
                palette: self.vram.palette().to_vec(),
                mirroring: self.vram.mirroring(),
            },
            oam: self.oam.data().to_vec(),
            oam_addr: self.oam.addr(),
            secondary_oam: self.secondary_oam.clone(),
            evaluator: self.evaluator,
            sprite_renderer: self.sprite_renderer.clone(),
            background: self.background,
            read_buffer: self.read_buffer,
            open_bus: self.open_bus,
            open_bus_decay: self.open_bus_decay,
            nmi_pending: self.nmi_pending,
            frame_buffer: self.frame_buffer.clone(),
        }
    }

    /// Restore the PPU from a save state.
    pub fn load_state(&mut self, state: &PpuState) {
        self.ctrl = Ctrl::from_bits_truncate(state.ctrl);
        self.mask = Mask::from_bits_truncate(state.mask);
        self.status = Status::from_bits_truncate(state.status);
        self.scroll
            .restore(state.scroll_v, state.scroll_t, state.scroll_x, state.scroll_w);
        self.timing.restore(state.scanline, state.dot, state.frame);
        self.vram.set_mirroring(state.vram.mirroring);
        self.vram
            .restore(&state.vram.ciram, &state.vram.four_screen, &state.vram.palette);
        self.oam.restore(&state.oam, state.oam_addr);
        self.secondary_oam = state.secondary_oam.clone();
        self.evaluator = state.evaluator;
        self.sprite_renderer = state.sprite_renderer.clone();
        self.background = state.background;
        self.read_buffer = state.read_buffer;
        self.open_bus = state.open_bus;
        self.open_bus_decay = state.open_bus_decay;
        self.nmi_pending = state.nmi_pending;
        if state.frame_buffer.len() == FRAME_SIZE {
            self.frame_buffer.copy_from_slice(&state.frame_buffer);
        }
    }
}
