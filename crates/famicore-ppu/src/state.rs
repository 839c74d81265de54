//! PPU state snapshot for save states.

use serde::{Deserialize, Serialize};

use crate::background::Background;
use crate::oam::SecondaryOam;
use crate::sprites::{SpriteEvaluator, SpriteRenderer};
use crate::vram::VramState;

/// Complete PPU state, including the in-flight fetch pipeline so a restore
/// mid-frame resumes pixel-for-pixel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PpuState {
    /// PPUCTRL bits.
    pub ctrl: u8,
    /// PPUMASK bits.
    pub mask: u8,
    /// PPUSTATUS bits.
    pub status: u8,
    /// Scroll register v.
    pub scroll_v: u16,
    /// Scroll register t.
    pub scroll_t: u16,
    /// Fine X scroll.
    pub scroll_x: u8,
    /// Write latch w.
    pub scroll_w: bool,
    /// Current scanline.
    pub scanline: u16,
    /// Current dot.
    pub dot: u16,
    /// Frame counter.
    pub frame: u64,
    /// Nametable and palette memory.
    pub vram: VramState,
    /// Primary OAM contents.
    pub oam: Vec<u8>,
    /// OAMADDR.
    pub oam_addr: u8,
    /// Sprites selected for the next scanline.
    pub secondary_oam: SecondaryOam,
    /// Evaluation progress.
    pub evaluator: SpriteEvaluator,
    /// Loaded sprite pattern rows.
    pub sprite_renderer: SpriteRenderer,
    /// Background fetch pipeline.
    pub background: Background,
    /// PPUDATA read buffer.
    pub read_buffer: u8,
    /// Open-bus latch.
    pub open_bus: u8,
    /// Open-bus decay countdown.
    pub open_bus_decay: u32,
    /// Pending NMI edge.
    pub nmi_pending: bool,
    /// Framebuffer palette indices.
    pub frame_buffer: Vec<u8>,
}
