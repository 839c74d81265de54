//! Ricoh 2C02 PPU emulation for the famicore NES core.
//!
//! The PPU is stepped one dot at a time; the coordinator advances it three
//! dots per CPU cycle. Pattern-table accesses go through a caller-supplied
//! CHR callback so the cartridge mapper stays outside this crate.
//!
//! # Example
//!
//! ```
//! use famicore_ppu::{Mirroring, Ppu};
//!
//! let mut ppu = Ppu::new(Mirroring::Vertical);
//! ppu.write_register(0x2000, 0x80, |_, _| {}); // enable NMI
//!
//! // Run one frame against empty CHR.
//! loop {
//!     let events = ppu.step(|_| 0);
//!     if events.frame_complete {
//!         break;
//!     }
//! }
//! assert_eq!(ppu.frame_buffer().len(), 256 * 240);
//! ```

mod background;
mod oam;
mod ppu;
mod registers;
mod scroll;
mod sprites;
mod state;
mod timing;
mod vram;

pub use background::Background;
pub use oam::{Oam, SecondaryOam, Sprite, SpriteAttributes};
pub use ppu::{Ppu, StepEvents, FRAME_HEIGHT, FRAME_SIZE, FRAME_WIDTH};
pub use registers::{Ctrl, Mask, Status};
pub use scroll::Scroll;
pub use sprites::{SpriteEvaluator, SpritePixel, SpriteRenderer};
pub use state::PpuState;
pub use timing::Timing;
pub use vram::{Mirroring, Vram, VramState};
