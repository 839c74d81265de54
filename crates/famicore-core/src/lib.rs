//! famicore - NES emulation core.
//!
//! Integrates the CPU, PPU, APU, and cartridge mappers behind a single
//! [`Console`] with per-instruction coordination:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                       Console                        │
//! │  ┌────────────────────────────────────────────────┐  │
//! │  │                   SystemBus                    │  │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌────────┐ ┌───────┐  │  │
//! │  │  │ RAM │ │ PPU │ │ APU │ │ Mapper │ │ Pads  │  │  │
//! │  │  └─────┘ └─────┘ └─────┘ └────────┘ └───────┘  │  │
//! │  └────────────────────────────────────────────────┘  │
//! │                         ▲                            │
//! │                    ┌────┴────┐                       │
//! │                    │ 6502 CPU│                       │
//! │                    └─────────┘                       │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use famicore_core::{Console, CoreConfig};
//!
//! let rom = std::fs::read("game.nes").expect("read ROM");
//! let mut console = Console::new(&rom).expect("load cartridge");
//!
//! loop {
//!     console.step_frame().expect("frame");
//!     let _pixels = console.framebuffer(); // 256x240 RGBA8888
//!     let _audio = console.take_audio();   // 44.1 kHz mono
//! }
//! ```
//!
//! Hosts that want the full input/video/audio/SRAM surface implement the
//! traits in [`host`] and call [`Console::run_frame`].

mod bus;
mod console;
mod controller;
pub mod host;
pub mod palette;
mod save_state;

pub use bus::{BusState, SystemBus};
pub use console::{timing, Console, ConsoleError, CoreConfig};
pub use controller::{Button, Controller};
pub use save_state::{SaveState, SaveStateError, SAVE_STATE_MAGIC, SAVE_STATE_VERSION};

// Re-export the component crates' main types.
pub use famicore_apu::{Apu, Region};
pub use famicore_cpu::{Cpu, CpuError, CpuState, OpcodeMode, Status};
pub use famicore_mappers::{
    build_mapper, Cartridge, Mapper, MapperState, Mirroring, RomError,
};
pub use famicore_ppu::{Ppu, PpuState};

/// NES screen geometry.
pub mod screen {
    /// Width in pixels.
    pub const WIDTH: usize = 256;
    /// Height in pixels.
    pub const HEIGHT: usize = 240;
    /// Pixels per frame.
    pub const PIXELS: usize = WIDTH * HEIGHT;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_constants() {
        assert_eq!(screen::WIDTH, 256);
        assert_eq!(screen::HEIGHT, 240);
        assert_eq!(screen::PIXELS, 61_440);
    }

    #[test]
    fn timing_constants() {
        assert_eq!(timing::CPU_CLOCK_NTSC, 1_789_772);
        assert_eq!(timing::PPU_CLOCK_NTSC, 5_369_318);
        assert_eq!(timing::CPU_CYCLES_PER_FRAME, 29_780);
    }
}
