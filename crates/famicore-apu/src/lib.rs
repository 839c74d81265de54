//! NES 2A03 APU emulation for the famicore core.
//!
//! Five channels (two pulse, triangle, noise, DMC), a frame counter, the
//! documented nonlinear mixer, and a linear-interpolation resampler down to
//! the host sample rate.
//!
//! The APU is clocked once per CPU cycle via [`Apu::clock`]. DMC sample
//! fetches are requested through [`Apu::dmc_needs_sample`] and served by
//! the system bus, which also charges the CPU the 4-cycle fetch stall.

mod apu;
mod dmc;
mod envelope;
mod frame_counter;
mod length_counter;
mod mixer;
mod noise;
mod pulse;
mod resampler;
mod sweep;
mod timer;
mod triangle;

pub use apu::{Apu, CPU_CLOCK_NTSC};
pub use dmc::{Dmc, FETCH_STALL_CYCLES};
pub use frame_counter::{FrameCounter, FrameTick, SequenceMode};
pub use mixer::mix;
pub use noise::Noise;
pub use pulse::Pulse;
pub use resampler::Resampler;
pub use sweep::PulseChannel;
pub use triangle::Triangle;

use serde::{Deserialize, Serialize};

/// Console region. Selects the DMC and noise period tables; the frame
/// counter sequence stays NTSC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Region {
    /// NTSC (60 Hz).
    #[default]
    Ntsc,
    /// PAL (50 Hz).
    Pal,
}
