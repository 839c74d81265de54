//! Host interface contracts.
//!
//! The core never blocks and never touches a window, an audio device, or a
//! file system. Hosts implement these traits and drive the console through
//! [`crate::Console::run_frame`]; every call happens at frame boundaries on
//! the simulation thread.

/// Receives finished frames.
pub trait VideoSink {
    /// Present one 256x240 frame of RGBA8888 pixels, row-major.
    fn present_frame(&mut self, pixels: &[u32]);
}

/// Receives resampled audio.
pub trait AudioSink {
    /// Push a block of mono samples in 0.0..1.0 at the given rate.
    fn push_samples(&mut self, samples: &[f32], sample_rate: u32);
}

/// Supplies controller input.
pub trait InputSource {
    /// Button bytes for both ports, sampled once per frame.
    /// Bit layout per port: A, B, Select, Start, Up, Down, Left, Right.
    fn before_frame(&mut self) -> [u8; 2];
}

/// Persists battery-backed SRAM, keyed by the cartridge content hash.
///
/// Failures are non-fatal: the console logs and keeps running.
pub trait SramStore {
    /// Fetch previously saved SRAM, if any.
    fn load(&mut self, cartridge_hash: &[u8; 16]) -> Option<Vec<u8>>;

    /// Persist the SRAM contents.
    ///
    /// # Errors
    ///
    /// Implementations report storage failures as a string; the core logs
    /// and ignores them.
    fn save(&mut self, cartridge_hash: &[u8; 16], data: &[u8]) -> Result<(), String>;
}

/// A no-op host, useful for headless runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullHost;

impl VideoSink for NullHost {
    fn present_frame(&mut self, _pixels: &[u32]) {}
}

impl AudioSink for NullHost {
    fn push_samples(&mut self, _samples: &[f32], _sample_rate: u32) {}
}

impl InputSource for NullHost {
    fn before_frame(&mut self) -> [u8; 2] {
        [0, 0]
    }
}

impl SramStore for NullHost {
    fn load(&mut self, _cartridge_hash: &[u8; 16]) -> Option<Vec<u8>> {
        None
    }

    fn save(&mut self, _cartridge_hash: &[u8; 16], _data: &[u8]) -> Result<(), String> {
        Ok(())
    }
}
