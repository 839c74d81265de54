//! Downsampler from the CPU clock to the host sample rate.
//!
//! The APU produces one mixed level per CPU cycle (~1.79 MHz); hosts want
//! 44.1 kHz or similar. Output points land every `cpu_clock / sample_rate`
//! input samples and are linearly interpolated between the two neighboring
//! inputs.

use serde::{Deserialize, Serialize};

/// Linear-interpolation resampler with an internal output buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resampler {
    /// Input samples per output sample.
    step: f64,
    /// Position of the next output point, relative to the previous input.
    next: f64,
    /// Previous input sample.
    prev: f32,
    /// Accumulated output samples, drained by the host.
    buffer: Vec<f32>,
}

impl Resampler {
    /// Create a resampler converting `input_rate` to `output_rate`.
    #[must_use]
    pub fn new(input_rate: u32, output_rate: u32) -> Self {
        let step = f64::from(input_rate) / f64::from(output_rate.max(1));
        Self {
            step,
            next: step,
            prev: 0.0,
            buffer: Vec::with_capacity(2048),
        }
    }

    /// Feed one input sample (one per CPU cycle).
    pub fn push(&mut self, sample: f32) {
        while self.next <= 1.0 {
            let frac = self.next as f32;
            self.buffer.push(self.prev + (sample - self.prev) * frac);
            self.next += self.step;
        }
        self.next -= 1.0;
        self.prev = sample;
    }

    /// Number of buffered output samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when no output samples are buffered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drain the buffered output samples.
    pub fn take(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.buffer)
    }
}
