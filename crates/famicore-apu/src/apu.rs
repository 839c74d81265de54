//! APU top level: five channels, frame counter, mixer, resampler.
//!
//! One [`Apu::clock`] advances a single CPU cycle. The triangle timer runs
//! every cycle; the other channel timers run every second cycle (APU
//! cycles). DMC sample fetches are surfaced through
//! [`Apu::dmc_needs_sample`] so the system bus can perform the read and
//! charge the CPU stall.

use serde::{Deserialize, Serialize};

use crate::dmc::Dmc;
use crate::frame_counter::FrameCounter;
use crate::mixer::mix;
use crate::noise::Noise;
use crate::pulse::Pulse;
use crate::resampler::Resampler;
use crate::sweep::PulseChannel;
use crate::triangle::Triangle;
use crate::Region;

/// NTSC CPU clock, the APU's time base.
pub const CPU_CLOCK_NTSC: u32 = 1_789_773;

/// Audio Processing Unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Apu {
    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    frame_counter: FrameCounter,
    resampler: Resampler,
    cycle: u64,
    audio_enabled: bool,
}

impl Apu {
    /// APU with the default 44.1 kHz output rate.
    #[must_use]
    pub fn new(region: Region) -> Self {
        Self::with_sample_rate(region, 44_100, true)
    }

    /// APU with an explicit output rate. `audio_enabled = false` keeps all
    /// channel state machines running but produces no samples.
    #[must_use]
    pub fn with_sample_rate(region: Region, sample_rate: u32, audio_enabled: bool) -> Self {
        Self {
            pulse1: Pulse::new(PulseChannel::One),
            pulse2: Pulse::new(PulseChannel::Two),
            triangle: Triangle::new(),
            noise: Noise::new(region),
            dmc: Dmc::new(region),
            frame_counter: FrameCounter::new(),
            resampler: Resampler::new(CPU_CLOCK_NTSC, sample_rate),
            cycle: 0,
            audio_enabled,
        }
    }

    /// Write an APU register ($4000-$4013, $4015, $4017).
    pub fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x4000 => self.pulse1.write_ctrl(value),
            0x4001 => self.pulse1.write_sweep(value),
            0x4002 => self.pulse1.write_timer_lo(value),
            0x4003 => self.pulse1.write_timer_hi(value),

            0x4004 => self.pulse2.write_ctrl(value),
            0x4005 => self.pulse2.write_sweep(value),
            0x4006 => self.pulse2.write_timer_lo(value),
            0x4007 => self.pulse2.write_timer_hi(value),

            0x4008 => self.triangle.write_linear(value),
            0x400A => self.triangle.write_timer_lo(value),
            0x400B => self.triangle.write_timer_hi(value),

            0x400C => self.noise.write_ctrl(value),
            0x400E => self.noise.write_period(value),
            0x400F => self.noise.write_length(value),

            0x4010 => self.dmc.write_ctrl(value),
            0x4011 => self.dmc.write_level(value),
            0x4012 => self.dmc.write_sample_address(value),
            0x4013 => self.dmc.write_sample_length(value),

            0x4015 => {
                self.pulse1.set_enabled(value & 0x01 != 0);
                self.pulse2.set_enabled(value & 0x02 != 0);
                self.triangle.set_enabled(value & 0x04 != 0);
                self.noise.set_enabled(value & 0x08 != 0);
                self.dmc.set_enabled(value & 0x10 != 0);
                self.dmc.clear_irq();
            }

            0x4017 => self.frame_counter.write(value),

            _ => log::trace!("write to unmapped APU register ${addr:04X}"),
        }
    }

    /// $4015 read: channel activity and IRQ flags; clears the frame IRQ.
    pub fn read_status(&mut self) -> u8 {
        let status = self.peek_status();
        self.frame_counter.clear_irq();
        status
    }

    /// $4015 without side effects (PeekSafe path).
    #[must_use]
    pub fn peek_status(&self) -> u8 {
        let mut status = 0u8;
        if self.pulse1.active() {
            status |= 0x01;
        }
        if self.pulse2.active() {
            status |= 0x02;
        }
        if self.triangle.active() {
            status |= 0x04;
        }
        if self.noise.active() {
            status |= 0x08;
        }
        if self.dmc.active() {
            status |= 0x10;
        }
        if self.frame_counter.irq_pending() {
            status |= 0x40;
        }
        if self.dmc.irq_pending() {
            status |= 0x80;
        }
        status
    }

    /// Advance one CPU cycle.
    pub fn clock(&mut self) {
        self.triangle.clock_timer();

        if self.cycle % 2 == 1 {
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
            self.noise.clock_timer();
            self.dmc.clock_timer();
        }

        let tick = self.frame_counter.clock();
        if tick.quarter {
            self.pulse1.clock_envelope();
            self.pulse2.clock_envelope();
            self.triangle.clock_linear();
            self.noise.clock_envelope();
        }
        if tick.half {
            self.pulse1.clock_half_frame();
            self.pulse2.clock_half_frame();
            self.triangle.clock_length();
            self.noise.clock_length();
        }

        if self.audio_enabled {
            self.resampler.push(self.output());
        }

        self.cycle = self.cycle.wrapping_add(1);
    }

    /// Current mixed output level (0.0..1.0).
    #[must_use]
    pub fn output(&self) -> f32 {
        mix(
            self.pulse1.output(),
            self.pulse2.output(),
            self.triangle.output(),
            self.noise.output(),
            self.dmc.output(),
        )
    }

    /// Drain the resampled output buffer.
    pub fn take_samples(&mut self) -> Vec<f32> {
        self.resampler.take()
    }

    /// Number of buffered output samples.
    #[must_use]
    pub fn buffered_samples(&self) -> usize {
        self.resampler.len()
    }

    /// True when the DMC wants a byte from CPU memory.
    #[must_use]
    pub fn dmc_needs_sample(&self) -> bool {
        self.dmc.needs_sample()
    }

    /// Address of the next DMC sample byte.
    #[must_use]
    pub fn dmc_sample_address(&self) -> u16 {
        self.dmc.sample_address()
    }

    /// Deliver a DMC sample byte. The caller charges the CPU the fetch
    /// stall ([`crate::dmc::FETCH_STALL_CYCLES`]).
    pub fn dmc_load_sample(&mut self, value: u8) {
        self.dmc.load_sample(value);
    }

    /// True while the frame counter or DMC asserts the IRQ line.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.frame_counter.irq_pending() || self.dmc.irq_pending()
    }

    /// CPU cycles clocked so far.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycle
    }
}
