//! Pulse (square wave) channel.

use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::length_counter::LengthCounter;
use crate::sweep::{PulseChannel, Sweep};
use crate::timer::Timer;

/// The four duty waveforms, one bit per sequencer step.
const DUTY_TABLE: [[u8; 8]; 4] = [
    [0, 1, 0, 0, 0, 0, 0, 0], // 12.5%
    [0, 1, 1, 0, 0, 0, 0, 0], // 25%
    [0, 1, 1, 1, 1, 0, 0, 0], // 50%
    [1, 0, 0, 1, 1, 1, 1, 1], // 25% inverted
];

/// One of the two pulse channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pulse {
    envelope: Envelope,
    sweep: Sweep,
    length: LengthCounter,
    timer: Timer,
    duty: u8,
    sequence_step: u8,
}

impl Pulse {
    /// Fresh pulse channel.
    #[must_use]
    pub fn new(channel: PulseChannel) -> Self {
        Self {
            envelope: Envelope::new(),
            sweep: Sweep::new(channel),
            length: LengthCounter::new(),
            timer: Timer::new(),
            duty: 0,
            sequence_step: 0,
        }
    }

    /// $4000/$4004: duty and envelope.
    pub fn write_ctrl(&mut self, value: u8) {
        self.duty = value >> 6;
        self.envelope.write(value);
        self.length.set_halted(self.envelope.looping());
    }

    /// $4001/$4005: sweep.
    pub fn write_sweep(&mut self, value: u8) {
        self.sweep.write(value);
    }

    /// $4002/$4006: timer low.
    pub fn write_timer_lo(&mut self, value: u8) {
        self.timer.set_period_lo(value);
    }

    /// $4003/$4007: length load and timer high; restarts the sequencer and
    /// envelope.
    pub fn write_timer_hi(&mut self, value: u8) {
        self.timer.set_period_hi(value);
        self.length.load(value >> 3);
        self.envelope.start();
        self.sequence_step = 0;
    }

    /// $4015 enable bit.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.length.set_enabled(enabled);
    }

    /// True while the length counter holds the channel open.
    #[must_use]
    pub fn active(&self) -> bool {
        self.length.active()
    }

    /// Length counter value (debug/tests).
    #[must_use]
    pub fn length_value(&self) -> u8 {
        self.length.value()
    }

    /// Clock the timer (every other CPU cycle).
    pub fn clock_timer(&mut self) {
        if self.timer.clock() {
            self.sequence_step = (self.sequence_step + 1) & 0x07;
        }
    }

    /// Quarter-frame tick.
    pub fn clock_envelope(&mut self) {
        self.envelope.clock();
    }

    /// Half-frame tick: length counter and sweep.
    pub fn clock_half_frame(&mut self) {
        self.length.clock();
        if let Some(period) = self.sweep.clock(self.timer.period()) {
            self.timer.set_period(period);
        }
    }

    /// Current 4-bit output level.
    #[must_use]
    pub fn output(&self) -> u8 {
        if !self.length.active()
            || self.sweep.muting(self.timer.period())
            || DUTY_TABLE[usize::from(self.duty)][usize::from(self.sequence_step)] == 0
        {
            0
        } else {
            self.envelope.output()
        }
    }
}
