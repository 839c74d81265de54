//! APU frame counter.
//!
//! Divides the CPU clock into quarter- and half-frame ticks that clock
//! envelopes, linear counters, length counters, and sweeps. In 4-step mode
//! the final step raises an IRQ unless inhibited; 5-step mode never does.

use serde::{Deserialize, Serialize};

/// Frame counter sequence mode ($4017 bit 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SequenceMode {
    /// 4-step sequence (~60 Hz), IRQ capable.
    #[default]
    FourStep,
    /// 5-step sequence (~48 Hz), no IRQ.
    FiveStep,
}

/// Ticks produced by one frame-counter clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameTick {
    /// Clock envelopes and the triangle linear counter.
    pub quarter: bool,
    /// Clock length counters and sweeps.
    pub half: bool,
}

/// CPU-cycle positions of the sequence steps (NTSC).
const FOUR_STEP_CYCLES: [u32; 4] = [7457, 14913, 22371, 29829];
const FIVE_STEP_CYCLES: [u32; 5] = [7457, 14913, 22371, 29829, 37281];

/// The frame counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameCounter {
    mode: SequenceMode,
    cycle: u32,
    step: u8,
    irq_inhibit: bool,
    irq_flag: bool,
    /// CPU cycles until a $4017 write takes effect (3 or 4 by parity).
    reset_delay: u8,
    pending_mode: Option<SequenceMode>,
}

impl FrameCounter {
    /// Fresh counter in 4-step mode.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mode: SequenceMode::FourStep,
            cycle: 0,
            step: 0,
            irq_inhibit: false,
            irq_flag: false,
            reset_delay: 0,
            pending_mode: None,
        }
    }

    /// $4017 write: mode and IRQ inhibit. The sequencer restart lands 3 or
    /// 4 CPU cycles later depending on write parity; writes selecting
    /// 5-step mode clock the quarter and half units immediately on restart.
    pub fn write(&mut self, value: u8) {
        self.irq_inhibit = value & 0x40 != 0;
        if self.irq_inhibit {
            self.irq_flag = false;
        }

        self.pending_mode = Some(if value & 0x80 != 0 {
            SequenceMode::FiveStep
        } else {
            SequenceMode::FourStep
        });
        self.reset_delay = if self.cycle % 2 == 0 { 3 } else { 4 };
    }

    /// Current sequence mode.
    #[must_use]
    pub fn mode(&self) -> SequenceMode {
        self.mode
    }

    /// True while the frame IRQ flag is raised.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_flag
    }

    /// Clear the frame IRQ flag ($4015 read).
    pub fn clear_irq(&mut self) {
        self.irq_flag = false;
    }

    /// Advance one CPU cycle.
    pub fn clock(&mut self) -> FrameTick {
        if self.reset_delay > 0 {
            self.reset_delay -= 1;
            if self.reset_delay == 0 {
                if let Some(mode) = self.pending_mode.take() {
                    self.mode = mode;
                    self.cycle = 0;
                    self.step = 0;
                    if self.mode == SequenceMode::FiveStep {
                        return FrameTick {
                            quarter: true,
                            half: true,
                        };
                    }
                }
            }
        }

        self.cycle += 1;

        match self.mode {
            SequenceMode::FourStep => self.clock_four_step(),
            SequenceMode::FiveStep => self.clock_five_step(),
        }
    }

    fn clock_four_step(&mut self) -> FrameTick {
        let mut tick = FrameTick::default();

        if self.step < 4 && self.cycle == FOUR_STEP_CYCLES[usize::from(self.step)] {
            tick.quarter = true;
            tick.half = self.step == 1 || self.step == 3;

            if self.step == 3 {
                if !self.irq_inhibit {
                    self.irq_flag = true;
                }
                self.cycle = 0;
                self.step = 0;
            } else {
                self.step += 1;
            }
        }

        tick
    }

    fn clock_five_step(&mut self) -> FrameTick {
        let mut tick = FrameTick::default();

        if self.step < 5 && self.cycle == FIVE_STEP_CYCLES[usize::from(self.step)] {
            // Step 4 (cycle 29829) produces no ticks in 5-step mode.
            if self.step != 3 {
                tick.quarter = true;
                tick.half = self.step == 1 || self.step == 4;
            }

            if self.step == 4 {
                self.cycle = 0;
                self.step = 0;
            } else {
                self.step += 1;
            }
        }

        tick
    }
}

impl Default for FrameCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(fc: &mut FrameCounter, cycles: u32) -> (u32, u32) {
        let mut quarters = 0;
        let mut halves = 0;
        for _ in 0..cycles {
            let tick = fc.clock();
            quarters += u32::from(tick.quarter);
            halves += u32::from(tick.half);
        }
        (quarters, halves)
    }

    #[test]
    fn four_step_sequence_counts() {
        let mut fc = FrameCounter::new();
        let (quarters, halves) = run(&mut fc, 29830);
        assert_eq!(quarters, 4);
        assert_eq!(halves, 2);
        assert!(fc.irq_pending(), "step 4 raises IRQ");
    }

    #[test]
    fn irq_inhibit_blocks_flag() {
        let mut fc = FrameCounter::new();
        fc.write(0x40);
        run(&mut fc, 40_000);
        assert!(!fc.irq_pending());
    }

    #[test]
    fn irq_clear_on_status_read() {
        let mut fc = FrameCounter::new();
        run(&mut fc, 29830);
        assert!(fc.irq_pending());
        fc.clear_irq();
        assert!(!fc.irq_pending());
    }

    #[test]
    fn five_step_mode_has_no_irq() {
        let mut fc = FrameCounter::new();
        fc.write(0x80);
        let (quarters, _) = run(&mut fc, 37_290);
        assert!(!fc.irq_pending());
        // Immediate tick on restart plus four sequence ticks.
        assert_eq!(quarters, 5);
    }

    #[test]
    fn mode_change_takes_effect_after_delay() {
        let mut fc = FrameCounter::new();
        fc.write(0x80);
        assert_eq!(fc.mode(), SequenceMode::FourStep);
        fc.clock();
        fc.clock();
        fc.clock();
        assert_eq!(fc.mode(), SequenceMode::FiveStep);
    }

    #[test]
    fn five_step_restart_clocks_immediately() {
        let mut fc = FrameCounter::new();
        fc.write(0x80);
        fc.clock();
        fc.clock();
        let tick = fc.clock();
        assert!(tick.quarter);
        assert!(tick.half);
    }
}
