//! Length counter: silences a channel after a loaded duration.

use serde::{Deserialize, Serialize};

/// Values loaded by the 5-bit length index in the channel's fourth register.
const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

/// Per-channel length counter.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LengthCounter {
    counter: u8,
    halted: bool,
    enabled: bool,
}

impl LengthCounter {
    /// Fresh, disabled counter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the 5-bit table index. Ignored while the channel is
    /// disabled through $4015.
    pub fn load(&mut self, index: u8) {
        if self.enabled {
            self.counter = LENGTH_TABLE[usize::from(index & 0x1F)];
        }
    }

    /// Halt flag (the envelope loop bit doubles as halt).
    pub fn set_halted(&mut self, halted: bool) {
        self.halted = halted;
    }

    /// $4015 enable bit. Disabling zeroes the counter immediately.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.counter = 0;
        }
    }

    /// Half-frame clock: count down toward silence unless halted.
    pub fn clock(&mut self) {
        if !self.halted && self.counter > 0 {
            self.counter -= 1;
        }
    }

    /// True while the channel should produce output.
    #[must_use]
    pub fn active(&self) -> bool {
        self.counter > 0
    }

    /// Current counter value.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_requires_enable() {
        let mut lc = LengthCounter::new();
        lc.load(1);
        assert!(!lc.active());

        lc.set_enabled(true);
        lc.load(1);
        assert_eq!(lc.value(), 254);
    }

    #[test]
    fn clock_counts_down_unless_halted() {
        let mut lc = LengthCounter::new();
        lc.set_enabled(true);
        lc.load(3); // 2
        lc.clock();
        assert_eq!(lc.value(), 1);

        lc.set_halted(true);
        lc.clock();
        assert_eq!(lc.value(), 1);

        lc.set_halted(false);
        lc.clock();
        assert!(!lc.active());
    }

    #[test]
    fn disable_silences_immediately() {
        let mut lc = LengthCounter::new();
        lc.set_enabled(true);
        lc.load(0);
        assert!(lc.active());
        lc.set_enabled(false);
        assert!(!lc.active());
    }
}
