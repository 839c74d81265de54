//! DMC (delta modulation) channel.
//!
//! Plays 1-bit delta-encoded samples fetched from CPU memory. The channel
//! itself never touches the bus: when its buffer runs dry it raises a
//! sample request that the system bus services, charging the CPU a 4-cycle
//! stall per fetched byte.
//!
//! Register map:
//!
//! ```text
//! $4010  IL-- RRRR   IRQ enable, loop, rate index
//! $4011  -DDD DDDD   direct load of the 7-bit output level
//! $4012  AAAA AAAA   sample address = $C000 | (A << 6)
//! $4013  LLLL LLLL   sample length  = (L << 4) | 1
//! ```

use serde::{Deserialize, Serialize};

use crate::Region;

/// Timer periods per rate index, in APU cycles (NTSC).
const DMC_PERIOD_NTSC: [u16; 16] = [
    214, 190, 170, 160, 143, 127, 113, 107, 95, 80, 71, 64, 53, 42, 36, 27,
];

/// Timer periods per rate index, in APU cycles (PAL).
const DMC_PERIOD_PAL: [u16; 16] = [
    199, 177, 158, 149, 138, 118, 105, 99, 88, 74, 66, 59, 49, 39, 33, 25,
];

/// CPU stall cycles charged per sample fetch.
pub const FETCH_STALL_CYCLES: u16 = 4;

/// Delta modulation channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dmc {
    enabled: bool,
    irq_enabled: bool,
    loop_enabled: bool,
    period_table: [u16; 16],
    timer_period: u16,
    timer_counter: u16,
    /// 7-bit output level.
    level: u8,
    /// $4012 register value.
    sample_address: u8,
    /// $4013 register value.
    sample_length: u8,
    current_address: u16,
    bytes_remaining: u16,
    shift_register: u8,
    bits_remaining: u8,
    sample_buffer: Option<u8>,
    irq_flag: bool,
}

impl Dmc {
    /// Fresh DMC for the given region.
    #[must_use]
    pub fn new(region: Region) -> Self {
        let period_table = match region {
            Region::Ntsc => DMC_PERIOD_NTSC,
            Region::Pal => DMC_PERIOD_PAL,
        };
        Self {
            enabled: false,
            irq_enabled: false,
            loop_enabled: false,
            period_table,
            timer_period: period_table[0],
            timer_counter: 0,
            level: 0,
            sample_address: 0,
            sample_length: 0,
            current_address: 0xC000,
            bytes_remaining: 0,
            shift_register: 0,
            bits_remaining: 0,
            sample_buffer: None,
            irq_flag: false,
        }
    }

    /// $4010: IRQ enable, loop, rate index.
    pub fn write_ctrl(&mut self, value: u8) {
        self.irq_enabled = value & 0x80 != 0;
        self.loop_enabled = value & 0x40 != 0;
        self.timer_period = self.period_table[usize::from(value & 0x0F)];
        if !self.irq_enabled {
            self.irq_flag = false;
        }
    }

    /// $4011: direct load of the output level.
    pub fn write_level(&mut self, value: u8) {
        self.level = value & 0x7F;
    }

    /// $4012: sample start address.
    pub fn write_sample_address(&mut self, value: u8) {
        self.sample_address = value;
    }

    /// $4013: sample length.
    pub fn write_sample_length(&mut self, value: u8) {
        self.sample_length = value;
    }

    /// $4015 enable bit. Enabling with an exhausted sample restarts it;
    /// disabling drops the remaining bytes.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if enabled {
            if self.bytes_remaining == 0 {
                self.restart();
            }
        } else {
            self.bytes_remaining = 0;
        }
    }

    fn restart(&mut self) {
        self.current_address = 0xC000 | u16::from(self.sample_address) << 6;
        self.bytes_remaining = u16::from(self.sample_length) << 4 | 1;
    }

    /// True when the channel wants a byte from CPU memory.
    #[must_use]
    pub fn needs_sample(&self) -> bool {
        self.enabled && self.sample_buffer.is_none() && self.bytes_remaining > 0
    }

    /// Address of the next sample byte.
    #[must_use]
    pub fn sample_address(&self) -> u16 {
        self.current_address
    }

    /// Deliver a fetched sample byte and advance the reader. The caller
    /// stalls the CPU for [`FETCH_STALL_CYCLES`].
    pub fn load_sample(&mut self, value: u8) {
        self.sample_buffer = Some(value);

        // Address wraps from the top of memory back to $8000.
        self.current_address = self.current_address.wrapping_add(1);
        if self.current_address == 0 {
            self.current_address = 0x8000;
        }

        self.bytes_remaining -= 1;
        if self.bytes_remaining == 0 {
            if self.loop_enabled {
                self.restart();
            } else if self.irq_enabled {
                self.irq_flag = true;
            }
        }
    }

    /// Clock the timer (every other CPU cycle).
    pub fn clock_timer(&mut self) {
        if !self.enabled {
            return;
        }

        if self.bits_remaining == 0 {
            if let Some(byte) = self.sample_buffer.take() {
                self.shift_register = byte;
                self.bits_remaining = 8;
            }
        }

        if self.timer_counter == 0 {
            self.timer_counter = self.timer_period;
            self.clock_shifter();
        } else {
            self.timer_counter -= 1;
        }
    }

    /// Shift one delta bit into the output level.
    fn clock_shifter(&mut self) {
        if self.bits_remaining == 0 {
            return;
        }

        if self.shift_register & 0x01 != 0 {
            if self.level <= 125 {
                self.level += 2;
            }
        } else if self.level >= 2 {
            self.level -= 2;
        }

        self.shift_register >>= 1;
        self.bits_remaining -= 1;
    }

    /// True while sample bytes remain ($4015 status bit 4).
    #[must_use]
    pub fn active(&self) -> bool {
        self.bytes_remaining > 0
    }

    /// Bytes left in the current sample.
    #[must_use]
    pub fn bytes_remaining(&self) -> u16 {
        self.bytes_remaining
    }

    /// True while the DMC IRQ flag is raised.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_flag
    }

    /// Clear the IRQ flag ($4015 read).
    pub fn clear_irq(&mut self) {
        self.irq_flag = false;
    }

    /// Current 7-bit output level.
    #[must_use]
    pub fn output(&self) -> u8 {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_decoding() {
        let mut dmc = Dmc::new(Region::Ntsc);

        dmc.write_ctrl(0xCF);
        assert!(dmc.irq_enabled);
        assert!(dmc.loop_enabled);
        assert_eq!(dmc.timer_period, 27);

        dmc.write_level(0xFF);
        assert_eq!(dmc.output(), 0x7F, "level is 7 bits");

        dmc.write_sample_address(0x01);
        dmc.write_sample_length(0x01);
        dmc.set_enabled(true);
        assert_eq!(dmc.sample_address(), 0xC040);
        assert_eq!(dmc.bytes_remaining(), 17);
    }

    #[test]
    fn delta_steps_clamp() {
        let mut dmc = Dmc::new(Region::Ntsc);
        dmc.enabled = true;
        dmc.level = 126;
        dmc.shift_register = 0xFF;
        dmc.bits_remaining = 8;
        dmc.clock_shifter();
        assert_eq!(dmc.output(), 126, "no increment past 125");

        dmc.level = 1;
        dmc.shift_register = 0x00;
        dmc.bits_remaining = 8;
        dmc.clock_shifter();
        assert_eq!(dmc.output(), 1, "no decrement below 2");

        dmc.level = 64;
        dmc.shift_register = 0x01;
        dmc.bits_remaining = 8;
        dmc.clock_shifter();
        assert_eq!(dmc.output(), 66);
        dmc.clock_shifter();
        assert_eq!(dmc.output(), 64);
    }

    #[test]
    fn address_wraps_to_8000() {
        let mut dmc = Dmc::new(Region::Ntsc);
        dmc.enabled = true;
        dmc.current_address = 0xFFFF;
        dmc.bytes_remaining = 2;
        dmc.load_sample(0xAA);
        assert_eq!(dmc.sample_address(), 0x8000);
    }

    #[test]
    fn completion_raises_irq_without_loop() {
        let mut dmc = Dmc::new(Region::Ntsc);
        dmc.write_ctrl(0x80); // IRQ on, no loop
        dmc.enabled = true;
        dmc.bytes_remaining = 1;
        dmc.load_sample(0x00);
        assert!(dmc.irq_pending());
        assert!(!dmc.active());
    }

    #[test]
    fn completion_restarts_with_loop() {
        let mut dmc = Dmc::new(Region::Ntsc);
        dmc.write_ctrl(0x40); // loop
        dmc.write_sample_address(0x02);
        dmc.write_sample_length(0x01);
        dmc.enabled = true;
        dmc.bytes_remaining = 1;
        dmc.current_address = 0xD000;
        dmc.load_sample(0x00);
        assert_eq!(dmc.bytes_remaining(), 17);
        assert_eq!(dmc.sample_address(), 0xC080);
        assert!(!dmc.irq_pending());
    }

    #[test]
    fn needs_sample_when_buffer_empty() {
        let mut dmc = Dmc::new(Region::Ntsc);
        dmc.write_sample_length(0x00);
        dmc.set_enabled(true);
        assert!(dmc.needs_sample());

        dmc.load_sample(0xFF);
        assert!(!dmc.needs_sample(), "buffer full");
        assert!(!dmc.active(), "single-byte sample consumed");
    }

    #[test]
    fn disabling_irq_clears_flag() {
        let mut dmc = Dmc::new(Region::Ntsc);
        dmc.irq_flag = true;
        dmc.write_ctrl(0x00);
        assert!(!dmc.irq_pending());
    }

    #[test]
    fn shifter_consumes_buffer_via_timer() {
        let mut dmc = Dmc::new(Region::Ntsc);
        dmc.write_ctrl(0x0F); // fastest rate
        dmc.write_sample_length(0x00);
        dmc.set_enabled(true);
        dmc.load_sample(0xFF); // all increments

        let start = dmc.output();
        // Eight expirations shift out all bits.
        for _ in 0..(8 * 28) {
            dmc.clock_timer();
        }
        assert_eq!(dmc.output(), start + 16);
    }
}
