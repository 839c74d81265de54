//! CPU status register (P) flags.
//!
//! ```text
//! 7  6  5  4  3  2  1  0
//! N  V  U  B  D  I  Z  C
//! │  │  │  │  │  │  │  └─ Carry
//! │  │  │  │  │  │  └──── Zero
//! │  │  │  │  │  └─────── Interrupt Disable
//! │  │  │  │  └────────── Decimal (no effect on the 2A03)
//! │  │  │  └───────────── Break (1 when pushed by PHP/BRK, 0 by IRQ/NMI)
//! │  │  └──────────────── Unused (always 1 when pushed)
//! │  └─────────────────── Overflow
//! └────────────────────── Negative
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// CPU status register flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct Status: u8 {
        /// Carry.
        const C = 1 << 0;
        /// Zero.
        const Z = 1 << 1;
        /// Interrupt disable. Masks IRQ; NMI is unaffected.
        const I = 1 << 2;
        /// Decimal mode. Present but has no effect on ADC/SBC (2A03).
        const D = 1 << 3;
        /// Break. Only meaningful in the byte pushed to the stack.
        const B = 1 << 4;
        /// Unused. Always 1 when the status byte is pushed.
        const U = 1 << 5;
        /// Overflow.
        const V = 1 << 6;
        /// Negative.
        const N = 1 << 7;
    }
}

impl Status {
    /// Power-on status: I and U set ($24).
    pub const POWER_ON: Self = Self::I.union(Self::U);

    /// Set Zero and Negative from a result value.
    #[inline]
    pub fn set_zn(&mut self, value: u8) {
        self.set(Self::Z, value == 0);
        self.set(Self::N, value & 0x80 != 0);
    }

    /// Status byte as pushed to the stack.
    ///
    /// U is always set; B is set for PHP/BRK and clear for IRQ/NMI.
    #[inline]
    #[must_use]
    pub const fn to_stack_byte(self, brk: bool) -> u8 {
        let mut value = self.bits() | Self::U.bits();
        if brk {
            value |= Self::B.bits();
        }
        value
    }

    /// Status restored from a stack byte. B is discarded, U forced on.
    #[inline]
    #[must_use]
    pub fn from_stack_byte(value: u8) -> Self {
        Self::from_bits_truncate((value & !Self::B.bits()) | Self::U.bits())
    }
}
