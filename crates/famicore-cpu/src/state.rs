//! CPU state snapshot for save states.

use serde::{Deserialize, Serialize};

/// Complete CPU register and signal state.
///
/// Restoring this struct via [`crate::Cpu::load_state`] reproduces the CPU
/// bit-for-bit, including the cycle counter and any in-flight stall or
/// interrupt signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuState {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Program counter.
    pub pc: u16,
    /// Stack pointer.
    pub sp: u8,
    /// Status register bits.
    pub status: u8,
    /// Total cycles executed.
    pub cycles: u64,
    /// Remaining stall cycles.
    pub stall: u16,
    /// Pending NMI edge.
    pub nmi_pending: bool,
    /// IRQ line level.
    pub irq_pending: bool,
}
