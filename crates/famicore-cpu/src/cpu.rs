//! 6502 CPU core.
//!
//! Per-instruction stepping with the NES interrupt model: NMI is an edge
//! the PPU raises and the CPU clears on service, IRQ is a level the APU or
//! mapper holds asserted, and DMA freezes the CPU through the stall counter
//! while the rest of the machine keeps time.

use crate::addressing::{Mode, Resolved};
use crate::bus::Bus;
use crate::opcodes::OPCODE_TABLE;
use crate::state::CpuState;
use crate::status::Status;
use crate::{vectors, CpuError};

/// Behavior when an opcode outside the supported set is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpcodeMode {
    /// Fail the step with [`CpuError::UnsupportedOpcode`].
    #[default]
    Strict,
    /// Log and execute the opcode as a two-byte NOP.
    Lenient,
}

/// NES 6502 CPU.
#[derive(Debug)]
pub struct Cpu {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Program counter.
    pub pc: u16,
    /// Stack pointer; the stack lives at $0100-$01FF.
    pub sp: u8,
    /// Status flags.
    pub status: Status,
    /// Total cycles executed.
    pub cycles: u64,
    /// Cycles the CPU must idle before the next instruction (DMA, DMC).
    stall: u16,
    /// Pending NMI edge from the PPU.
    nmi_pending: bool,
    /// IRQ line level from the APU or mapper.
    irq_pending: bool,
    /// Unknown-opcode behavior, fixed at construction.
    opcode_mode: OpcodeMode,
}

impl Cpu {
    /// Create a CPU in power-on state with strict opcode handling.
    #[must_use]
    pub fn new() -> Self {
        Self::with_opcode_mode(OpcodeMode::Strict)
    }

    /// Create a CPU with the given unknown-opcode behavior.
    #[must_use]
    pub fn with_opcode_mode(opcode_mode: OpcodeMode) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0xFD,
            status: Status::POWER_ON,
            cycles: 0,
            stall: 0,
            nmi_pending: false,
            irq_pending: false,
            opcode_mode,
        }
    }

    /// Reset the CPU.
    ///
    /// SP drops by 3 with no stack writes, I is set, the PC is loaded from
    /// the RESET vector, and 7 cycles are charged.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.sp = self.sp.wrapping_sub(3);
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vectors::RESET);
        self.cycles += 7;
        self.stall = 0;
        self.nmi_pending = false;
        self.irq_pending = false;
    }

    /// Execute one step and return the cycles consumed.
    ///
    /// In order: burn a stall cycle if any are owed; otherwise service a
    /// pending NMI edge, else a pending IRQ when I is clear; then fetch,
    /// decode, and execute one instruction, charging base cycles plus
    /// branch and page-cross penalties. When the handler left the PC
    /// untouched, the PC advances by the instruction length.
    pub fn step(&mut self, bus: &mut impl Bus) -> Result<u8, CpuError> {
        if self.stall > 0 {
            self.stall -= 1;
            self.cycles += 1;
            return Ok(1);
        }

        let start = self.cycles;

        if self.nmi_pending {
            self.nmi_pending = false;
            self.interrupt(bus, vectors::NMI);
        } else if self.irq_pending && !self.status.contains(Status::I) {
            self.interrupt(bus, vectors::IRQ);
        }

        let opcode_pc = self.pc;
        let opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);

        let info = &OPCODE_TABLE[opcode as usize];
        let prev_pc = self.pc;

        let extra = match self.execute(opcode, info.mode, bus) {
            Ok(extra) => extra,
            Err(err) => match self.opcode_mode {
                OpcodeMode::Strict => return Err(err),
                OpcodeMode::Lenient => {
                    log::debug!(
                        "unsupported opcode ${opcode:02X} at ${opcode_pc:04X}, running as NOP"
                    );
                    0
                }
            },
        };

        self.cycles += u64::from(info.cycles) + u64::from(extra);

        if self.pc == prev_pc {
            self.pc = self.pc.wrapping_add(u16::from(info.len - 1));
        }

        Ok((self.cycles - start) as u8)
    }

    /// Raise the NMI edge. Cleared when the CPU services it.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Set the IRQ line level. Held until the asserting device releases it.
    pub fn set_irq(&mut self, asserted: bool) {
        self.irq_pending = asserted;
    }

    /// Add stall cycles; the CPU idles for this many steps while the rest
    /// of the machine keeps running. Used by OAM DMA and DMC fetches.
    pub fn add_stall(&mut self, cycles: u16) {
        self.stall += cycles;
    }

    /// Remaining stall cycles.
    #[must_use]
    pub fn stall(&self) -> u16 {
        self.stall
    }

    /// True while an NMI edge is waiting to be serviced.
    #[must_use]
    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Snapshot the CPU for a save state.
    #[must_use]
    pub fn save_state(&self) -> CpuState {
        CpuState {
            a: self.a,
            x: self.x,
            y: self.y,
            pc: self.pc,
            sp: self.sp,
            status: self.status.bits(),
            cycles: self.cycles,
            stall: self.stall,
            nmi_pending: self.nmi_pending,
            irq_pending: self.irq_pending,
        }
    }

    /// Restore the CPU from a save state.
    pub fn load_state(&mut self, state: &CpuState) {
        self.a = state.a;
        self.x = state.x;
        self.y = state.y;
        self.pc = state.pc;
        self.sp = state.sp;
        self.status = Status::from_bits_truncate(state.status);
        self.cycles = state.cycles;
        self.stall = state.stall;
        self.nmi_pending = state.nmi_pending;
        self.irq_pending = state.irq_pending;
    }

    /// Service an interrupt: push PC and status (B clear), set I, load the
    /// vector, charge 7 cycles.
    fn interrupt(&mut self, bus: &mut impl Bus, vector: u16) {
        self.push_u16(bus, self.pc);
        self.push(bus, self.status.to_stack_byte(false));
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vector);
        self.cycles += 7;
    }

    /// Dispatch one opcode. Returns the penalty cycles the handler charged.
    #[allow(clippy::too_many_lines)]
    fn execute(&mut self, opcode: u8, mode: Mode, bus: &mut impl Bus) -> Result<u8, CpuError> {
        let extra = match opcode {
            // Load/store
            0xA9 | 0xA5 | 0xB5 | 0xAD | 0xBD | 0xB9 | 0xA1 | 0xB1 => self.lda(bus, mode),
            0xA2 | 0xA6 | 0xB6 | 0xAE | 0xBE => self.ldx(bus, mode),
            0xA0 | 0xA4 | 0xB4 | 0xAC | 0xBC => self.ldy(bus, mode),
            0x85 | 0x95 | 0x8D | 0x9D | 0x99 | 0x81 | 0x91 => self.sta(bus, mode),
            0x86 | 0x96 | 0x8E => self.stx(bus, mode),
            0x84 | 0x94 | 0x8C => self.sty(bus, mode),

            // Transfers
            0xAA => self.tax(),
            0xA8 => self.tay(),
            0x8A => self.txa(),
            0x98 => self.tya(),
            0xBA => self.tsx(),
            0x9A => self.txs(),

            // Stack
            0x48 => self.pha(bus),
            0x08 => self.php(bus),
            0x68 => self.pla(bus),
            0x28 => self.plp(bus),

            // Arithmetic
            0x69 | 0x65 | 0x75 | 0x6D | 0x7D | 0x79 | 0x61 | 0x71 => self.adc(bus, mode),
            0xE9 | 0xE5 | 0xF5 | 0xED | 0xFD | 0xF9 | 0xE1 | 0xF1 | 0xEB => self.sbc(bus, mode),

            // Increment/decrement
            0xE6 | 0xF6 | 0xEE | 0xFE => self.inc(bus, mode),
            0xC6 | 0xD6 | 0xCE | 0xDE => self.dec(bus, mode),
            0xE8 => self.inx(),
            0xC8 => self.iny(),
            0xCA => self.dex(),
            0x88 => self.dey(),

            // Logic
            0x29 | 0x25 | 0x35 | 0x2D | 0x3D | 0x39 | 0x21 | 0x31 => self.and(bus, mode),
            0x09 | 0x05 | 0x15 | 0x0D | 0x1D | 0x19 | 0x01 | 0x11 => self.ora(bus, mode),
            0x49 | 0x45 | 0x55 | 0x4D | 0x5D | 0x59 | 0x41 | 0x51 => self.eor(bus, mode),
            0x24 | 0x2C => self.bit(bus, mode),

            // Shift/rotate
            0x0A | 0x06 | 0x16 | 0x0E | 0x1E => self.asl(bus, mode),
            0x4A | 0x46 | 0x56 | 0x4E | 0x5E => self.lsr(bus, mode),
            0x2A | 0x26 | 0x36 | 0x2E | 0x3E => self.rol(bus, mode),
            0x6A | 0x66 | 0x76 | 0x6E | 0x7E => self.ror(bus, mode),

            // Compare
            0xC9 | 0xC5 | 0xD5 | 0xCD | 0xDD | 0xD9 | 0xC1 | 0xD1 => self.cmp(bus, mode),
            0xE0 | 0xE4 | 0xEC => self.cpx(bus, mode),
            0xC0 | 0xC4 | 0xCC => self.cpy(bus, mode),

            // Branches
            0x10 => self.branch(bus, !self.status.contains(Status::N)),
            0x30 => self.branch(bus, self.status.contains(Status::N)),
            0x50 => self.branch(bus, !self.status.contains(Status::V)),
            0x70 => self.branch(bus, self.status.contains(Status::V)),
            0x90 => self.branch(bus, !self.status.contains(Status::C)),
            0xB0 => self.branch(bus, self.status.contains(Status::C)),
            0xD0 => self.branch(bus, !self.status.contains(Status::Z)),
            0xF0 => self.branch(bus, self.status.contains(Status::Z)),

            // Jumps and returns
            0x4C | 0x6C => self.jmp(bus, mode),
            0x20 => self.jsr(bus),
            0x60 => self.rts(bus),
            0x40 => self.rti(bus),
            0x00 => self.brk(bus),

            // Flags
            0x18 => self.flag(Status::C, false),
            0x38 => self.flag(Status::C, true),
            0x58 => self.flag(Status::I, false),
            0x78 => self.flag(Status::I, true),
            0xB8 => self.flag(Status::V, false),
            0xD8 => self.flag(Status::D, false),
            0xF8 => self.flag(Status::D, true),

            // NOPs, official and unofficial. Multi-byte variants still
            // perform the operand read.
            0xEA | 0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => 0,
            0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 | 0x04 | 0x44 | 0x64 | 0x14 | 0x34 | 0x54 | 0x74
            | 0xD4 | 0xF4 | 0x0C | 0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => {
                self.nop_read(bus, mode)
            }

            // Unofficial opcodes exercised by nestest
            0xA7 | 0xB7 | 0xAF | 0xBF | 0xA3 | 0xB3 => self.lax(bus, mode),
            0x87 | 0x97 | 0x8F | 0x83 => self.sax(bus, mode),
            0xC7 | 0xD7 | 0xCF | 0xDF | 0xDB | 0xC3 | 0xD3 => self.dcp(bus, mode),
            0xE7 | 0xF7 | 0xEF | 0xFF | 0xFB | 0xE3 | 0xF3 => self.isc(bus, mode),
            0x07 | 0x17 | 0x0F | 0x1F | 0x1B | 0x03 | 0x13 => self.slo(bus, mode),
            0x27 | 0x37 | 0x2F | 0x3F | 0x3B | 0x23 | 0x33 => self.rla(bus, mode),
            0x47 | 0x57 | 0x4F | 0x5F | 0x5B | 0x43 | 0x53 => self.sre(bus, mode),
            0x67 | 0x77 | 0x6F | 0x7F | 0x7B | 0x63 | 0x73 => self.rra(bus, mode),

            _ => {
                return Err(CpuError::UnsupportedOpcode {
                    opcode,
                    pc: self.pc.wrapping_sub(1),
                })
            }
        };
        Ok(extra)
    }

    // ===== operand helpers =====

    fn resolve(&mut self, bus: &mut impl Bus, mode: Mode) -> Resolved {
        mode.resolve(self.pc, self.x, self.y, bus)
    }

    /// Push a byte; SP wraps within $0100-$01FF.
    fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    fn push_u16(&mut self, bus: &mut impl Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, (value & 0xFF) as u8);
    }

    fn pop_u16(&mut self, bus: &mut impl Bus) -> u16 {
        let lo = u16::from(self.pop(bus));
        let hi = u16::from(self.pop(bus));
        hi << 8 | lo
    }

    fn set_zn(&mut self, value: u8) {
        self.status.set_zn(value);
    }

    // ===== loads and stores =====

    fn lda(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        self.a = bus.read(operand.addr);
        self.set_zn(self.a);
        u8::from(operand.page_crossed)
    }

    fn ldx(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        self.x = bus.read(operand.addr);
        self.set_zn(self.x);
        u8::from(operand.page_crossed)
    }

    fn ldy(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        self.y = bus.read(operand.addr);
        self.set_zn(self.y);
        u8::from(operand.page_crossed)
    }

    fn sta(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        bus.write(operand.addr, self.a);
        0
    }

    fn stx(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        bus.write(operand.addr, self.x);
        0
    }

    fn sty(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        bus.write(operand.addr, self.y);
        0
    }

    // ===== transfers =====

    fn tax(&mut self) -> u8 {
        self.x = self.a;
        self.set_zn(self.x);
        0
    }

    fn tay(&mut self) -> u8 {
        self.y = self.a;
        self.set_zn(self.y);
        0
    }

    fn txa(&mut self) -> u8 {
        self.a = self.x;
        self.set_zn(self.a);
        0
    }

    fn tya(&mut self) -> u8 {
        self.a = self.y;
        self.set_zn(self.a);
        0
    }

    fn tsx(&mut self) -> u8 {
        self.x = self.sp;
        self.set_zn(self.x);
        0
    }

    fn txs(&mut self) -> u8 {
        self.sp = self.x;
        0
    }

    // ===== stack ops =====

    fn pha(&mut self, bus: &mut impl Bus) -> u8 {
        self.push(bus, self.a);
        0
    }

    fn php(&mut self, bus: &mut impl Bus) -> u8 {
        let value = self.status.to_stack_byte(true);
        self.push(bus, value);
        0
    }

    fn pla(&mut self, bus: &mut impl Bus) -> u8 {
        self.a = self.pop(bus);
        self.set_zn(self.a);
        0
    }

    fn plp(&mut self, bus: &mut impl Bus) -> u8 {
        let value = self.pop(bus);
        self.status = Status::from_stack_byte(value);
        0
    }

    // ===== arithmetic =====

    /// Add with carry. Decimal mode has no effect on the 2A03.
    fn add_to_accumulator(&mut self, value: u8) {
        let carry = u16::from(self.status.contains(Status::C));
        let sum = u16::from(self.a) + u16::from(value) + carry;
        let result = sum as u8;

        self.status.set(Status::C, sum > 0xFF);
        self.status.set(
            Status::V,
            (!(self.a ^ value) & (self.a ^ result)) & 0x80 != 0,
        );
        self.a = result;
        self.set_zn(self.a);
    }

    fn adc(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr);
        self.add_to_accumulator(value);
        u8::from(operand.page_crossed)
    }

    fn sbc(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr);
        self.add_to_accumulator(!value);
        u8::from(operand.page_crossed)
    }

    fn compare(&mut self, bus: &mut impl Bus, mode: Mode, register: u8) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr);
        self.status.set(Status::C, register >= value);
        self.set_zn(register.wrapping_sub(value));
        u8::from(operand.page_crossed)
    }

    fn cmp(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        self.compare(bus, mode, self.a)
    }

    fn cpx(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        self.compare(bus, mode, self.x)
    }

    fn cpy(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        self.compare(bus, mode, self.y)
    }

    // ===== increment/decrement =====

    fn inc(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr).wrapping_add(1);
        bus.write(operand.addr, value);
        self.set_zn(value);
        0
    }

    fn dec(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr).wrapping_sub(1);
        bus.write(operand.addr, value);
        self.set_zn(value);
        0
    }

    fn inx(&mut self) -> u8 {
        self.x = self.x.wrapping_add(1);
        self.set_zn(self.x);
        0
    }

    fn iny(&mut self) -> u8 {
        self.y = self.y.wrapping_add(1);
        self.set_zn(self.y);
        0
    }

    fn dex(&mut self) -> u8 {
        self.x = self.x.wrapping_sub(1);
        self.set_zn(self.x);
        0
    }

    fn dey(&mut self) -> u8 {
        self.y = self.y.wrapping_sub(1);
        self.set_zn(self.y);
        0
    }

    // ===== logic =====

    fn and(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        self.a &= bus.read(operand.addr);
        self.set_zn(self.a);
        u8::from(operand.page_crossed)
    }

    fn ora(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        self.a |= bus.read(operand.addr);
        self.set_zn(self.a);
        u8::from(operand.page_crossed)
    }

    fn eor(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        self.a ^= bus.read(operand.addr);
        self.set_zn(self.a);
        u8::from(operand.page_crossed)
    }

    fn bit(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr);
        self.status.set(Status::Z, self.a & value == 0);
        self.status.set(Status::V, value & 0x40 != 0);
        self.status.set(Status::N, value & 0x80 != 0);
        0
    }

    // ===== shifts and rotates =====

    /// Read the shift operand: the accumulator or memory.
    fn read_shift_operand(&mut self, bus: &mut impl Bus, mode: Mode) -> (u8, Option<u16>) {
        if mode == Mode::Accumulator {
            (self.a, None)
        } else {
            let operand = self.resolve(bus, mode);
            (bus.read(operand.addr), Some(operand.addr))
        }
    }

    fn write_shift_result(&mut self, bus: &mut impl Bus, target: Option<u16>, value: u8) {
        match target {
            Some(addr) => bus.write(addr, value),
            None => self.a = value,
        }
        self.set_zn(value);
    }

    fn asl(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let (value, target) = self.read_shift_operand(bus, mode);
        self.status.set(Status::C, value & 0x80 != 0);
        self.write_shift_result(bus, target, value << 1);
        0
    }

    fn lsr(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let (value, target) = self.read_shift_operand(bus, mode);
        self.status.set(Status::C, value & 0x01 != 0);
        self.write_shift_result(bus, target, value >> 1);
        0
    }

    fn rol(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let (value, target) = self.read_shift_operand(bus, mode);
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x80 != 0);
        self.write_shift_result(bus, target, value << 1 | carry_in);
        0
    }

    fn ror(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let (value, target) = self.read_shift_operand(bus, mode);
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x01 != 0);
        self.write_shift_result(bus, target, value >> 1 | carry_in << 7);
        0
    }

    // ===== control flow =====

    /// Conditional branch: +1 cycle when taken, +1 more when the target is
    /// on a different page from the instruction end.
    fn branch(&mut self, bus: &mut impl Bus, condition: bool) -> u8 {
        if !condition {
            return 0;
        }

        let offset = bus.read(self.pc) as i8;
        let next = self.pc.wrapping_add(1);
        let target = next.wrapping_add(offset as u16);
        self.pc = target;

        if next & 0xFF00 == target & 0xFF00 {
            1
        } else {
            2
        }
    }

    fn jmp(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        self.pc = operand.addr;
        0
    }

    fn jsr(&mut self, bus: &mut impl Bus) -> u8 {
        let target = bus.read_u16(self.pc);
        // Return address is the last byte of this instruction; RTS adds 1.
        self.push_u16(bus, self.pc.wrapping_add(1));
        self.pc = target;
        0
    }

    fn rts(&mut self, bus: &mut impl Bus) -> u8 {
        self.pc = self.pop_u16(bus).wrapping_add(1);
        0
    }

    fn rti(&mut self, bus: &mut impl Bus) -> u8 {
        let value = self.pop(bus);
        self.status = Status::from_stack_byte(value);
        self.pc = self.pop_u16(bus);
        0
    }

    /// BRK: software interrupt. Pushes PC past the padding byte and status
    /// with B set, then vectors through $FFFE. Never surfaced as an error.
    fn brk(&mut self, bus: &mut impl Bus) -> u8 {
        self.push_u16(bus, self.pc.wrapping_add(1));
        let value = self.status.to_stack_byte(true);
        self.push(bus, value);
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vectors::IRQ);
        0
    }

    fn flag(&mut self, flag: Status, value: bool) -> u8 {
        self.status.set(flag, value);
        0
    }

    /// Multi-byte NOP: performs the operand read and discards the value.
    /// Only the absolute-indexed variants can report a crossing, and those
    /// are exactly the ones that pay for it.
    fn nop_read(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let _ = bus.read(operand.addr);
        u8::from(operand.page_crossed)
    }

    // ===== unofficial opcodes =====

    fn lax(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr);
        self.a = value;
        self.x = value;
        self.set_zn(value);
        u8::from(operand.page_crossed)
    }

    fn sax(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        bus.write(operand.addr, self.a & self.x);
        0
    }

    /// DEC then CMP.
    fn dcp(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr).wrapping_sub(1);
        bus.write(operand.addr, value);
        self.status.set(Status::C, self.a >= value);
        self.set_zn(self.a.wrapping_sub(value));
        0
    }

    /// INC then SBC.
    fn isc(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr).wrapping_add(1);
        bus.write(operand.addr, value);
        self.add_to_accumulator(!value);
        0
    }

    /// ASL then ORA.
    fn slo(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr);
        self.status.set(Status::C, value & 0x80 != 0);
        let result = value << 1;
        bus.write(operand.addr, result);
        self.a |= result;
        self.set_zn(self.a);
        0
    }

    /// ROL then AND.
    fn rla(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr);
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x80 != 0);
        let result = value << 1 | carry_in;
        bus.write(operand.addr, result);
        self.a &= result;
        self.set_zn(self.a);
        0
    }

    /// LSR then EOR.
    fn sre(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr);
        self.status.set(Status::C, value & 0x01 != 0);
        let result = value >> 1;
        bus.write(operand.addr, result);
        self.a ^= result;
        self.set_zn(self.a);
        0
    }

    /// ROR then ADC.
    fn rra(&mut self, bus: &mut impl Bus, mode: Mode) -> u8 {
        let operand = self.resolve(bus, mode);
        let value = bus.read(operand.addr);
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x01 != 0);
        let result = value >> 1 | carry_in << 7;
        bus.write(operand.addr, result);
        self.add_to_accumulator(result);
        0
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
