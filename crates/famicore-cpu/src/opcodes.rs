//! Opcode lookup table for the 6502.
//!
//! A flat 256-entry table of `{mnemonic, mode, length, base cycles, page
//! penalty, official}` records, indexed by opcode byte. The table covers all
//! 151 official opcodes plus the unofficial set exercised by nestest.nes
//! (LAX, SAX, DCP, ISC, SLO, RLA, SRE, RRA, the $EB SBC, and the multi-size
//! NOPs). The remaining slots are marked `???`: executing one is an error in
//! strict mode and a two-byte NOP in lenient mode.

use crate::addressing::Mode;

/// One opcode table entry.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    /// Instruction mnemonic, `"???"` for unsupported slots.
    pub mnemonic: &'static str,
    /// Addressing mode.
    pub mode: Mode,
    /// Total instruction length in bytes, including the opcode.
    pub len: u8,
    /// Base cycle count before penalties.
    pub cycles: u8,
    /// True when a page-crossing read adds one cycle.
    pub page_penalty: bool,
    /// True for documented opcodes.
    pub official: bool,
}

const fn op(mnemonic: &'static str, mode: Mode, len: u8, cycles: u8) -> OpcodeInfo {
    OpcodeInfo {
        mnemonic,
        mode,
        len,
        cycles,
        page_penalty: false,
        official: true,
    }
}

/// Official read instruction that pays a page-cross penalty.
const fn op_p(mnemonic: &'static str, mode: Mode, len: u8, cycles: u8) -> OpcodeInfo {
    OpcodeInfo {
        page_penalty: true,
        ..op(mnemonic, mode, len, cycles)
    }
}

const fn ill(mnemonic: &'static str, mode: Mode, len: u8, cycles: u8) -> OpcodeInfo {
    OpcodeInfo {
        official: false,
        ..op(mnemonic, mode, len, cycles)
    }
}

const fn ill_p(mnemonic: &'static str, mode: Mode, len: u8, cycles: u8) -> OpcodeInfo {
    OpcodeInfo {
        official: false,
        ..op_p(mnemonic, mode, len, cycles)
    }
}

/// Unsupported slot. Length and cycles describe the lenient-mode fallback
/// (a two-byte NOP); strict mode never reaches them.
const fn bad() -> OpcodeInfo {
    OpcodeInfo {
        mnemonic: "???",
        mode: Mode::Implied,
        len: 2,
        cycles: 2,
        page_penalty: false,
        official: false,
    }
}

use Mode::{
    Absolute as Abs, AbsoluteX as Abx, AbsoluteY as Aby, Accumulator as Acc, Immediate as Imm,
    Implied as Imp, Indirect as Ind, IndirectX as Izx, IndirectY as Izy, Relative as Rel,
    ZeroPage as Zpg, ZeroPageX as Zpx, ZeroPageY as Zpy,
};

/// The complete 256-entry opcode table, indexed by opcode byte.
#[rustfmt::skip]
pub const OPCODE_TABLE: [OpcodeInfo; 256] = [
    /* 0x00 */ op("BRK", Imp, 1, 7),   op("ORA", Izx, 2, 6),   bad(),                  ill("SLO", Izx, 2, 8),
    /* 0x04 */ ill("NOP", Zpg, 2, 3),  op("ORA", Zpg, 2, 3),   op("ASL", Zpg, 2, 5),   ill("SLO", Zpg, 2, 5),
    /* 0x08 */ op("PHP", Imp, 1, 3),   op("ORA", Imm, 2, 2),   op("ASL", Acc, 1, 2),   bad(),
    /* 0x0C */ ill("NOP", Abs, 3, 4),  op("ORA", Abs, 3, 4),   op("ASL", Abs, 3, 6),   ill("SLO", Abs, 3, 6),
    /* 0x10 */ op("BPL", Rel, 2, 2),   op_p("ORA", Izy, 2, 5), bad(),                  ill("SLO", Izy, 2, 8),
    /* 0x14 */ ill("NOP", Zpx, 2, 4),  op("ORA", Zpx, 2, 4),   op("ASL", Zpx, 2, 6),   ill("SLO", Zpx, 2, 6),
    /* 0x18 */ op("CLC", Imp, 1, 2),   op_p("ORA", Aby, 3, 4), ill("NOP", Imp, 1, 2),  ill("SLO", Aby, 3, 7),
    /* 0x1C */ ill_p("NOP", Abx, 3, 4),op_p("ORA", Abx, 3, 4), op("ASL", Abx, 3, 7),   ill("SLO", Abx, 3, 7),
    /* 0x20 */ op("JSR", Abs, 3, 6),   op("AND", Izx, 2, 6),   bad(),                  ill("RLA", Izx, 2, 8),
    /* 0x24 */ op("BIT", Zpg, 2, 3),   op("AND", Zpg, 2, 3),   op("ROL", Zpg, 2, 5),   ill("RLA", Zpg, 2, 5),
    /* 0x28 */ op("PLP", Imp, 1, 4),   op("AND", Imm, 2, 2),   op("ROL", Acc, 1, 2),   bad(),
    /* 0x2C */ op("BIT", Abs, 3, 4),   op("AND", Abs, 3, 4),   op("ROL", Abs, 3, 6),   ill("RLA", Abs, 3, 6),
    /* 0x30 */ op("BMI", Rel, 2, 2),   op_p("AND", Izy, 2, 5), bad(),                  ill("RLA", Izy, 2, 8),
    /* 0x34 */ ill("NOP", Zpx, 2, 4),  op("AND", Zpx, 2, 4),   op("ROL", Zpx, 2, 6),   ill("RLA", Zpx, 2, 6),
    /* 0x38 */ op("SEC", Imp, 1, 2),   op_p("AND", Aby, 3, 4), ill("NOP", Imp, 1, 2),  ill("RLA", Aby, 3, 7),
    /* 0x3C */ ill_p("NOP", Abx, 3, 4),op_p("AND", Abx, 3, 4), op("ROL", Abx, 3, 7),   ill("RLA", Abx, 3, 7),
    /* 0x40 */ op("RTI", Imp, 1, 6),   op("EOR", Izx, 2, 6),   bad(),                  ill("SRE", Izx, 2, 8),
    /* 0x44 */ ill("NOP", Zpg, 2, 3),  op("EOR", Zpg, 2, 3),   op("LSR", Zpg, 2, 5),   ill("SRE", Zpg, 2, 5),
    /* 0x48 */ op("PHA", Imp, 1, 3),   op("EOR", Imm, 2, 2),   op("LSR", Acc, 1, 2),   bad(),
    /* 0x4C */ op("JMP", Abs, 3, 3),   op("EOR", Abs, 3, 4),   op("LSR", Abs, 3, 6),   ill("SRE", Abs, 3, 6),
    /* 0x50 */ op("BVC", Rel, 2, 2),   op_p("EOR", Izy, 2, 5), bad(),                  ill("SRE", Izy, 2, 8),
    /* 0x54 */ ill("NOP", Zpx, 2, 4),  op("EOR", Zpx, 2, 4),   op("LSR", Zpx, 2, 6),   ill("SRE", Zpx, 2, 6),
    /* 0x58 */ op("CLI", Imp, 1, 2),   op_p("EOR", Aby, 3, 4), ill("NOP", Imp, 1, 2),  ill("SRE", Aby, 3, 7),
    /* 0x5C */ ill_p("NOP", Abx, 3, 4),op_p("EOR", Abx, 3, 4), op("LSR", Abx, 3, 7),   ill("SRE", Abx, 3, 7),
    /* 0x60 */ op("RTS", Imp, 1, 6),   op("ADC", Izx, 2, 6),   bad(),                  ill("RRA", Izx, 2, 8),
    /* 0x64 */ ill("NOP", Zpg, 2, 3),  op("ADC", Zpg, 2, 3),   op("ROR", Zpg, 2, 5),   ill("RRA", Zpg, 2, 5),
    /* 0x68 */ op("PLA", Imp, 1, 4),   op("ADC", Imm, 2, 2),   op("ROR", Acc, 1, 2),   bad(),
    /* 0x6C */ op("JMP", Ind, 3, 5),   op("ADC", Abs, 3, 4),   op("ROR", Abs, 3, 6),   ill("RRA", Abs, 3, 6),
    /* 0x70 */ op("BVS", Rel, 2, 2),   op_p("ADC", Izy, 2, 5), bad(),                  ill("RRA", Izy, 2, 8),
    /* 0x74 */ ill("NOP", Zpx, 2, 4),  op("ADC", Zpx, 2, 4),   op("ROR", Zpx, 2, 6),   ill("RRA", Zpx, 2, 6),
    /* 0x78 */ op("SEI", Imp, 1, 2),   op_p("ADC", Aby, 3, 4), ill("NOP", Imp, 1, 2),  ill("RRA", Aby, 3, 7),
    /* 0x7C */ ill_p("NOP", Abx, 3, 4),op_p("ADC", Abx, 3, 4), op("ROR", Abx, 3, 7),   ill("RRA", Abx, 3, 7),
    /* 0x80 */ ill("NOP", Imm, 2, 2),  op("STA", Izx, 2, 6),   ill("NOP", Imm, 2, 2),  ill("SAX", Izx, 2, 6),
    /* 0x84 */ op("STY", Zpg, 2, 3),   op("STA", Zpg, 2, 3),   op("STX", Zpg, 2, 3),   ill("SAX", Zpg, 2, 3),
    /* 0x88 */ op("DEY", Imp, 1, 2),   ill("NOP", Imm, 2, 2),  op("TXA", Imp, 1, 2),   bad(),
    /* 0x8C */ op("STY", Abs, 3, 4),   op("STA", Abs, 3, 4),   op("STX", Abs, 3, 4),   ill("SAX", Abs, 3, 4),
    /* 0x90 */ op("BCC", Rel, 2, 2),   op("STA", Izy, 2, 6),   bad(),                  bad(),
    /* 0x94 */ op("STY", Zpx, 2, 4),   op("STA", Zpx, 2, 4),   op("STX", Zpy, 2, 4),   ill("SAX", Zpy, 2, 4),
    /* 0x98 */ op("TYA", Imp, 1, 2),   op("STA", Aby, 3, 5),   op("TXS", Imp, 1, 2),   bad(),
    /* 0x9C */ bad(),                  op("STA", Abx, 3, 5),   bad(),                  bad(),
    /* 0xA0 */ op("LDY", Imm, 2, 2),   op("LDA", Izx, 2, 6),   op("LDX", Imm, 2, 2),   ill("LAX", Izx, 2, 6),
    /* 0xA4 */ op("LDY", Zpg, 2, 3),   op("LDA", Zpg, 2, 3),   op("LDX", Zpg, 2, 3),   ill("LAX", Zpg, 2, 3),
    /* 0xA8 */ op("TAY", Imp, 1, 2),   op("LDA", Imm, 2, 2),   op("TAX", Imp, 1, 2),   bad(),
    /* 0xAC */ op("LDY", Abs, 3, 4),   op("LDA", Abs, 3, 4),   op("LDX", Abs, 3, 4),   ill("LAX", Abs, 3, 4),
    /* 0xB0 */ op("BCS", Rel, 2, 2),   op_p("LDA", Izy, 2, 5), bad(),                  ill_p("LAX", Izy, 2, 5),
    /* 0xB4 */ op("LDY", Zpx, 2, 4),   op("LDA", Zpx, 2, 4),   op("LDX", Zpy, 2, 4),   ill("LAX", Zpy, 2, 4),
    /* 0xB8 */ op("CLV", Imp, 1, 2),   op_p("LDA", Aby, 3, 4), op("TSX", Imp, 1, 2),   bad(),
    /* 0xBC */ op_p("LDY", Abx, 3, 4), op_p("LDA", Abx, 3, 4), op_p("LDX", Aby, 3, 4), ill_p("LAX", Aby, 3, 4),
    /* 0xC0 */ op("CPY", Imm, 2, 2),   op("CMP", Izx, 2, 6),   ill("NOP", Imm, 2, 2),  ill("DCP", Izx, 2, 8),
    /* 0xC4 */ op("CPY", Zpg, 2, 3),   op("CMP", Zpg, 2, 3),   op("DEC", Zpg, 2, 5),   ill("DCP", Zpg, 2, 5),
    /* 0xC8 */ op("INY", Imp, 1, 2),   op("CMP", Imm, 2, 2),   op("DEX", Imp, 1, 2),   bad(),
    /* 0xCC */ op("CPY", Abs, 3, 4),   op("CMP", Abs, 3, 4),   op("DEC", Abs, 3, 6),   ill("DCP", Abs, 3, 6),
    /* 0xD0 */ op("BNE", Rel, 2, 2),   op_p("CMP", Izy, 2, 5), bad(),                  ill("DCP", Izy, 2, 8),
    /* 0xD4 */ ill("NOP", Zpx, 2, 4),  op("CMP", Zpx, 2, 4),   op("DEC", Zpx, 2, 6),   ill("DCP", Zpx, 2, 6),
    /* 0xD8 */ op("CLD", Imp, 1, 2),   op_p("CMP", Aby, 3, 4), ill("NOP", Imp, 1, 2),  ill("DCP", Aby, 3, 7),
    /* 0xDC */ ill_p("NOP", Abx, 3, 4),op_p("CMP", Abx, 3, 4), op("DEC", Abx, 3, 7),   ill("DCP", Abx, 3, 7),
    /* 0xE0 */ op("CPX", Imm, 2, 2),   op("SBC", Izx, 2, 6),   ill("NOP", Imm, 2, 2),  ill("ISC", Izx, 2, 8),
    /* 0xE4 */ op("CPX", Zpg, 2, 3),   op("SBC", Zpg, 2, 3),   op("INC", Zpg, 2, 5),   ill("ISC", Zpg, 2, 5),
    /* 0xE8 */ op("INX", Imp, 1, 2),   op("SBC", Imm, 2, 2),   op("NOP", Imp, 1, 2),   ill("SBC", Imm, 2, 2),
    /* 0xEC */ op("CPX", Abs, 3, 4),   op("SBC", Abs, 3, 4),   op("INC", Abs, 3, 6),   ill("ISC", Abs, 3, 6),
    /* 0xF0 */ op("BEQ", Rel, 2, 2),   op_p("SBC", Izy, 2, 5), bad(),                  ill("ISC", Izy, 2, 8),
    /* 0xF4 */ ill("NOP", Zpx, 2, 4),  op("SBC", Zpx, 2, 4),   op("INC", Zpx, 2, 6),   ill("ISC", Zpx, 2, 6),
    /* 0xF8 */ op("SED", Imp, 1, 2),   op_p("SBC", Aby, 3, 4), ill("NOP", Imp, 1, 2),  ill("ISC", Aby, 3, 7),
    /* 0xFC */ ill_p("NOP", Abx, 3, 4),op_p("SBC", Abx, 3, 4), op("INC", Abx, 3, 7),   ill("ISC", Abx, 3, 7),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_all_slots() {
        assert_eq!(OPCODE_TABLE.len(), 256);
    }

    #[test]
    fn official_opcode_count() {
        let official = OPCODE_TABLE.iter().filter(|info| info.official).count();
        assert_eq!(official, 151);
    }

    #[test]
    fn lda_variants() {
        assert_eq!(OPCODE_TABLE[0xA9].mnemonic, "LDA");
        assert_eq!(OPCODE_TABLE[0xA9].mode, Mode::Immediate);
        assert_eq!(OPCODE_TABLE[0xA9].cycles, 2);
        assert_eq!(OPCODE_TABLE[0xBD].mode, Mode::AbsoluteX);
        assert!(OPCODE_TABLE[0xBD].page_penalty);
    }

    #[test]
    fn stores_never_pay_page_penalty() {
        for opcode in [0x9D, 0x99, 0x91] {
            let info = &OPCODE_TABLE[opcode];
            assert_eq!(info.mnemonic, "STA");
            assert!(!info.page_penalty);
        }
        assert_eq!(OPCODE_TABLE[0x9D].cycles, 5);
        assert_eq!(OPCODE_TABLE[0x91].cycles, 6);
    }

    #[test]
    fn jmp_modes() {
        assert_eq!(OPCODE_TABLE[0x4C].mode, Mode::Absolute);
        assert_eq!(OPCODE_TABLE[0x4C].cycles, 3);
        assert_eq!(OPCODE_TABLE[0x6C].mode, Mode::Indirect);
        assert_eq!(OPCODE_TABLE[0x6C].cycles, 5);
    }

    #[test]
    fn unsupported_slots_fall_back_to_two_byte_nop() {
        for opcode in [0x02, 0x12, 0x0B, 0x9C, 0xBB, 0xCB] {
            let info = &OPCODE_TABLE[opcode];
            assert_eq!(info.mnemonic, "???");
            assert_eq!(info.len, 2);
            assert_eq!(info.cycles, 2);
            assert!(!info.official);
        }
    }

    #[test]
    fn nop_lengths_cover_one_two_and_three_bytes() {
        assert_eq!(OPCODE_TABLE[0x1A].len, 1);
        assert_eq!(OPCODE_TABLE[0x80].len, 2);
        assert_eq!(OPCODE_TABLE[0x0C].len, 3);
    }
}
