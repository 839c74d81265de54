//! NES cartridge loading (iNES and NES 2.0 containers).
//!
//! The 16-byte header carries the magic `NES\x1A`, PRG size in 16 KiB
//! units, CHR size in 8 KiB units, and the flag bytes that encode mapper,
//! mirroring, battery, and trainer presence. NES 2.0 extends the mapper to
//! 12 bits, adds a submapper nibble, and allows exponent-coded ROM sizes.

use crate::mapper::Mirroring;
use crate::RomError;

/// PRG-ROM bank granularity (16 KiB).
pub const PRG_BANK_SIZE: usize = 0x4000;
/// CHR bank granularity (8 KiB).
pub const CHR_BANK_SIZE: usize = 0x2000;
/// Battery-backed RAM window size at $6000-$7FFF.
pub const SRAM_SIZE: usize = 0x2000;

/// Parsed iNES/NES 2.0 header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InesHeader {
    /// PRG-ROM size in bytes.
    pub prg_rom_size: usize,
    /// CHR-ROM size in bytes; 0 means the cartridge carries CHR-RAM.
    pub chr_rom_size: usize,
    /// Mapper number (0-255 iNES, 0-4095 NES 2.0).
    pub mapper: u16,
    /// Submapper number (NES 2.0 only; 0 otherwise).
    pub submapper: u8,
    /// Nametable arrangement from flags 6.
    pub mirroring: Mirroring,
    /// Battery-backed SRAM present.
    pub battery: bool,
    /// 512-byte trainer precedes PRG data.
    pub trainer: bool,
    /// True when the header is NES 2.0.
    pub nes2: bool,
    /// PRG-RAM size in bytes (8 KiB when the iNES field is zero).
    pub prg_ram_size: usize,
}

impl InesHeader {
    const MAGIC: [u8; 4] = [0x4E, 0x45, 0x53, 0x1A];

    /// Parse the 16-byte header at the start of `data`.
    pub fn parse(data: &[u8]) -> Result<Self, RomError> {
        if data.len() < 16 {
            return Err(RomError::FileTooSmall(data.len()));
        }

        let magic = [data[0], data[1], data[2], data[3]];
        if magic != Self::MAGIC {
            return Err(RomError::InvalidMagic(magic));
        }

        let nes2 = data[7] & 0x0C == 0x08;

        let (mapper, submapper) = if nes2 {
            let low = (data[6] & 0xF0) >> 4;
            let mid = data[7] & 0xF0;
            let high = data[8] & 0x0F;
            (u16::from(high) << 8 | u16::from(mid | low), (data[8] & 0xF0) >> 4)
        } else {
            let low = (data[6] & 0xF0) >> 4;
            let high = data[7] & 0xF0;
            (u16::from(high | low), 0)
        };

        let (prg_rom_size, chr_rom_size) = if nes2 {
            (
                nes2_rom_size(data[4], data[9] & 0x0F, PRG_BANK_SIZE),
                nes2_rom_size(data[5], (data[9] & 0xF0) >> 4, CHR_BANK_SIZE),
            )
        } else {
            (
                data[4] as usize * PRG_BANK_SIZE,
                data[5] as usize * CHR_BANK_SIZE,
            )
        };

        if prg_rom_size == 0 {
            return Err(RomError::EmptyPrgRom);
        }

        let mirroring = if data[6] & 0x08 != 0 {
            Mirroring::FourScreen
        } else if data[6] & 0x01 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let prg_ram_size = if nes2 {
            let shift = data[10] & 0x0F;
            if shift == 0 { 0 } else { 64 << shift }
        } else if data[8] == 0 {
            SRAM_SIZE
        } else {
            data[8] as usize * SRAM_SIZE
        };

        Ok(Self {
            prg_rom_size,
            chr_rom_size,
            mapper,
            submapper,
            mirroring,
            battery: data[6] & 0x02 != 0,
            trainer: data[6] & 0x04 != 0,
            nes2,
            prg_ram_size,
        })
    }
}

/// NES 2.0 ROM size: plain MSB extension, or exponent-multiplier form when
/// the MSB nibble is $F.
fn nes2_rom_size(lsb: u8, msb: u8, unit: usize) -> usize {
    if msb == 0x0F {
        let exponent = (lsb & 0xFC) >> 2;
        let multiplier = (lsb & 0x03) as usize * 2 + 1;
        multiplier << exponent
    } else {
        ((msb as usize) << 8 | lsb as usize) * unit
    }
}

/// A loaded cartridge.
///
/// Owns the PRG-ROM, the CHR data (ROM, or 8 KiB of RAM when the container
/// ships none), and the 8 KiB SRAM window. After loading, the SRAM region
/// and CHR-RAM are the only mutable storage; everything else is fixed and
/// bank-switched by the mapper.
#[derive(Debug, Clone)]
pub struct Cartridge {
    header: InesHeader,
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    chr_writable: bool,
    sram: Vec<u8>,
    hash: [u8; 16],
    name: String,
}

impl Cartridge {
    /// Load a cartridge from the raw contents of a `.nes` file.
    pub fn from_ines(data: &[u8]) -> Result<Self, RomError> {
        let header = InesHeader::parse(data)?;

        let mut offset = 16;
        if header.trainer {
            // Trainers are legacy dumps; skip the 512 bytes.
            offset += 512;
        }

        if data.len() < offset + header.prg_rom_size + header.chr_rom_size {
            return Err(RomError::SizeMismatch {
                expected: offset + header.prg_rom_size + header.chr_rom_size,
                actual: data.len(),
            });
        }

        let prg_rom = data[offset..offset + header.prg_rom_size].to_vec();
        offset += header.prg_rom_size;

        let chr_writable = header.chr_rom_size == 0;
        let chr = if chr_writable {
            vec![0; CHR_BANK_SIZE]
        } else {
            data[offset..offset + header.chr_rom_size].to_vec()
        };

        let hash: [u8; 16] = md5::compute(data).0;
        let name = format!("{:02x}{:02x}{:02x}{:02x}", hash[0], hash[1], hash[2], hash[3]);

        Ok(Self {
            header,
            prg_rom,
            chr,
            chr_writable,
            sram: vec![0; SRAM_SIZE],
            hash,
            name,
        })
    }

    /// Parsed header.
    #[must_use]
    pub fn header(&self) -> &InesHeader {
        &self.header
    }

    /// Mapper number from the container.
    #[must_use]
    pub fn mapper_id(&self) -> u16 {
        self.header.mapper
    }

    /// Submapper number. Stored for diagnostics; cartridges run as their
    /// base mapper.
    #[must_use]
    pub fn submapper(&self) -> u8 {
        self.header.submapper
    }

    /// Nametable mirroring from the container.
    #[must_use]
    pub fn mirroring(&self) -> Mirroring {
        self.header.mirroring
    }

    /// True when SRAM is battery backed and worth persisting.
    #[must_use]
    pub fn has_battery(&self) -> bool {
        self.header.battery
    }

    /// md5 digest of the container bytes; the key for save lookups and the
    /// external title database.
    #[must_use]
    pub fn hash(&self) -> &[u8; 16] {
        &self.hash
    }

    /// Display name. Defaults to a hash prefix until the host supplies one.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Set the display name (typically from the title database or the file
    /// stem).
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// PRG-ROM bytes.
    #[must_use]
    pub fn prg_rom(&self) -> &[u8] {
        &self.prg_rom
    }

    /// Number of 16 KiB PRG banks.
    #[must_use]
    pub fn prg_banks(&self) -> usize {
        self.prg_rom.len() / PRG_BANK_SIZE
    }

    /// CHR bytes (ROM or RAM).
    #[must_use]
    pub fn chr(&self) -> &[u8] {
        &self.chr
    }

    /// True when CHR is RAM and writable.
    #[must_use]
    pub fn chr_writable(&self) -> bool {
        self.chr_writable
    }

    /// Write a CHR byte. Ignored for CHR-ROM.
    pub fn write_chr(&mut self, addr: usize, value: u8) {
        if self.chr_writable {
            let len = self.chr.len();
            self.chr[addr % len] = value;
        }
    }

    /// SRAM window contents.
    #[must_use]
    pub fn sram(&self) -> &[u8] {
        &self.sram
    }

    /// Read a byte from SRAM ($6000-$7FFF offset).
    #[must_use]
    pub fn read_sram(&self, offset: usize) -> u8 {
        self.sram[offset % SRAM_SIZE]
    }

    /// Write a byte to SRAM.
    pub fn write_sram(&mut self, offset: usize, value: u8) {
        self.sram[offset % SRAM_SIZE] = value;
    }

    /// Replace SRAM contents, e.g. from persisted battery data. Oversized
    /// input is truncated; undersized input leaves the tail untouched.
    pub fn load_sram(&mut self, data: &[u8]) {
        let len = data.len().min(SRAM_SIZE);
        self.sram[..len].copy_from_slice(&data[..len]);
    }

    /// Replace CHR-RAM contents (save-state restore). Ignored for CHR-ROM.
    pub fn load_chr_ram(&mut self, data: &[u8]) {
        if self.chr_writable && data.len() == self.chr.len() {
            self.chr.copy_from_slice(data);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Assemble a minimal iNES image for mapper tests.
    pub(crate) fn build_ines(
        prg_banks: u8,
        chr_banks: u8,
        mapper: u8,
        flags6_low: u8,
    ) -> Vec<u8> {
        let mut data = vec![0x4E, 0x45, 0x53, 0x1A];
        data.push(prg_banks);
        data.push(chr_banks);
        data.push((mapper & 0x0F) << 4 | flags6_low);
        data.push(mapper & 0xF0);
        data.extend_from_slice(&[0; 8]);
        for bank in 0..prg_banks as usize {
            data.extend(std::iter::repeat(bank as u8).take(PRG_BANK_SIZE));
        }
        for bank in 0..chr_banks as usize {
            data.extend(std::iter::repeat(0x80 | bank as u8).take(CHR_BANK_SIZE));
        }
        data
    }

    #[test]
    fn parses_basic_ines_header() {
        let data = build_ines(2, 1, 0, 0x01);
        let cart = Cartridge::from_ines(&data).unwrap();
        assert_eq!(cart.mapper_id(), 0);
        assert_eq!(cart.prg_rom().len(), 2 * PRG_BANK_SIZE);
        assert_eq!(cart.chr().len(), CHR_BANK_SIZE);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
        assert!(!cart.has_battery());
        assert!(!cart.chr_writable());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = build_ines(1, 1, 0, 0);
        data[0] = 0x00;
        assert!(matches!(
            Cartridge::from_ines(&data),
            Err(RomError::InvalidMagic(_))
        ));
    }

    #[test]
    fn rejects_short_file() {
        assert!(matches!(
            Cartridge::from_ines(&[0x4E, 0x45, 0x53]),
            Err(RomError::FileTooSmall(3))
        ));
    }

    #[test]
    fn rejects_truncated_prg() {
        let mut data = build_ines(2, 0, 0, 0);
        data.truncate(16 + PRG_BANK_SIZE);
        assert!(matches!(
            Cartridge::from_ines(&data),
            Err(RomError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn chr_ram_when_no_chr_rom() {
        let data = build_ines(1, 0, 0, 0);
        let mut cart = Cartridge::from_ines(&data).unwrap();
        assert!(cart.chr_writable());
        assert_eq!(cart.chr().len(), CHR_BANK_SIZE);

        cart.write_chr(0x100, 0xAB);
        assert_eq!(cart.chr()[0x100], 0xAB);
    }

    #[test]
    fn battery_and_four_screen_flags() {
        let data = build_ines(1, 1, 0, 0x02);
        let cart = Cartridge::from_ines(&data).unwrap();
        assert!(cart.has_battery());

        let data = build_ines(1, 1, 0, 0x08);
        let cart = Cartridge::from_ines(&data).unwrap();
        assert_eq!(cart.mirroring(), Mirroring::FourScreen);
    }

    #[test]
    fn mapper_number_spans_both_nibbles() {
        let data = build_ines(1, 1, 0x42, 0);
        let cart = Cartridge::from_ines(&data).unwrap();
        assert_eq!(cart.mapper_id(), 0x42);
    }

    #[test]
    fn nes2_exponent_sizes() {
        // 1 << 10 = 1 KiB PRG... exponent form is exercised directly.
        assert_eq!(nes2_rom_size(0b0000_1000 << 2, 0x0F, PRG_BANK_SIZE), 256);
        assert_eq!(nes2_rom_size(0x02, 0x01, PRG_BANK_SIZE), 0x102 * PRG_BANK_SIZE);
    }

    #[test]
    fn hash_is_stable_and_16_bytes() {
        let data = build_ines(1, 1, 0, 0);
        let a = Cartridge::from_ines(&data).unwrap();
        let b = Cartridge::from_ines(&data).unwrap();
        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.hash().len(), 16);
    }

    #[test]
    fn sram_round_trip() {
        let data = build_ines(1, 1, 0, 0);
        let mut cart = Cartridge::from_ines(&data).unwrap();
        cart.write_sram(0x123, 0x42);
        assert_eq!(cart.read_sram(0x123), 0x42);

        let saved = cart.sram().to_vec();
        let mut other = Cartridge::from_ines(&data).unwrap();
        other.load_sram(&saved);
        assert_eq!(other.read_sram(0x123), 0x42);
    }

    proptest::proptest! {
        /// SRAM writes round-trip at any offset, including mirrors past
        /// the 8 KiB window.
        #[test]
        fn sram_offset_round_trip(offset in 0usize..0x4000, value: u8) {
            let data = build_ines(1, 1, 0, 0);
            let mut cart = Cartridge::from_ines(&data).unwrap();
            cart.write_sram(offset, value);
            proptest::prop_assert_eq!(cart.read_sram(offset), value);
            proptest::prop_assert_eq!(cart.read_sram(offset % SRAM_SIZE), value);
        }
    }
}
