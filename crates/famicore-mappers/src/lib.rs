//! NES cartridge loading and mapper implementations.
//!
//! A [`Cartridge`] is parsed once from an iNES/NES 2.0 container and then
//! owned by a [`Mapper`], which translates CPU and PPU addresses to
//! cartridge storage and decodes bank-switch writes.
//!
//! # Supported mappers
//!
//! | Mapper | Name  | Banking |
//! |--------|-------|---------|
//! | 0      | NROM  | none |
//! | 1      | MMC1  | serial-loaded PRG/CHR modes |
//! | 2      | UxROM | 16 KiB PRG |
//! | 3      | CNROM | 8 KiB CHR |
//! | 4      | MMC3  | 8 KiB PRG / 1 KiB CHR + scanline IRQ |
//! | 7      | AxROM | 32 KiB PRG + single-screen select |

mod axrom;
mod cartridge;
mod cnrom;
mod mapper;
mod mmc1;
mod mmc3;
mod nrom;
mod uxrom;

pub use axrom::Axrom;
pub use cartridge::{Cartridge, InesHeader, CHR_BANK_SIZE, PRG_BANK_SIZE, SRAM_SIZE};
pub use cnrom::Cnrom;
pub use mapper::{Mapper, MapperState, Mirroring};
pub use mmc1::Mmc1;
pub use mmc3::Mmc3;
pub use nrom::Nrom;
pub use uxrom::Uxrom;

/// Cartridge loading errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RomError {
    /// File shorter than the 16-byte header.
    #[error("ROM file too small: expected at least 16 bytes, got {0}")]
    FileTooSmall(usize),

    /// Header does not start with `NES\x1A`.
    #[error("invalid iNES magic number: expected [4E 45 53 1A], got {0:02X?}")]
    InvalidMagic([u8; 4]),

    /// Header declares zero PRG-ROM.
    #[error("PRG-ROM size cannot be 0")]
    EmptyPrgRom,

    /// File shorter than the sizes the header declares.
    #[error("ROM file size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        /// Bytes the header implies.
        expected: usize,
        /// Bytes actually present.
        actual: usize,
    },

    /// Mapper number outside the supported set.
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u16),
}

/// Wrap a cartridge in the mapper its header names.
///
/// The mapper takes ownership of the cartridge. Submappers are ignored;
/// cartridges run as their base mapper.
pub fn build_mapper(cart: Cartridge) -> Result<Box<dyn Mapper>, RomError> {
    if cart.submapper() != 0 {
        log::debug!(
            "ignoring submapper {} for mapper {}",
            cart.submapper(),
            cart.mapper_id()
        );
    }

    match cart.mapper_id() {
        0 => Ok(Box::new(Nrom::new(cart))),
        1 => Ok(Box::new(Mmc1::new(cart))),
        2 => Ok(Box::new(Uxrom::new(cart))),
        3 => Ok(Box::new(Cnrom::new(cart))),
        4 => Ok(Box::new(Mmc3::new(cart))),
        7 => Ok(Box::new(Axrom::new(cart))),
        n => Err(RomError::UnsupportedMapper(n)),
    }
}

/// Mapper numbers this crate implements.
#[must_use]
pub fn supported_mappers() -> &'static [u16] {
    &[0, 1, 2, 3, 4, 7]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::tests::build_ines;

    #[test]
    fn builds_each_supported_mapper() {
        for &mapper in supported_mappers() {
            let data = build_ines(2, 1, mapper as u8, 0);
            let cart = Cartridge::from_ines(&data).unwrap();
            let boxed = build_mapper(cart).unwrap();
            assert_eq!(boxed.cartridge().mapper_id(), mapper);
        }
    }

    #[test]
    fn rejects_unsupported_mapper() {
        let data = build_ines(1, 1, 66, 0);
        let cart = Cartridge::from_ines(&data).unwrap();
        assert!(matches!(
            build_mapper(cart),
            Err(RomError::UnsupportedMapper(66))
        ));
    }

    #[test]
    fn supported_list() {
        assert_eq!(supported_mappers(), &[0, 1, 2, 3, 4, 7]);
    }
}
