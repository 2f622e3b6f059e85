//! Cartridge mapper implementations for an NES-compatible emulator core.
//!
//! | Number | Name  | Notes                              |
//! |-------:|-------|-------------------------------------|
//! |      0 | NROM  | No banking.                         |
//! |      1 | MMC1  | Serial-shift bank registers.        |
//! |      4 | MMC3  | Scanline-counted IRQ, fine banking. |
//!
//! Parsing an on-disk ROM container (iNES, NES 2.0, ...) into a
//! [`Cartridge`] is outside this crate; callers hand in already-decoded
//! PRG/CHR bytes and header facts.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cartridge;
mod mapper;
mod mmc1;
mod mmc3;
mod nrom;

pub use cartridge::{Cartridge, CartridgeError};
pub use mapper::{Mapper, Mirroring};
pub use mmc1::Mmc1;
pub use mmc3::Mmc3;
pub use nrom::Nrom;

/// Construct the appropriate [`Mapper`] for a cartridge's mapper number.
///
/// # Errors
///
/// Returns [`CartridgeError::UnsupportedMapper`] for any mapper number
/// other than 0 (NROM), 1 (MMC1), or 4 (MMC3).
pub fn create_mapper(cartridge: &Cartridge) -> Result<Box<dyn Mapper>, CartridgeError> {
    match cartridge.mapper_number {
        0 => Ok(Box::new(Nrom::new(cartridge))),
        1 => Ok(Box::new(Mmc1::new(cartridge))),
        4 => Ok(Box::new(Mmc3::new(cartridge))),
        other => {
            log::warn!("rejected unsupported mapper number {other}");
            Err(CartridgeError::UnsupportedMapper(other))
        }
    }
}
