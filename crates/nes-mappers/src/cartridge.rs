//! The cartridge descriptor supplied by an external ROM loader.

use crate::mapper::Mirroring;

/// Errors that can occur while constructing a mapper from a [`Cartridge`].
///
/// Cartridge construction itself never fails — it is a plain data record —
/// only [`crate::create_mapper`] validates the mapper number.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartridgeError {
    /// The mapper number is not one of the supported values (0, 1, 4).
    #[error("unsupported mapper number {0}")]
    UnsupportedMapper(u16),
}

/// An already-parsed cartridge: PRG/CHR data plus the handful of header
/// facts the mapper layer needs. Parsing an on-disk ROM container (iNES,
/// NES 2.0, ...) into this shape is the driver's responsibility.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cartridge {
    /// Raw PRG-ROM bytes.
    pub prg_rom: Vec<u8>,
    /// Raw CHR-ROM bytes; empty when `chr_is_ram` is set.
    pub chr_rom: Vec<u8>,
    /// Whether CHR memory is RAM (8 KiB, allocated by the mapper) rather
    /// than ROM.
    pub chr_is_ram: bool,
    /// iNES mapper number.
    pub mapper_number: u16,
    /// Hardware nametable mirroring mode from the cartridge header.
    pub mirroring: Mirroring,
    /// Whether the cartridge has battery-backed PRG-RAM.
    pub has_battery: bool,
}

impl Cartridge {
    /// Build a descriptor for CHR-ROM cartridges.
    #[must_use]
    pub fn with_chr_rom(
        prg_rom: Vec<u8>,
        chr_rom: Vec<u8>,
        mapper_number: u16,
        mirroring: Mirroring,
        has_battery: bool,
    ) -> Self {
        Self {
            prg_rom,
            chr_rom,
            chr_is_ram: false,
            mapper_number,
            mirroring,
            has_battery,
        }
    }

    /// Build a descriptor for CHR-RAM cartridges (no CHR-ROM bytes).
    #[must_use]
    pub fn with_chr_ram(
        prg_rom: Vec<u8>,
        mapper_number: u16,
        mirroring: Mirroring,
        has_battery: bool,
    ) -> Self {
        Self {
            prg_rom,
            chr_rom: Vec::new(),
            chr_is_ram: true,
            mapper_number,
            mirroring,
            has_battery,
        }
    }
}
