//! The PPU's view of its own address space, supplied by the driver.

/// Covers `$0000..=$3FFF` of PPU address space: pattern tables (delegated
/// to the mapper) and nametables (delegated to CIRAM through whatever
/// mirroring the cartridge selects). Palette RAM is handled internally by
/// [`crate::Ppu`] and never reaches this trait.
pub trait PpuBus {
    /// Read a byte of pattern-table or nametable data.
    fn read(&mut self, addr: u16) -> u8;
    /// Write a byte of pattern-table or nametable data.
    fn write(&mut self, addr: u16, value: u8);
}
