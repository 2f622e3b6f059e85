//! A scanline/dot-accurate renderer for the NES's Ricoh 2C02 PPU.
//!
//! The PPU is decoupled from pattern-table and nametable storage through
//! the [`PpuBus`] trait — construct a [`Ppu`], drive it one dot at a time
//! with [`Ppu::step`], and dispatch CPU-visible register reads/writes
//! through [`Ppu::read_register`]/[`Ppu::write_register`].
//!
//! ```
//! use nes_ppu::{Ppu, PpuBus};
//!
//! struct FlatPpuBus([u8; 0x3000]);
//!
//! impl PpuBus for FlatPpuBus {
//!     fn read(&mut self, addr: u16) -> u8 {
//!         self.0[addr as usize]
//!     }
//!     fn write(&mut self, addr: u16, value: u8) {
//!         self.0[addr as usize] = value;
//!     }
//! }
//!
//! let mut bus = FlatPpuBus([0; 0x3000]);
//! let mut ppu = Ppu::new();
//! ppu.step(&mut bus);
//! assert_eq!(ppu.dot(), 1);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod background;
mod bus;
mod oam;
mod palette;
mod ppu;
mod registers;
mod scroll;
mod sprite;
mod timing;

pub use bus::PpuBus;
pub use oam::{Sprite, SpriteAttr, OAM_SIZE};
pub use palette::PALETTE_SIZE;
pub use ppu::{Ppu, FRAME_HEIGHT, FRAME_SIZE, FRAME_WIDTH};
pub use registers::{Ctrl, Mask, Status};
pub use sprite::MAX_SPRITES_PER_LINE;
pub use timing::Timing;

#[cfg(test)]
mod tests {
    use super::*;

    struct FlatPpuBus([u8; 0x3000]);

    impl PpuBus for FlatPpuBus {
        fn read(&mut self, addr: u16) -> u8 {
            self.0[addr as usize]
        }
        fn write(&mut self, addr: u16, value: u8) {
            self.0[addr as usize] = value;
        }
    }

    #[test]
    fn new_ppu_starts_at_scanline_zero_dot_zero() {
        let ppu = Ppu::new();
        assert_eq!(ppu.scanline(), 0);
        assert_eq!(ppu.dot(), 0);
        assert!(!ppu.frame_complete());
    }

    #[test]
    fn stepping_advances_the_dot_counter() {
        let mut ppu = Ppu::new();
        let mut bus = FlatPpuBus([0; 0x3000]);
        ppu.step(&mut bus);
        assert_eq!(ppu.dot(), 1);
    }
}
