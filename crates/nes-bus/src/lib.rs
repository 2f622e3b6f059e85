//! System wiring for an NES-compatible core: connects the CPU, PPU, APU
//! stub, cartridge mapper, and controller ports behind a single
//! [`nes_cpu::Bus`] implementation.
//!
//! ```
//! use nes_bus::System;
//! use nes_mappers::{Cartridge, Mirroring, Nrom};
//!
//! let mut prg = vec![0u8; 0x8000];
//! prg[0x7FFC] = 0x00;
//! prg[0x7FFD] = 0x80; // reset vector -> $8000
//! let cart = Cartridge::with_chr_ram(prg, 0, Mirroring::Horizontal, false);
//! let mut system = System::new(Box::new(Nrom::new(&cart)));
//!
//! system.reset();
//! assert_eq!(system.cpu.pc(), 0x8000);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod controller;
mod ppu_memory;
mod system;

pub use controller::{Button, Controller};
pub use system::System;
