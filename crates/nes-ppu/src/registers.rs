//! PPUCTRL/PPUMASK/PPUSTATUS bit layouts.

use bitflags::bitflags;

bitflags! {
    /// `$2000` PPUCTRL (write-only).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Ctrl: u8 {
        /// Nametable select, low bit (copied into `t` bit 10).
        const NAMETABLE_LO = 0b0000_0001;
        /// Nametable select, high bit (copied into `t` bit 11).
        const NAMETABLE_HI = 0b0000_0010;
        /// VRAM address increment per PPUDATA access (0: +1, 1: +32).
        const VRAM_INCREMENT = 0b0000_0100;
        /// Sprite pattern table address for 8x8 sprites.
        const SPRITE_TABLE = 0b0000_1000;
        /// Background pattern table address.
        const BG_TABLE = 0b0001_0000;
        /// Sprite size (0: 8x8, 1: 8x16).
        const SPRITE_SIZE = 0b0010_0000;
        /// PPU master/slave select; unused on NES.
        const MASTER_SLAVE = 0b0100_0000;
        /// Generate an NMI at the start of VBlank.
        const NMI_ENABLE = 0b1000_0000;
    }
}

impl Ctrl {
    /// VRAM address increment (1 or 32).
    #[must_use]
    pub const fn vram_increment(self) -> u16 {
        if self.contains(Self::VRAM_INCREMENT) {
            32
        } else {
            1
        }
    }

    /// Sprite pattern table base address (8x8 mode only).
    #[must_use]
    pub const fn sprite_table_addr(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Background pattern table base address.
    #[must_use]
    pub const fn bg_table_addr(self) -> u16 {
        if self.contains(Self::BG_TABLE) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Sprite height in pixels (8 or 16).
    #[must_use]
    pub const fn sprite_height(self) -> u8 {
        if self.contains(Self::SPRITE_SIZE) {
            16
        } else {
            8
        }
    }

    /// Whether an NMI should be generated at VBlank.
    #[must_use]
    pub const fn nmi_enabled(self) -> bool {
        self.contains(Self::NMI_ENABLE)
    }
}

bitflags! {
    /// `$2001` PPUMASK (write-only).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Mask: u8 {
        /// Greyscale mode.
        const GREYSCALE = 0b0000_0001;
        /// Show background in the leftmost 8 pixels.
        const BG_LEFT = 0b0000_0010;
        /// Show sprites in the leftmost 8 pixels.
        const SPRITES_LEFT = 0b0000_0100;
        /// Show background.
        const BG_ENABLE = 0b0000_1000;
        /// Show sprites.
        const SPRITES_ENABLE = 0b0001_0000;
        /// Emphasize red (green on PAL).
        const EMPHASIZE_RED = 0b0010_0000;
        /// Emphasize green (red on PAL).
        const EMPHASIZE_GREEN = 0b0100_0000;
        /// Emphasize blue.
        const EMPHASIZE_BLUE = 0b1000_0000;
    }
}

impl Mask {
    /// Whether either background or sprite rendering is enabled.
    #[must_use]
    pub const fn rendering_enabled(self) -> bool {
        self.intersects(Self::BG_ENABLE.union(Self::SPRITES_ENABLE))
    }

    /// Whether background rendering is enabled.
    #[must_use]
    pub const fn bg_enabled(self) -> bool {
        self.contains(Self::BG_ENABLE)
    }

    /// Whether sprite rendering is enabled.
    #[must_use]
    pub const fn sprites_enabled(self) -> bool {
        self.contains(Self::SPRITES_ENABLE)
    }

    /// Whether the background is clipped in the leftmost 8 pixels.
    #[must_use]
    pub const fn bg_left_enabled(self) -> bool {
        self.contains(Self::BG_LEFT)
    }

    /// Whether sprites are clipped in the leftmost 8 pixels.
    #[must_use]
    pub const fn sprites_left_enabled(self) -> bool {
        self.contains(Self::SPRITES_LEFT)
    }
}

bitflags! {
    /// `$2002` PPUSTATUS (read-only).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Status: u8 {
        /// Sprite overflow (more than 8 sprites on a scanline).
        const SPRITE_OVERFLOW = 0b0010_0000;
        /// Sprite-0 hit.
        const SPRITE_ZERO_HIT = 0b0100_0000;
        /// Vertical blank flag.
        const VBLANK = 0b1000_0000;
    }
}

impl Status {
    /// Build the `$2002` read value, open-bus bits 0-4 filled from `latch`.
    #[must_use]
    pub const fn read_with_latch(self, latch: u8) -> u8 {
        (self.bits() & 0xE0) | (latch & 0x1F)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vram_increment_follows_bit_two() {
        assert_eq!(Ctrl::empty().vram_increment(), 1);
        assert_eq!(Ctrl::VRAM_INCREMENT.vram_increment(), 32);
    }

    #[test]
    fn sprite_height_follows_bit_five() {
        assert_eq!(Ctrl::empty().sprite_height(), 8);
        assert_eq!(Ctrl::SPRITE_SIZE.sprite_height(), 16);
    }

    #[test]
    fn pattern_table_addresses() {
        assert_eq!(Ctrl::empty().bg_table_addr(), 0x0000);
        assert_eq!(Ctrl::BG_TABLE.bg_table_addr(), 0x1000);
        assert_eq!(Ctrl::empty().sprite_table_addr(), 0x0000);
        assert_eq!(Ctrl::SPRITE_TABLE.sprite_table_addr(), 0x1000);
    }

    #[test]
    fn rendering_enabled_checks_either_layer() {
        assert!(!Mask::empty().rendering_enabled());
        assert!(Mask::BG_ENABLE.rendering_enabled());
        assert!(Mask::SPRITES_ENABLE.rendering_enabled());
    }

    #[test]
    fn status_read_mixes_in_open_bus_latch() {
        let status = Status::VBLANK | Status::SPRITE_ZERO_HIT;
        assert_eq!(status.read_with_latch(0x1F), 0xFF);
        assert_eq!(Status::empty().read_with_latch(0xFF), 0x1F);
    }
}
