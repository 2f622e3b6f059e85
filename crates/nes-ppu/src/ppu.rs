//! The Ricoh 2C02 PPU: register file, scanline/dot state machine, and
//! 256x240 frame buffer.

use crate::background::Background;
use crate::bus::PpuBus;
use crate::oam::Oam;
use crate::palette::Palette;
use crate::registers::{Ctrl, Mask, Status};
use crate::scroll::Scroll;
use crate::sprite::SpriteUnit;
use crate::timing::Timing;

/// Frame buffer width in pixels.
pub const FRAME_WIDTH: usize = 256;
/// Frame buffer height in pixels.
pub const FRAME_HEIGHT: usize = 240;
/// Frame buffer size in pixels (palette indices, not RGB).
pub const FRAME_SIZE: usize = FRAME_WIDTH * FRAME_HEIGHT;

/// The PPU.
///
/// Owns every piece of PPU-internal state (registers, OAM, palette RAM,
/// scroll latches, the fetch pipeline) and exposes the CPU-visible register
/// interface plus a single-dot `step`. Pattern tables and nametables are
/// read through the driver-supplied [`PpuBus`]; palette RAM lives here.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ppu {
    ctrl: Ctrl,
    mask: Mask,
    status: Status,
    scroll: Scroll,
    oam: Oam,
    palette: Palette,
    background: Background,
    sprites: SpriteUnit,
    timing: Timing,

    frame_buffer: Vec<u8>,
    vram_read_buffer: u8,
    io_latch: u8,
    frame_complete: bool,
    nmi_pending: bool,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    /// Power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ctrl: Ctrl::empty(),
            mask: Mask::empty(),
            status: Status::empty(),
            scroll: Scroll::new(),
            oam: Oam::new(),
            palette: Palette::new(),
            background: Background::new(),
            sprites: SpriteUnit::new(),
            timing: Timing::new(),
            frame_buffer: vec![0; FRAME_SIZE],
            vram_read_buffer: 0,
            io_latch: 0,
            frame_complete: false,
            nmi_pending: false,
        }
    }

    /// The rendered frame, as palette indices (0-63), row-major.
    #[must_use]
    pub fn frame_buffer(&self) -> &[u8] {
        &self.frame_buffer
    }

    /// Whether a frame just completed (set at VBlank start, cleared at the
    /// start of the next frame). The driver should observe the rising edge.
    #[must_use]
    pub const fn frame_complete(&self) -> bool {
        self.frame_complete
    }

    /// Peek the NMI request without consuming it.
    #[must_use]
    pub const fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    /// Consume and clear the NMI request. The driver should call this once
    /// per poll and forward a `true` result into `cpu.trigger_nmi()` — the
    /// PPU only asserts this for the single dot it was raised on.
    pub fn take_nmi_pending(&mut self) -> bool {
        let pending = self.nmi_pending;
        self.nmi_pending = false;
        pending
    }

    /// Current scanline (0-261).
    #[must_use]
    pub const fn scanline(&self) -> u16 {
        self.timing.scanline()
    }

    /// Current dot within the scanline (0-340).
    #[must_use]
    pub const fn dot(&self) -> u16 {
        self.timing.dot()
    }

    /// Read a CPU-visible register. `addr` is normalised by the caller to
    /// `0x2000..=0x2007` (the bus mirrors every 8 bytes).
    pub fn read_register(&mut self, addr: u16, bus: &mut dyn PpuBus) -> u8 {
        match addr & 0x07 {
            0 | 1 | 3 | 5 | 6 => self.io_latch, // write-only registers read back the I/O latch
            2 => {
                let value = self.status.read_with_latch(self.io_latch);
                self.status.remove(Status::VBLANK);
                self.scroll.reset_latch();
                value
            }
            4 => self.oam.read(),
            7 => {
                let addr = self.scroll.vram_addr();
                let result = if addr >= 0x3F00 {
                    let data = self.palette.read(addr) & 0x3F;
                    // Reading palette RAM also refills the read buffer from
                    // the underlying nametable-mirror region.
                    self.vram_read_buffer = bus.read(addr - 0x1000);
                    data | (self.io_latch & 0xC0)
                } else {
                    let buffered = self.vram_read_buffer;
                    self.vram_read_buffer = bus.read(addr & 0x3FFF);
                    buffered
                };
                self.scroll.increment_vram(self.ctrl.vram_increment());
                result
            }
            _ => unreachable!(),
        }
    }

    /// Write a CPU-visible register.
    pub fn write_register(&mut self, addr: u16, value: u8, bus: &mut dyn PpuBus) {
        self.io_latch = value;
        match addr & 0x07 {
            0 => {
                let was_disabled = !self.ctrl.nmi_enabled();
                self.ctrl = Ctrl::from_bits_truncate(value);
                self.scroll.write_ctrl(value);
                if was_disabled && self.ctrl.nmi_enabled() && self.status.contains(Status::VBLANK) {
                    self.nmi_pending = true;
                }
            }
            1 => self.mask = Mask::from_bits_truncate(value),
            2 => {}
            3 => self.oam.set_addr(value),
            4 => self.oam.write(value),
            5 => self.scroll.write_scroll(value),
            6 => self.scroll.write_addr(value),
            7 => {
                let addr = self.scroll.vram_addr();
                if addr >= 0x3F00 {
                    self.palette.write(addr, value);
                } else {
                    bus.write(addr & 0x3FFF, value);
                }
                self.scroll.increment_vram(self.ctrl.vram_increment());
            }
            _ => unreachable!(),
        }
    }

    /// `$4014` OAM DMA: copy 256 bytes into OAM starting at the current
    /// OAMADDR, with 8-bit wrap.
    pub fn oam_dma_write(&mut self, bytes: &[u8; 256]) {
        self.oam.dma_write(bytes);
    }

    /// Advance the PPU by one dot.
    pub fn step(&mut self, bus: &mut dyn PpuBus) {
        let rendering_enabled = self.mask.rendering_enabled();
        let frame_wrapped = self.timing.tick(rendering_enabled);
        if frame_wrapped {
            self.frame_complete = false;
        }

        let scanline = self.timing.scanline();
        let dot = self.timing.dot();

        if scanline == 241 && dot == 1 {
            self.status.insert(Status::VBLANK);
            if self.ctrl.nmi_enabled() {
                self.nmi_pending = true;
            }
            self.frame_complete = true;
        }

        if scanline == 261 && dot == 1 {
            self.status
                .remove(Status::VBLANK | Status::SPRITE_ZERO_HIT | Status::SPRITE_OVERFLOW);
            self.nmi_pending = false;
        }

        if !(rendering_enabled && self.timing.is_rendering_scanline()) {
            return;
        }

        if dot >= 1 && dot <= 256 || dot >= 321 && dot <= 336 {
            self.background.shift_registers();
            self.run_background_fetch(dot, bus);
            if dot == 256 {
                self.scroll.increment_y();
            }
        }

        if dot == 257 {
            self.scroll.copy_horizontal();
            if self.timing.is_visible_scanline() {
                self.sprites
                    .evaluate(&self.oam, scanline + 1, self.ctrl.sprite_height());
                if self.sprites.overflow() {
                    self.status.insert(Status::SPRITE_OVERFLOW);
                }
            }
        }

        if self.timing.is_prerender_scanline() && dot >= 280 && dot <= 304 {
            self.scroll.copy_vertical();
        }

        if dot == 321 && self.timing.is_visible_scanline() {
            let table = self.ctrl.sprite_table_addr();
            let height = self.ctrl.sprite_height();
            self.sprites
                .fetch_patterns(scanline + 1, table, height, |addr| bus.read(addr));
        }

        if self.timing.is_visible_scanline() && dot >= 1 && dot <= 256 {
            let x = (dot - 1) as usize;
            self.render_pixel(x, scanline as usize);
        }
    }

    fn run_background_fetch(&mut self, dot: u16, bus: &mut dyn PpuBus) {
        match (dot - 1) % 8 {
            0 => {
                let addr = self.scroll.nametable_addr();
                let tile = bus.read(addr);
                self.background.set_nametable_byte(tile);
            }
            2 => {
                let addr = self.scroll.attribute_addr();
                let attr = bus.read(addr);
                self.background
                    .set_attribute_byte(attr, self.scroll.coarse_x(), self.scroll.coarse_y());
            }
            4 => {
                let base = self.ctrl.bg_table_addr();
                let tile = self.background.nametable_byte();
                let fine_y = self.scroll.fine_y();
                let addr = base + u16::from(tile) * 16 + u16::from(fine_y);
                self.background.set_pattern_low(bus.read(addr));
            }
            6 => {
                let base = self.ctrl.bg_table_addr();
                let tile = self.background.nametable_byte();
                let fine_y = self.scroll.fine_y();
                let addr = base + u16::from(tile) * 16 + u16::from(fine_y) + 8;
                self.background.set_pattern_high(bus.read(addr));
            }
            7 => {
                self.background.load_shift_registers();
                self.scroll.increment_x();
            }
            _ => {}
        }
    }

    fn render_pixel(&mut self, x: usize, y: usize) {
        let (bg_pixel, bg_palette) = if self.mask.bg_enabled() && (x >= 8 || self.mask.bg_left_enabled()) {
            self.background.get_pixel(self.scroll.fine_x())
        } else {
            (0, 0)
        };

        let sprite = if self.mask.sprites_enabled() && (x >= 8 || self.mask.sprites_left_enabled()) {
            self.sprites.get_pixel(x as u8)
        } else {
            None
        };
        let (sprite_pixel, sprite_palette, sprite_behind, sprite_is_zero) =
            sprite.unwrap_or((0, 0, false, false));

        if sprite_is_zero
            && bg_pixel != 0
            && sprite_pixel != 0
            && self.mask.bg_enabled()
            && self.mask.sprites_enabled()
            && x != 255
        {
            self.status.insert(Status::SPRITE_ZERO_HIT);
        }

        let (pixel, palette_select) = match (bg_pixel, sprite_pixel) {
            (0, 0) => (0, 0),
            (0, _) => (sprite_pixel, sprite_palette),
            (_, 0) => (bg_pixel, bg_palette),
            _ => {
                if sprite_behind {
                    (bg_pixel, bg_palette)
                } else {
                    (sprite_pixel, sprite_palette)
                }
            }
        };

        let color_index = if self.mask.rendering_enabled() {
            let palette_addr = (palette_select << 2) | pixel;
            self.palette.entry(palette_addr)
        } else {
            self.palette.entry(0)
        };
        self.frame_buffer[y * FRAME_WIDTH + x] = color_index;
    }

    /// Reset to power-on state.
    pub fn reset(&mut self) {
        self.ctrl = Ctrl::empty();
        self.mask = Mask::empty();
        self.status = Status::empty();
        self.scroll = Scroll::new();
        self.oam.reset();
        self.palette.reset();
        self.background.reset();
        self.sprites.reset();
        self.timing.reset();
        self.frame_buffer.fill(0);
        self.vram_read_buffer = 0;
        self.io_latch = 0;
        self.frame_complete = false;
        self.nmi_pending = false;
        log::debug!("ppu reset");
    }
}
