//! Mapper 4 — MMC3. Eight bank registers (R0-R7) selected by a bank-select
//! byte, plus a scanline IRQ counter clocked by the PPU's pattern-table
//! address bit 12 (A12) rising edge.

use crate::cartridge::Cartridge;
use crate::mapper::{Mapper, Mirroring};

const PRG_RAM_SIZE: usize = 0x2000;
const PRG_BANK_SIZE: usize = 0x2000; // 8 KiB
const CHR_1K: usize = 0x0400;

/// Mapper 4 implementation.
pub struct Mmc3 {
    prg_rom: Vec<u8>,
    prg_ram: [u8; PRG_RAM_SIZE],
    chr_rom: Vec<u8>,
    chr_ram: [u8; 0x2000],
    chr_is_ram: bool,

    bank_select: u8,
    banks: [u8; 8],
    mirroring: Mirroring,
    four_screen: bool,
    prg_ram_enabled: bool,

    irq_latch: u8,
    irq_counter: u8,
    irq_enabled: bool,
    irq_pending: bool,
    irq_reload: bool,
}

impl Mmc3 {
    /// Build an MMC3 mapper from a cartridge descriptor.
    #[must_use]
    pub fn new(cartridge: &Cartridge) -> Self {
        Self {
            prg_rom: cartridge.prg_rom.clone(),
            prg_ram: [0; PRG_RAM_SIZE],
            chr_rom: cartridge.chr_rom.clone(),
            chr_ram: [0; 0x2000],
            chr_is_ram: cartridge.chr_is_ram,
            bank_select: 0,
            banks: [0; 8],
            mirroring: cartridge.mirroring,
            four_screen: cartridge.mirroring == Mirroring::FourScreen,
            prg_ram_enabled: true,
            irq_latch: 0,
            irq_counter: 0,
            irq_enabled: false,
            irq_pending: false,
            irq_reload: false,
        }
    }

    fn prg_bank_count(&self) -> usize {
        (self.prg_rom.len() / PRG_BANK_SIZE).max(1)
    }

    fn prg_mode_fixes_8000(&self) -> bool {
        self.bank_select & 0x40 != 0
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let bank_count = self.prg_bank_count();
        let last = bank_count - 1;
        let second_last = bank_count.saturating_sub(2);
        let r6 = self.banks[6] as usize % bank_count;
        let r7 = self.banks[7] as usize % bank_count;

        let bank = match addr {
            0x8000..=0x9FFF => {
                if self.prg_mode_fixes_8000() {
                    second_last
                } else {
                    r6
                }
            }
            0xA000..=0xBFFF => r7,
            0xC000..=0xDFFF => {
                if self.prg_mode_fixes_8000() {
                    r6
                } else {
                    second_last
                }
            }
            _ => last,
        };
        let offset = addr as usize & (PRG_BANK_SIZE - 1);
        bank * PRG_BANK_SIZE + offset
    }

    fn chr_inverted(&self) -> bool {
        self.bank_select & 0x80 != 0
    }

    fn chr_bank_count(&self) -> usize {
        let len = if self.chr_is_ram { self.chr_ram.len() } else { self.chr_rom.len() };
        (len / CHR_1K).max(1)
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let bank_count = self.chr_bank_count();
        let region = (addr as usize) / CHR_1K; // 0..=7
        let region = if self.chr_inverted() { region ^ 4 } else { region };
        let register = match region {
            0 => self.banks[0] & !1,
            1 => self.banks[0] | 1,
            2 => self.banks[1] & !1,
            3 => self.banks[1] | 1,
            4 => self.banks[2],
            5 => self.banks[3],
            6 => self.banks[4],
            _ => self.banks[5],
        };
        let bank = register as usize % bank_count;
        let offset = addr as usize & (CHR_1K - 1);
        bank * CHR_1K + offset
    }

    fn write_bank_select(&mut self, value: u8) {
        self.bank_select = value;
    }

    fn write_bank_data(&mut self, value: u8) {
        let target = (self.bank_select & 0x07) as usize;
        self.banks[target] = value;
    }

    fn write_mirroring(&mut self, value: u8) {
        // A header that declared four-screen VRAM wires the nametables
        // directly; the mirroring register has no effect on such boards.
        if self.four_screen {
            return;
        }
        self.mirroring = if value & 0x01 != 0 { Mirroring::Horizontal } else { Mirroring::Vertical };
    }

    fn write_prg_ram_protect(&mut self, value: u8) {
        self.prg_ram_enabled = value & 0x80 != 0;
    }

    fn write_irq_latch(&mut self, value: u8) {
        self.irq_latch = value;
    }

    fn write_irq_reload(&mut self) {
        self.irq_counter = 0;
        self.irq_reload = true;
    }

    fn write_irq_disable(&mut self) {
        self.irq_enabled = false;
        self.irq_pending = false;
    }

    fn write_irq_enable(&mut self) {
        self.irq_enabled = true;
    }
}

impl Mapper for Mmc3 {
    fn cpu_read(&mut self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF if self.prg_ram_enabled => self.prg_ram[(addr - 0x6000) as usize],
            0x6000..=0x7FFF => 0,
            0x8000..=0xFFFF => {
                if self.prg_rom.is_empty() {
                    0
                } else {
                    self.prg_rom[self.prg_offset(addr)]
                }
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF if self.prg_ram_enabled => self.prg_ram[(addr - 0x6000) as usize] = value,
            0x6000..=0x7FFF => {} // disabled: writes ignored.
            0x8000..=0x9FFF if addr & 1 == 0 => self.write_bank_select(value),
            0x8000..=0x9FFF => self.write_bank_data(value),
            0xA000..=0xBFFF if addr & 1 == 0 => self.write_mirroring(value),
            0xA000..=0xBFFF => self.write_prg_ram_protect(value),
            0xC000..=0xDFFF if addr & 1 == 0 => self.write_irq_latch(value),
            0xC000..=0xDFFF => self.write_irq_reload(),
            0xE000..=0xFFFF if addr & 1 == 0 => self.write_irq_disable(),
            0xE000..=0xFFFF => self.write_irq_enable(),
            _ => {}
        }
    }

    fn ppu_read(&mut self, addr: u16) -> u8 {
        let addr = addr & 0x1FFF;
        if self.chr_is_ram {
            self.chr_ram[addr as usize]
        } else if self.chr_rom.is_empty() {
            0
        } else {
            self.chr_rom[self.chr_offset(addr)]
        }
    }

    fn ppu_write(&mut self, addr: u16, value: u8) {
        if self.chr_is_ram {
            self.chr_ram[(addr & 0x1FFF) as usize] = value;
        }
    }

    fn mirror_mode(&self) -> Mirroring {
        self.mirroring
    }

    fn scanline_tick(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
            log::trace!("mmc3 irq asserted");
        }
    }

    fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    fn mapper_number(&self) -> u16 {
        4
    }
}
