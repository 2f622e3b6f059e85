//! The PPU's view of pattern tables and nametables, routed through the
//! cartridge mapper and internal VRAM (CIRAM).

use nes_mappers::Mapper;
use nes_ppu::PpuBus;

/// Adapts a mapper and 2 KiB of CIRAM to [`PpuBus`], applying the
/// cartridge's nametable mirroring and clocking the mapper's scanline IRQ
/// counter on pattern-table address bit 12 rising edges (the MMC3 A12
/// hook; a no-op for mappers that don't override `scanline_tick`).
pub struct PpuMemory<'a> {
    mapper: &'a mut dyn Mapper,
    ciram: &'a mut [u8; 0x0800],
    last_a12: &'a mut bool,
}

impl<'a> PpuMemory<'a> {
    /// Borrow a mapper, CIRAM, and the system's persistent A12 latch for the
    /// duration of one PPU step. `last_a12` must outlive individual `step`
    /// calls — the edge detector it backs needs to see every pattern-table
    /// read across the whole run, not just the reads from one dot.
    pub fn new(mapper: &'a mut dyn Mapper, ciram: &'a mut [u8; 0x0800], last_a12: &'a mut bool) -> Self {
        Self { mapper, ciram, last_a12 }
    }

    fn track_a12(&mut self, addr: u16) {
        let a12 = addr & 0x1000 != 0;
        if a12 && !*self.last_a12 {
            self.mapper.scanline_tick();
        }
        *self.last_a12 = a12;
    }

    fn ciram_index(&self, addr: u16) -> usize {
        self.mapper.mirror_mode().physical_address(addr) as usize
    }
}

impl PpuBus for PpuMemory<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        match addr {
            0x0000..=0x1FFF => {
                self.track_a12(addr);
                self.mapper.ppu_read(addr)
            }
            0x2000..=0x3EFF => self.ciram[self.ciram_index(addr)],
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, value: u8) {
        match addr {
            0x0000..=0x1FFF => {
                self.track_a12(addr);
                self.mapper.ppu_write(addr, value);
            }
            0x2000..=0x3EFF => {
                let index = self.ciram_index(addr);
                self.ciram[index] = value;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nes_mappers::{Cartridge, Mirroring, Nrom};

    fn test_mapper() -> Nrom {
        let cart = Cartridge::with_chr_ram(vec![0; 0x4000], 0, Mirroring::Vertical, false);
        Nrom::new(&cart)
    }

    #[test]
    fn nametable_writes_respect_mirroring() {
        let mut mapper = test_mapper();
        let mut ciram = [0u8; 0x0800];
        let mut last_a12 = false;
        let mut mem = PpuMemory::new(&mut mapper, &mut ciram, &mut last_a12);
        mem.write(0x2000, 0x42);
        assert_eq!(mem.read(0x2800), 0x42); // vertical: $2000/$2800 share
    }

    #[test]
    fn chr_ram_round_trips_through_the_mapper() {
        let mut mapper = test_mapper();
        let mut ciram = [0u8; 0x0800];
        let mut last_a12 = false;
        let mut mem = PpuMemory::new(&mut mapper, &mut ciram, &mut last_a12);
        mem.write(0x0010, 0x99);
        assert_eq!(mem.read(0x0010), 0x99);
    }

    #[test]
    fn a12_rising_edge_clocks_the_mapper() {
        // NROM ignores scanline_tick, but the call must not panic and
        // must only fire on a 0->1 transition.
        let mut mapper = test_mapper();
        let mut ciram = [0u8; 0x0800];
        let mut last_a12 = false;
        let mut mem = PpuMemory::new(&mut mapper, &mut ciram, &mut last_a12);
        mem.read(0x0000); // a12 low
        mem.read(0x1000); // a12 rises
        mem.read(0x1001); // a12 still high, no second edge
        mem.read(0x0000); // a12 falls
        mem.read(0x1000); // a12 rises again
    }

    #[test]
    fn a12_latch_persists_across_separate_instances_sharing_the_same_cell() {
        // Regression: the A12 latch must survive across per-dot `PpuMemory`
        // construction, since `System::step` builds a fresh one every dot.
        let mut mapper = test_mapper();
        let mut ciram = [0u8; 0x0800];
        let mut last_a12 = false;
        {
            let mut mem = PpuMemory::new(&mut mapper, &mut ciram, &mut last_a12);
            mem.read(0x1000); // a12 rises, latch persists as `true`
        }
        assert!(last_a12);
        {
            let mut mem = PpuMemory::new(&mut mapper, &mut ciram, &mut last_a12);
            mem.read(0x1001); // still high, must not look like a fresh edge
            assert!(last_a12);
        }
    }
}
