//! Wires the CPU, PPU, APU stub, cartridge mapper, and controllers together
//! behind a single `nes_cpu::Bus` implementation.

use nes_apu::Apu;
use nes_cpu::{Bus, Cpu};
use nes_mappers::Mapper;
use nes_ppu::Ppu;

use crate::controller::Controller;
use crate::ppu_memory::PpuMemory;

/// OAM DMA's baseline stall; the odd-cycle 514th-cycle case is not
/// distinguished.
const OAM_DMA_STALL_CYCLES: u32 = 513;

/// The complete addressable system: CPU, PPU, APU stub, mapper, and two
/// controller ports.
pub struct System {
    /// 6502 interpreter.
    pub cpu: Cpu,
    /// Picture processing unit.
    pub ppu: Ppu,
    /// Register-accepting APU stub.
    pub apu: Apu,
    /// Cartridge mapper, owning PRG/CHR banking and IRQ state.
    pub mapper: Box<dyn Mapper>,
    /// Controller port 1.
    pub controller1: Controller,
    /// Controller port 2.
    pub controller2: Controller,

    ram: [u8; 0x0800],
    ciram: [u8; 0x0800],
    open_bus: u8,
    /// Persistent PPU-address-bit-12 latch for MMC3's scanline IRQ clock.
    /// Lives here (not inside a per-call `PpuMemory`) because it must
    /// observe every pattern-table read across the whole run, not just
    /// the reads made during one `step`.
    ppu_a12: bool,
}

impl System {
    /// Construct a system around an already-built mapper. Call
    /// [`System::reset`] before driving it to load the reset vector.
    pub fn new(mapper: Box<dyn Mapper>) -> Self {
        Self {
            cpu: Cpu::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            mapper,
            controller1: Controller::new(),
            controller2: Controller::new(),
            ram: [0; 0x0800],
            ciram: [0; 0x0800],
            open_bus: 0,
            ppu_a12: false,
        }
    }

    /// Reset every component and load the CPU's PC from the reset vector.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.ciram.fill(0);
        self.ppu.reset();
        self.apu.reset();
        self.controller1.reset();
        self.controller2.reset();
        self.open_bus = 0;
        self.ppu_a12 = false;
        let mut cpu = std::mem::take(&mut self.cpu);
        cpu.reset(self);
        self.cpu = cpu;
        log::debug!("system reset, pc={:#06x}", self.cpu.pc());
    }

    /// Drive one CPU event (see [`Cpu::step`]), then the PPU for three
    /// dots per CPU cycle consumed, forwarding NMI and mapper-IRQ requests.
    /// Returns the number of CPU cycles consumed.
    pub fn step(&mut self) -> u32 {
        let mut cpu = std::mem::take(&mut self.cpu);
        let cycles = cpu.step(self);

        for _ in 0..cycles {
            for _ in 0..3 {
                let mut mem = PpuMemory::new(&mut *self.mapper, &mut self.ciram, &mut self.ppu_a12);
                self.ppu.step(&mut mem);
            }
            if self.ppu.take_nmi_pending() {
                cpu.trigger_nmi();
            }
            if self.mapper.irq_pending() {
                cpu.trigger_irq();
            } else {
                cpu.clear_irq();
            }
        }

        self.cpu = cpu;
        cycles
    }

    /// Run [`System::step`] until a frame-complete rising edge is observed.
    pub fn step_frame(&mut self) {
        let mut was_complete = self.ppu.frame_complete();
        loop {
            self.step();
            let is_complete = self.ppu.frame_complete();
            if is_complete && !was_complete {
                return;
            }
            was_complete = is_complete;
        }
    }

    fn oam_dma(&mut self, page: u8) {
        let base = u16::from(page) << 8;
        let mut bytes = [0u8; 256];
        for (i, slot) in bytes.iter_mut().enumerate() {
            *slot = Bus::read(self, base.wrapping_add(i as u16));
        }
        self.ppu.oam_dma_write(&bytes);
        self.cpu.stall_cycles(OAM_DMA_STALL_CYCLES);
    }
}

impl Bus for System {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize],
            0x2000..=0x3FFF => {
                let reg = 0x2000 + (addr & 0x07);
                let mut mem = PpuMemory::new(&mut *self.mapper, &mut self.ciram, &mut self.ppu_a12);
                self.ppu.read_register(reg, &mut mem)
            }
            0x4015 => self.apu.read_status(),
            0x4016 => self.controller1.read() | (self.open_bus & 0xE0),
            0x4017 => self.controller2.read() | (self.open_bus & 0xE0),
            0x4000..=0x4013 | 0x4014 | 0x4018..=0x401F => self.open_bus,
            0x4020..=0xFFFF => self.mapper.cpu_read(addr),
        };
        self.open_bus = value;
        value
    }

    fn write(&mut self, addr: u16, value: u8) {
        self.open_bus = value;
        match addr {
            0x0000..=0x1FFF => self.ram[(addr & 0x07FF) as usize] = value,
            0x2000..=0x3FFF => {
                let reg = 0x2000 + (addr & 0x07);
                let mut mem = PpuMemory::new(&mut *self.mapper, &mut self.ciram, &mut self.ppu_a12);
                self.ppu.write_register(reg, value, &mut mem);
            }
            0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write(addr, value),
            0x4014 => self.oam_dma(value),
            0x4016 => {
                self.controller1.write(value);
                self.controller2.write(value);
            }
            0x4018..=0x401F => {}
            0x4020..=0xFFFF => self.mapper.cpu_write(addr, value),
        }
    }
}
