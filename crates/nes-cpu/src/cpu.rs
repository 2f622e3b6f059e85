//! The 6502 fetch/decode/execute loop.

use crate::addressing::AddrMode;
use crate::opcodes::{Mnemonic, OpInfo, OPCODES};
use crate::status::Status;

/// Interrupt and reset vector addresses.
pub mod vectors {
    /// Non-maskable interrupt vector.
    pub const NMI: u16 = 0xFFFA;
    /// Reset vector.
    pub const RESET: u16 = 0xFFFC;
    /// Maskable interrupt (`BRK`/IRQ) vector.
    pub const IRQ: u16 = 0xFFFE;
}

/// Memory access the CPU needs to fetch, decode, and execute instructions.
///
/// Implemented by whatever owns the system bus; the CPU itself holds no
/// reference to it between calls, avoiding an ownership cycle (see the
/// "Cyclic reference CPU<->bus" design note).
pub trait Bus {
    /// Read one byte. Implementations may have side effects (PPU register
    /// reads, controller shifts) but must never panic for any address.
    fn read(&mut self, addr: u16) -> u8;
    /// Write one byte. Implementations may have side effects but must
    /// never panic for any address.
    fn write(&mut self, addr: u16, value: u8);
}

/// 6502 register file, cycle counter, and pending-interrupt latches.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cpu {
    a: u8,
    x: u8,
    y: u8,
    sp: u8,
    pc: u16,
    status: Status,
    cycles: u64,
    stall: u32,
    nmi_pending: bool,
    irq_pending: bool,
}

impl Default for Cpu {
    fn default() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: Status::new(),
            cycles: 0,
            stall: 0,
            nmi_pending: false,
            irq_pending: false,
        }
    }
}

impl Cpu {
    /// A freshly constructed CPU; call [`Cpu::reset`] before stepping it to
    /// load the real reset vector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-initialise registers to their documented post-reset state and
    /// load `PC` from the reset vector.
    pub fn reset(&mut self, bus: &mut dyn Bus) {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = 0xFD;
        self.status = Status::new();
        self.pc = Self::read_vector(bus, vectors::RESET);
        self.cycles = 7;
        self.stall = 0;
        self.nmi_pending = false;
        self.irq_pending = false;
        log::debug!("cpu reset, pc={:#06x}", self.pc);
    }

    /// Execute one event: a stalled cycle, a pending NMI, a pending IRQ, or
    /// one instruction. Returns the number of CPU cycles it consumed.
    pub fn step(&mut self, bus: &mut dyn Bus) -> u32 {
        if self.stall > 0 {
            self.stall -= 1;
            self.cycles += 1;
            return 1;
        }

        if self.nmi_pending {
            self.nmi_pending = false;
            self.service_interrupt(bus, vectors::NMI, false);
            self.cycles += 7;
            log::trace!("nmi serviced, pc={:#06x}", self.pc);
            return 7;
        }

        if self.irq_pending && !self.status.contains(Status::I) {
            self.service_interrupt(bus, vectors::IRQ, false);
            self.cycles += 7;
            log::trace!("irq serviced, pc={:#06x}", self.pc);
            return 7;
        }

        let opcode = self.fetch_byte(bus);
        let info = OPCODES[opcode as usize];
        let cycles = self.execute(bus, info);
        self.cycles += u64::from(cycles);
        cycles
    }

    /// Request an NMI; observed at the start of the next `step`.
    pub fn trigger_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Assert the IRQ line; observed at the next `step` while
    /// `InterruptDisable` is clear. Remains asserted until [`Cpu::clear_irq`]
    /// is called by whoever owns the interrupt source.
    pub fn trigger_irq(&mut self) {
        self.irq_pending = true;
    }

    /// Deassert the IRQ line.
    pub fn clear_irq(&mut self) {
        self.irq_pending = false;
    }

    /// Add `n` cycles of bus-stall (e.g. OAM DMA) to be consumed one at a
    /// time by subsequent `step` calls before any instruction executes.
    pub fn stall_cycles(&mut self, n: u32) {
        self.stall += n;
    }

    /// Accumulator.
    #[must_use]
    pub fn a(&self) -> u8 {
        self.a
    }

    /// X index register.
    #[must_use]
    pub fn x(&self) -> u8 {
        self.x
    }

    /// Y index register.
    #[must_use]
    pub fn y(&self) -> u8 {
        self.y
    }

    /// Stack pointer (offset into page 1).
    #[must_use]
    pub fn sp(&self) -> u8 {
        self.sp
    }

    /// Program counter.
    #[must_use]
    pub fn pc(&self) -> u16 {
        self.pc
    }

    /// Processor status flags.
    #[must_use]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Raw processor status byte, `U` always set.
    #[must_use]
    pub fn status_bits(&self) -> u8 {
        (self.status | Status::U).bits()
    }

    /// Total CPU cycles executed since construction (7 immediately after
    /// [`Cpu::reset`]).
    #[must_use]
    pub fn total_cycles(&self) -> u64 {
        self.cycles
    }

    /// Whether an IRQ is currently asserted (regardless of the interrupt
    /// disable flag).
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    // -- fetch/stack helpers -------------------------------------------

    fn fetch_byte(&mut self, bus: &mut dyn Bus) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn fetch_word(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = self.fetch_byte(bus);
        let hi = self.fetch_byte(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn push(&mut self, bus: &mut dyn Bus, value: u8) {
        bus.write(0x0100 + u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull(&mut self, bus: &mut dyn Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 + u16::from(self.sp))
    }

    fn push_word(&mut self, bus: &mut dyn Bus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    fn pull_word(&mut self, bus: &mut dyn Bus) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }

    fn read_vector(bus: &mut dyn Bus, addr: u16) -> u16 {
        let lo = bus.read(addr);
        let hi = bus.read(addr + 1);
        u16::from_le_bytes([lo, hi])
    }

    fn service_interrupt(&mut self, bus: &mut dyn Bus, vector: u16, brk: bool) {
        self.push_word(bus, self.pc);
        let p = self.status.to_stack_byte(brk);
        self.push(bus, p);
        self.status.insert(Status::I);
        self.pc = Self::read_vector(bus, vector);
    }

    // -- addressing ------------------------------------------------------

    /// Resolve an effective address for every mode except `Implied`,
    /// `Accumulator`, and `Relative`, which are handled by their own
    /// instruction bodies. Returns `(address, page_crossed)`.
    fn resolve_address(&mut self, bus: &mut dyn Bus, mode: AddrMode) -> (u16, bool) {
        match mode {
            AddrMode::Immediate => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                (addr, false)
            }
            AddrMode::ZeroPage => (u16::from(self.fetch_byte(bus)), false),
            AddrMode::ZeroPageX => {
                let base = self.fetch_byte(bus);
                (u16::from(base.wrapping_add(self.x)), false)
            }
            AddrMode::ZeroPageY => {
                let base = self.fetch_byte(bus);
                (u16::from(base.wrapping_add(self.y)), false)
            }
            AddrMode::Absolute => (self.fetch_word(bus), false),
            AddrMode::AbsoluteX => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.x));
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddrMode::AbsoluteY => {
                let base = self.fetch_word(bus);
                let addr = base.wrapping_add(u16::from(self.y));
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddrMode::Indirect => {
                // JMP (ind): the 6502 bug — if the pointer's low byte is
                // 0xFF, the high byte is fetched from the start of the
                // *same* page rather than the next one.
                let ptr = self.fetch_word(bus);
                let lo = bus.read(ptr);
                let hi_addr = (ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF);
                let hi = bus.read(hi_addr);
                (u16::from_le_bytes([lo, hi]), false)
            }
            AddrMode::IndexedIndirect => {
                let zp = self.fetch_byte(bus).wrapping_add(self.x);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                (u16::from_le_bytes([lo, hi]), false)
            }
            AddrMode::IndirectIndexed => {
                let zp = self.fetch_byte(bus);
                let lo = bus.read(u16::from(zp));
                let hi = bus.read(u16::from(zp.wrapping_add(1)));
                let base = u16::from_le_bytes([lo, hi]);
                let addr = base.wrapping_add(u16::from(self.y));
                (addr, (base & 0xFF00) != (addr & 0xFF00))
            }
            AddrMode::Implied | AddrMode::Accumulator | AddrMode::Relative => {
                unreachable!("{mode:?} is resolved by its own instruction body")
            }
        }
    }

    // -- execute -----------------------------------------------------------

    fn execute(&mut self, bus: &mut dyn Bus, info: OpInfo) -> u32 {
        use Mnemonic::{
            Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc, Cld, Cli,
            Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp, Jsr, Lda, Ldx, Ldy,
            Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta,
            Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
        };

        let extra = match info.mnemonic {
            Brk => {
                self.op_brk(bus);
                0
            }
            Jmp => {
                let (addr, _) = self.resolve_address(bus, info.mode);
                self.pc = addr;
                0
            }
            Jsr => {
                self.op_jsr(bus);
                0
            }
            Rts => {
                let addr = self.pull_word(bus);
                self.pc = addr.wrapping_add(1);
                0
            }
            Rti => {
                let p = self.pull(bus);
                self.status = Status::from_stack_byte(p);
                self.pc = self.pull_word(bus);
                0
            }
            Pha => {
                let a = self.a;
                self.push(bus, a);
                0
            }
            Pla => {
                self.a = self.pull(bus);
                let a = self.a;
                self.status.set_zn(a);
                0
            }
            Php => {
                let p = self.status.to_stack_byte(true);
                self.push(bus, p);
                0
            }
            Plp => {
                let p = self.pull(bus);
                self.status = Status::from_stack_byte(p);
                0
            }
            Clc => {
                self.status.remove(Status::C);
                0
            }
            Sec => {
                self.status.insert(Status::C);
                0
            }
            Cli => {
                self.status.remove(Status::I);
                0
            }
            Sei => {
                self.status.insert(Status::I);
                0
            }
            Cld => {
                self.status.remove(Status::D);
                0
            }
            Sed => {
                self.status.insert(Status::D);
                0
            }
            Clv => {
                self.status.remove(Status::V);
                0
            }
            Tax => {
                self.x = self.a;
                let x = self.x;
                self.status.set_zn(x);
                0
            }
            Tay => {
                self.y = self.a;
                let y = self.y;
                self.status.set_zn(y);
                0
            }
            Txa => {
                self.a = self.x;
                let a = self.a;
                self.status.set_zn(a);
                0
            }
            Tya => {
                self.a = self.y;
                let a = self.a;
                self.status.set_zn(a);
                0
            }
            Tsx => {
                self.x = self.sp;
                let x = self.x;
                self.status.set_zn(x);
                0
            }
            Txs => {
                self.sp = self.x;
                0
            }
            Inx => {
                self.x = self.x.wrapping_add(1);
                let x = self.x;
                self.status.set_zn(x);
                0
            }
            Iny => {
                self.y = self.y.wrapping_add(1);
                let y = self.y;
                self.status.set_zn(y);
                0
            }
            Dex => {
                self.x = self.x.wrapping_sub(1);
                let x = self.x;
                self.status.set_zn(x);
                0
            }
            Dey => {
                self.y = self.y.wrapping_sub(1);
                let y = self.y;
                self.status.set_zn(y);
                0
            }
            Nop => 0,
            Bcc | Bcs | Beq | Bne | Bmi | Bpl | Bvc | Bvs => self.op_branch(bus, info.mnemonic),
            Asl | Lsr | Rol | Ror => self.op_shift(bus, info),
            Lda | Ldx | Ldy | Sta | Stx | Sty | Adc | Sbc | And | Ora | Eor | Bit | Cmp | Cpx
            | Cpy | Inc | Dec => self.op_generic(bus, info),
        };

        u32::from(info.cycles) + extra
    }

    fn op_brk(&mut self, bus: &mut dyn Bus) {
        self.pc = self.pc.wrapping_add(1); // skip the padding byte
        self.push_word(bus, self.pc);
        let p = self.status.to_stack_byte(true);
        self.push(bus, p);
        self.status.insert(Status::I);
        self.pc = Self::read_vector(bus, vectors::IRQ);
    }

    fn op_jsr(&mut self, bus: &mut dyn Bus) {
        let (target, _) = self.resolve_address(bus, AddrMode::Absolute);
        let return_addr = self.pc.wrapping_sub(1);
        self.push_word(bus, return_addr);
        self.pc = target;
    }

    fn op_branch(&mut self, bus: &mut dyn Bus, mnemonic: Mnemonic) -> u32 {
        let offset = self.fetch_byte(bus) as i8;
        let taken = match mnemonic {
            Mnemonic::Bcc => !self.status.contains(Status::C),
            Mnemonic::Bcs => self.status.contains(Status::C),
            Mnemonic::Beq => self.status.contains(Status::Z),
            Mnemonic::Bne => !self.status.contains(Status::Z),
            Mnemonic::Bmi => self.status.contains(Status::N),
            Mnemonic::Bpl => !self.status.contains(Status::N),
            Mnemonic::Bvc => !self.status.contains(Status::V),
            Mnemonic::Bvs => self.status.contains(Status::V),
            _ => unreachable!("not a branch mnemonic"),
        };
        if !taken {
            return 0;
        }
        let base = self.pc;
        let target = base.wrapping_add(offset as i16 as u16);
        let mut extra = 1;
        if (base & 0xFF00) != (target & 0xFF00) {
            extra += 1;
        }
        self.pc = target;
        extra
    }

    fn op_shift(&mut self, bus: &mut dyn Bus, info: OpInfo) -> u32 {
        if info.mode == AddrMode::Accumulator {
            let value = self.a;
            self.a = self.shift_compute(info.mnemonic, value);
            0
        } else {
            let (addr, crossed) = self.resolve_address(bus, info.mode);
            let value = bus.read(addr);
            let result = self.shift_compute(info.mnemonic, value);
            bus.write(addr, result);
            u32::from(info.page_cross && crossed)
        }
    }

    fn shift_compute(&mut self, mnemonic: Mnemonic, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C));
        let (result, carry_out) = match mnemonic {
            Mnemonic::Asl => (value << 1, value & 0x80 != 0),
            Mnemonic::Lsr => (value >> 1, value & 0x01 != 0),
            Mnemonic::Rol => ((value << 1) | carry_in, value & 0x80 != 0),
            Mnemonic::Ror => ((value >> 1) | (carry_in << 7), value & 0x01 != 0),
            _ => unreachable!("not a shift/rotate mnemonic"),
        };
        self.status.set(Status::C, carry_out);
        self.status.set_zn(result);
        result
    }

    fn op_generic(&mut self, bus: &mut dyn Bus, info: OpInfo) -> u32 {
        let (addr, crossed) = self.resolve_address(bus, info.mode);
        match info.mnemonic {
            Mnemonic::Lda => {
                self.a = bus.read(addr);
                let a = self.a;
                self.status.set_zn(a);
            }
            Mnemonic::Ldx => {
                self.x = bus.read(addr);
                let x = self.x;
                self.status.set_zn(x);
            }
            Mnemonic::Ldy => {
                self.y = bus.read(addr);
                let y = self.y;
                self.status.set_zn(y);
            }
            Mnemonic::Sta => bus.write(addr, self.a),
            Mnemonic::Stx => bus.write(addr, self.x),
            Mnemonic::Sty => bus.write(addr, self.y),
            Mnemonic::Adc => {
                let m = bus.read(addr);
                self.adc(m);
            }
            Mnemonic::Sbc => {
                let m = bus.read(addr);
                self.adc(!m);
            }
            Mnemonic::And => {
                let m = bus.read(addr);
                self.a &= m;
                let a = self.a;
                self.status.set_zn(a);
            }
            Mnemonic::Ora => {
                let m = bus.read(addr);
                self.a |= m;
                let a = self.a;
                self.status.set_zn(a);
            }
            Mnemonic::Eor => {
                let m = bus.read(addr);
                self.a ^= m;
                let a = self.a;
                self.status.set_zn(a);
            }
            Mnemonic::Bit => {
                let m = bus.read(addr);
                self.status.set(Status::Z, self.a & m == 0);
                self.status.set(Status::V, m & 0x40 != 0);
                self.status.set(Status::N, m & 0x80 != 0);
            }
            Mnemonic::Cmp => {
                let m = bus.read(addr);
                self.compare(self.a, m);
            }
            Mnemonic::Cpx => {
                let m = bus.read(addr);
                self.compare(self.x, m);
            }
            Mnemonic::Cpy => {
                let m = bus.read(addr);
                self.compare(self.y, m);
            }
            Mnemonic::Inc => {
                let value = bus.read(addr).wrapping_add(1);
                bus.write(addr, value);
                self.status.set_zn(value);
            }
            Mnemonic::Dec => {
                let value = bus.read(addr).wrapping_sub(1);
                bus.write(addr, value);
                self.status.set_zn(value);
            }
            _ => unreachable!("not handled by op_generic"),
        }
        u32::from(info.page_cross && crossed)
    }

    fn adc(&mut self, value: u8) {
        let carry_in = u16::from(self.status.contains(Status::C));
        let sum = u16::from(self.a) + u16::from(value) + carry_in;
        let result = sum as u8;
        let carry_out = sum > 0xFF;
        let overflow = (self.a ^ result) & (value ^ result) & 0x80 != 0;
        self.a = result;
        self.status.set(Status::C, carry_out);
        self.status.set(Status::V, overflow);
        self.status.set_zn(result);
    }

    fn compare(&mut self, reg: u8, value: u8) {
        let diff = reg.wrapping_sub(value);
        self.status.set(Status::C, reg >= value);
        self.status.set(Status::Z, reg == value);
        self.status.set(Status::N, diff & 0x80 != 0);
    }
}
