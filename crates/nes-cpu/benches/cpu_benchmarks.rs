//! Throughput benchmarks for the bare CPU interpreter, independent of any
//! PPU/mapper wiring. Mirrors the benchmark shapes used one layer up in the
//! bus crate, scaled down to what a standalone `Cpu` can exercise on its own.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use nes_cpu::{Bus, Cpu};

struct FlatBus([u8; 0x10000]);

impl FlatBus {
    fn with_program(program: &[u8]) -> Self {
        let mut ram = [0u8; 0x10000];
        ram[0x8000..0x8000 + program.len()].copy_from_slice(program);
        ram[0xFFFC] = 0x00;
        ram[0xFFFD] = 0x80;
        Self(ram)
    }
}

impl Bus for FlatBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.0[addr as usize]
    }
    fn write(&mut self, addr: u16, value: u8) {
        self.0[addr as usize] = value;
    }
}

/// A tight immediate-mode loop: `LDA #$01 / ADC #$01 / JMP $8000`, never
/// reaching its own end so every call to `step` keeps decoding real opcodes.
fn counting_loop_program() -> Vec<u8> {
    vec![0xA9, 0x01, 0x69, 0x01, 0x4C, 0x00, 0x80]
}

fn bench_single_step(c: &mut Criterion) {
    let mut bus = FlatBus::with_program(&counting_loop_program());
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);

    let mut group = c.benchmark_group("cpu");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_step", |b| {
        b.iter(|| {
            black_box(cpu.step(&mut bus));
        });
    });

    group.bench_function("1000_steps", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                black_box(cpu.step(&mut bus));
            }
        });
    });

    group.finish();
}

fn bench_reset(c: &mut Criterion) {
    let mut bus = FlatBus::with_program(&counting_loop_program());

    c.bench_function("cpu_reset", |b| {
        b.iter(|| {
            let mut cpu = Cpu::new();
            cpu.reset(&mut bus);
            black_box(cpu.pc());
        });
    });
}

criterion_group!(benches, bench_single_step, bench_reset);
criterion_main!(benches);
