//! Console-level throughput benchmarks, mirroring the shapes measured one
//! layer down in the CPU crate but now driving the full CPU/PPU/mapper
//! system as a real ROM would.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use nes_bus::System;
use nes_mappers::{create_mapper, Cartridge, Mirroring};

/// A minimal NROM image: an infinite `JMP` at the reset vector, enough to
/// give the CPU real opcodes to decode without ever halting.
fn minimal_cartridge() -> Cartridge {
    let mut prg = vec![0u8; 0x8000];
    prg[0] = 0x4C; // JMP $8000
    prg[1] = 0x00;
    prg[2] = 0x80;
    prg[0x7FFC] = 0x00; // reset vector -> $8000
    prg[0x7FFD] = 0x80;
    Cartridge::with_chr_ram(prg, 0, Mirroring::Horizontal, false)
}

fn new_system() -> System {
    let cart = minimal_cartridge();
    let mapper = create_mapper(&cart).expect("mapper 0 is supported");
    let mut sys = System::new(mapper);
    sys.reset();
    sys
}

fn bench_cpu_step(c: &mut Criterion) {
    let mut sys = new_system();

    let mut group = c.benchmark_group("system");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_step", |b| {
        b.iter(|| {
            black_box(sys.step());
        });
    });

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let mut sys = new_system();

    let mut group = c.benchmark_group("system");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_frame", |b| {
        b.iter(|| {
            sys.step_frame();
            black_box(sys.ppu.frame_buffer());
        });
    });

    group.bench_function("60_frames", |b| {
        b.iter(|| {
            for _ in 0..60 {
                sys.step_frame();
            }
            black_box(sys.ppu.frame_buffer());
        });
    });

    group.finish();
}

fn bench_reset(c: &mut Criterion) {
    let mut sys = new_system();

    c.bench_function("system_reset", |b| {
        b.iter(|| {
            sys.reset();
            black_box(sys.cpu.pc());
        });
    });
}

criterion_group!(benches, bench_cpu_step, bench_frame, bench_reset);
criterion_main!(benches);
