//! Drives a synthetic NROM program through several emulated frames and
//! checks that the NMI handler ran and that the PPU produced a picture.

use nes_bus::System;
use nes_mappers::{create_mapper, Cartridge, Mirroring};

/// Zero-page counter the NMI handler increments.
const NMI_COUNTER: u8 = 0x10;

fn build_prg() -> Vec<u8> {
    let mut prg = vec![0u8; 0x8000];
    let mut put = |addr: u16, bytes: &[u8]| {
        let base = (addr - 0x8000) as usize;
        prg[base..base + bytes.len()].copy_from_slice(bytes);
    };

    // Reset routine at $8000: wait for two VBlanks, enable NMI and
    // rendering, write one palette byte through $2006/$2007, then spin.
    put(
        0x8000,
        &[
            0xAD, 0x02, 0x20, // LDA $2002
            0x29, 0x80, // AND #$80
            0xF0, 0xF9, // BEQ $8000
            0xAD, 0x02, 0x20, // LDA $2002
            0x29, 0x80, // AND #$80
            0xF0, 0xF9, // BEQ $8007
            0xA9, 0x80, // LDA #$80
            0x8D, 0x00, 0x20, // STA $2000 (NMI enable)
            0xA9, 0x1E, // LDA #$1E
            0x8D, 0x01, 0x20, // STA $2001 (show background+sprites)
            0xA9, 0x3F, // LDA #$3F
            0x8D, 0x06, 0x20, // STA $2006
            0xA9, 0x00, // LDA #$00
            0x8D, 0x06, 0x20, // STA $2006 -> PPUADDR = $3F00
            0xA9, 0x0F, // LDA #$0F
            0x8D, 0x07, 0x20, // STA $2007 (palette entry 0 = white)
            0x4C, 0x27, 0x80, // JMP $8027
        ],
    );

    // NMI handler at $9000: bump the zero-page counter and return.
    put(0x9000, &[0xE6, NMI_COUNTER, 0x40]); // INC $10 ; RTI

    // Vectors.
    put(0xFFFA, &[0x00, 0x90]); // NMI   -> $9000
    put(0xFFFC, &[0x00, 0x80]); // RESET -> $8000
    put(0xFFFE, &[0x02, 0x90]); // IRQ   -> $9002 (bare RTI), unused here

    prg
}

#[test]
fn nmi_fires_and_the_frame_buffer_gets_painted() {
    let cart = Cartridge::with_chr_ram(build_prg(), 0, Mirroring::Horizontal, false);
    let mapper = create_mapper(&cart).expect("mapper 0 is supported");
    let mut sys = System::new(mapper);
    sys.reset();

    for _ in 0..10 {
        sys.step_frame();
    }

    let counter = nes_cpu::Bus::read(&mut sys, u16::from(NMI_COUNTER));
    assert!(counter > 0, "NMI handler never ran");
    assert!(sys.ppu.frame_buffer().iter().any(|&byte| byte != 0), "frame buffer is still blank");
}
