//! A register-accepting stub for the NES 2A03 APU surface.
//!
//! Audio synthesis (pulse/triangle/noise/DMC channel mixing) is out of
//! scope for this workspace: the bus still needs somewhere to dispatch
//! `$4000..=$4017` reads and writes, so this crate keeps the five
//! channel-enable bits and the two IRQ-flag bits of `$4015` that
//! software actually branches on, and otherwise just remembers the last
//! byte written to each register for open-bus-style reads.
//!
//! A driver that wants real audio output would replace this crate
//! wholesale with one that actually clocks the channels; nothing else
//! in the workspace depends on APU internals beyond the `$4015` status
//! byte and the two IRQ flags below.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Register-accepting APU stub.
///
/// Holds the last-written byte for every addressable register
/// (`$4000..=$4013`, `$4015`, `$4017`) plus the channel-enable bits and
/// frame-IRQ/DMC-IRQ flags that `$4015` exposes on read, since some
/// commercial software polls those bits even when it never expects
/// audio output from an emulator.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Apu {
    registers: [u8; 0x18],
    channel_enable: u8,
    frame_irq: bool,
    dmc_irq: bool,
}

impl Default for Apu {
    fn default() -> Self {
        Self {
            registers: [0; 0x18],
            channel_enable: 0,
            frame_irq: false,
            dmc_irq: false,
        }
    }
}

impl Apu {
    /// A freshly constructed, silent APU stub.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-initialise to power-on state.
    pub fn reset(&mut self) {
        *self = Self::default();
        log::debug!("apu stub reset");
    }

    /// Write to an APU or frame-counter register (`$4000..=$4013`,
    /// `$4015`, `$4017`). Accepted unconditionally; only `$4015`'s
    /// channel-enable bits are retained for read-back.
    pub fn write(&mut self, addr: u16, value: u8) {
        if let Some(slot) = Self::register_index(addr) {
            self.registers[slot] = value;
        }
        if addr == 0x4015 {
            self.channel_enable = value & 0x1F;
            // Writing $4015 acknowledges the DMC IRQ flag on real hardware.
            self.dmc_irq = false;
        }
    }

    /// Read the APU status register (`$4015`). Bits 0-4 report which
    /// channels are enabled (never actually produce sound here); bit 6
    /// is the DMC IRQ flag; bit 7 is the frame IRQ flag. Reading clears
    /// the frame IRQ flag, matching the real 2A03.
    pub fn read_status(&mut self) -> u8 {
        let status = self.channel_enable
            | (u8::from(self.dmc_irq) << 6)
            | (u8::from(self.frame_irq) << 7);
        self.frame_irq = false;
        status
    }

    /// Whether the stub is currently asserting an IRQ (frame or DMC).
    /// Always `false` unless a driver or test calls
    /// [`Apu::raise_frame_irq`] / [`Apu::raise_dmc_irq`] directly, since
    /// this stub never clocks the frame counter that would normally set
    /// these on real hardware.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        self.frame_irq || self.dmc_irq
    }

    /// Test/driver hook: assert the frame-sequencer IRQ flag.
    pub fn raise_frame_irq(&mut self) {
        self.frame_irq = true;
    }

    /// Test/driver hook: assert the DMC IRQ flag.
    pub fn raise_dmc_irq(&mut self) {
        self.dmc_irq = true;
    }

    fn register_index(addr: u16) -> Option<usize> {
        match addr {
            0x4000..=0x4013 => Some((addr - 0x4000) as usize),
            0x4015 => Some(0x15),
            0x4017 => Some(0x17),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_to_unknown_addresses_are_ignored() {
        let mut apu = Apu::new();
        apu.write(0x4018, 0xFF); // outside the addressable range
        assert_eq!(apu.read_status(), 0);
    }

    #[test]
    fn channel_enable_bits_round_trip_through_4015() {
        let mut apu = Apu::new();
        apu.write(0x4015, 0b0001_0111);
        assert_eq!(apu.read_status() & 0x1F, 0b0001_0111);
    }

    #[test]
    fn reading_status_clears_frame_irq() {
        let mut apu = Apu::new();
        apu.raise_frame_irq();
        assert!(apu.irq_pending());
        let status = apu.read_status();
        assert_eq!(status & 0x80, 0x80);
        assert!(!apu.irq_pending());
    }

    #[test]
    fn writing_4015_acknowledges_dmc_irq() {
        let mut apu = Apu::new();
        apu.raise_dmc_irq();
        assert!(apu.irq_pending());
        apu.write(0x4015, 0x00);
        assert!(!apu.irq_pending());
    }

    #[test]
    fn reset_clears_all_state() {
        let mut apu = Apu::new();
        apu.write(0x4000, 0xFF);
        apu.write(0x4015, 0x1F);
        apu.raise_frame_irq();
        apu.reset();
        assert_eq!(apu.read_status(), 0);
    }
}
