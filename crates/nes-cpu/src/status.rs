//! The 6502 processor status register (`P`).

use bitflags::bitflags;

bitflags! {
    /// Processor status flags.
    ///
    /// Bit 5 (`U`, "unused") has no hardware meaning but is always read back
    /// as 1; bit 4 (`B`, "break") only exists on the value pushed to the
    /// stack by `BRK`/`PHP` and is not a real latch.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Status: u8 {
        /// Carry.
        const C = 1 << 0;
        /// Zero.
        const Z = 1 << 1;
        /// Interrupt disable.
        const I = 1 << 2;
        /// Decimal mode (present for compatibility; the NES CPU ignores it).
        const D = 1 << 3;
        /// Break (push-time artifact only).
        const B = 1 << 4;
        /// Unused, always reads as 1.
        const U = 1 << 5;
        /// Overflow.
        const V = 1 << 6;
        /// Negative.
        const N = 1 << 7;
    }
}

impl Status {
    /// Flags present immediately after reset: `I` and `U` set, everything
    /// else clear (status byte `0x24`).
    pub const POWER_ON: Self = Self::I.union(Self::U);

    /// Mask of bits `PLP`/`RTI` actually load from the stack (`B` is
    /// discarded, `U` is forced back on unconditionally).
    const PLP_MASK: Self = Self::C
        .union(Self::Z)
        .union(Self::I)
        .union(Self::D)
        .union(Self::V)
        .union(Self::N);

    /// Status immediately after reset.
    #[must_use]
    pub fn new() -> Self {
        Self::POWER_ON
    }

    /// Set `Z` and `N` from `value`, the common "load this byte into a
    /// register" flag update.
    pub fn set_zn(&mut self, value: u8) {
        self.set(Self::Z, value == 0);
        self.set(Self::N, value & 0x80 != 0);
    }

    /// Set or clear a single flag.
    pub fn set_flag(&mut self, flag: Self, value: bool) {
        self.set(flag, value);
    }

    /// Byte pushed to the stack by `PHP`/`BRK`/IRQ/NMI: `U` is always 1,
    /// `B` is 1 only for an explicit push (`PHP`/`BRK`), never for a
    /// hardware interrupt.
    #[must_use]
    pub fn to_stack_byte(self, brk: bool) -> u8 {
        let mut bits = (self | Self::U).bits();
        if brk {
            bits |= Self::B.bits();
        } else {
            bits &= !Self::B.bits();
        }
        bits
    }

    /// Status loaded by `PLP`/`RTI`: `B` is dropped, `U` is forced on.
    #[must_use]
    pub fn from_stack_byte(value: u8) -> Self {
        (Self::from_bits_truncate(value) & Self::PLP_MASK) | Self::U
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_on_status_is_0x24() {
        assert_eq!(Status::new().bits(), 0x24);
    }

    #[test]
    fn set_zn_zero() {
        let mut s = Status::empty();
        s.set_zn(0);
        assert!(s.contains(Status::Z));
        assert!(!s.contains(Status::N));
    }

    #[test]
    fn set_zn_negative() {
        let mut s = Status::empty();
        s.set_zn(0x80);
        assert!(!s.contains(Status::Z));
        assert!(s.contains(Status::N));
    }

    #[test]
    fn set_zn_positive() {
        let mut s = Status::empty();
        s.set_zn(1);
        assert!(!s.contains(Status::Z));
        assert!(!s.contains(Status::N));
    }

    #[test]
    fn to_stack_byte_with_brk_sets_bits_4_and_5() {
        let s = Status::empty();
        assert_eq!(s.to_stack_byte(true), 0x30);
    }

    #[test]
    fn to_stack_byte_without_brk_sets_only_bit_5() {
        let s = Status::empty();
        assert_eq!(s.to_stack_byte(false), 0x20);
    }

    #[test]
    fn from_stack_byte_clears_break_and_forces_unused() {
        let s = Status::from_stack_byte(0xFF);
        assert!(!s.contains(Status::B));
        assert!(s.contains(Status::U));
    }

    #[test]
    fn from_stack_byte_round_trip_preserves_other_flags() {
        let s = Status::from_stack_byte(0x6D); // N V _ _ D _ Z C
        assert!(s.contains(Status::N));
        assert!(s.contains(Status::V));
        assert!(s.contains(Status::D));
        assert!(s.contains(Status::Z));
        assert!(s.contains(Status::C));
    }
}
