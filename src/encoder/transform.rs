//! Byte transform policies applied while encoding a hex dump.

/// The transform applied to every decoded byte of a document.
///
/// Some boards wire the flash data bus reversed, or expect nibbles swapped, so
/// the image is adjusted on the host. When both are requested the byte is
/// inverted first and then swapped.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ByteTransform {
    Identity,
    Invert,
    Swap,
    InvertThenSwap,
}

impl ByteTransform {
    /// Select the policy from the two independent command line flags.
    pub fn from_flags(invert: bool, swap: bool) -> Self {
        match (invert, swap) {
            (false, false) => ByteTransform::Identity,
            (true, false) => ByteTransform::Invert,
            (false, true) => ByteTransform::Swap,
            (true, true) => ByteTransform::InvertThenSwap,
        }
    }

    pub fn apply(self, byte: u8) -> u8 {
        match self {
            ByteTransform::Identity => byte,
            ByteTransform::Invert => invert(byte),
            ByteTransform::Swap => swap(byte),
            ByteTransform::InvertThenSwap => swap(invert(byte)),
        }
    }
}

impl Default for ByteTransform {
    fn default() -> Self {
        ByteTransform::Identity
    }
}

/// Reverse the bit order of a byte (bit 0 becomes bit 7).
pub fn invert(byte: u8) -> u8 {
    byte.reverse_bits()
}

/// Exchange the high and low nibbles.
pub fn swap(byte: u8) -> u8 {
    byte.rotate_left(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_exchanges_nibbles() {
        assert_eq!(swap(0xAB), 0xBA);
        assert_eq!(swap(0x0F), 0xF0);
    }

    #[test]
    fn invert_reverses_bits() {
        assert_eq!(invert(0x01), 0x80);
        assert_eq!(invert(0xC0), 0x03);
    }

    #[test]
    fn invert_is_self_inverse() {
        for b in 0..=u8::MAX {
            assert_eq!(invert(invert(b)), b);
        }
    }

    #[test]
    fn flags_select_policy() {
        assert_eq!(ByteTransform::from_flags(false, false), ByteTransform::Identity);
        assert_eq!(ByteTransform::from_flags(true, true), ByteTransform::InvertThenSwap);
    }

    #[test]
    fn invert_then_swap_combines_both() {
        // 0x01 -> 0x80 -> 0x08
        assert_eq!(ByteTransform::InvertThenSwap.apply(0x01), 0x08);
        // 0x12 -> 0x48 -> 0x84
        assert_eq!(ByteTransform::InvertThenSwap.apply(0x12), 0x84);
        assert_eq!(ByteTransform::Identity.apply(0x12), 0x12);
    }
}
