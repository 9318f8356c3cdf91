//! Checksum diagnostic reported after a document is encoded.

use std::fmt;

/// Running sum (modulo 256) of every byte emitted for one document.
///
/// The value is informational: it tells the operator which byte would balance
/// the image to zero, but is never written into the image itself.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct Checksum {
    sum: u8,
}

impl Checksum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.sum = bytes.iter().fold(self.sum, |acc, b| acc.wrapping_add(*b));
    }

    /// The sum of all bytes seen so far, modulo 256.
    pub fn sum(&self) -> u8 {
        self.sum
    }

    /// The two's-complement balance byte, or `None` when the sum is already
    /// zero.
    pub fn balance(&self) -> Option<u8> {
        match self.sum {
            0 => None,
            s => Some(s.wrapping_neg()),
        }
    }
}

/// Renders `Ok` for a balanced image, otherwise the balance byte as two
/// uppercase hex digits.
impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.balance() {
            None => write!(f, "Ok"),
            Some(b) => write!(f, "{:02X}", b),
        }
    }
}
