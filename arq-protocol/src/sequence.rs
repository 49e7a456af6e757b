//! Sequence Number Handling
//!
//! Frames carry a 7-bit sequence number in the low bits of the first header
//! byte. Each ARQ discipline uses a sequence space of its own size: stop-and-wait
//! alternates between 0 and 1, Go-Back-N counts modulo 128. This module
//! provides the sequence number type and the modular arithmetic over a space,
//! including the circular window membership test.

use std::fmt;

/// Maximum sequence number value (7-bit: 0x7F)
pub const MAX_SEQ_NUMBER: u8 = 0x7F;

/// Sequence number as carried on the wire
///
/// The value itself is only meaningful relative to a [`SeqSpace`]; arithmetic
/// always goes through the space so wraparound happens at the right modulus.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Default)]
pub struct SeqNumber(u8);

impl SeqNumber {
    /// Create a new sequence number
    ///
    /// # Panics
    /// Panics if value exceeds MAX_SEQ_NUMBER
    pub fn new(value: u8) -> Self {
        assert!(
            value <= MAX_SEQ_NUMBER,
            "Sequence number {} exceeds maximum {}",
            value,
            MAX_SEQ_NUMBER
        );
        SeqNumber(value)
    }

    /// Create a sequence number from a raw header byte
    ///
    /// The value is masked to 7 bits.
    #[inline]
    pub fn new_unchecked(value: u8) -> Self {
        SeqNumber(value & MAX_SEQ_NUMBER)
    }

    /// Get the raw sequence number value
    #[inline]
    pub fn as_raw(self) -> u8 {
        self.0
    }
}

impl fmt::Debug for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SeqNumber({})", self.0)
    }
}

impl fmt::Display for SeqNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for SeqNumber {
    fn from(value: u8) -> Self {
        SeqNumber::new_unchecked(value)
    }
}

impl From<SeqNumber> for u8 {
    fn from(seq: SeqNumber) -> u8 {
        seq.0
    }
}

/// A modular sequence space
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SeqSpace {
    modulus: u8,
}

impl SeqSpace {
    /// Alternating-bit space used by stop-and-wait
    pub const STOP_AND_WAIT: SeqSpace = SeqSpace { modulus: 2 };

    /// Full 7-bit space used by Go-Back-N
    pub const GO_BACK_N: SeqSpace = SeqSpace { modulus: 128 };

    /// Number of distinct sequence numbers in this space
    #[inline]
    pub fn modulus(self) -> u8 {
        self.modulus
    }

    /// Whether `seq` is a valid member of this space
    #[inline]
    pub fn contains(self, seq: SeqNumber) -> bool {
        seq.0 < self.modulus
    }

    /// The sequence number following `seq`
    #[inline]
    pub fn next(self, seq: SeqNumber) -> SeqNumber {
        self.add(seq, 1)
    }

    /// The sequence number preceding `seq`
    #[inline]
    pub fn prev(self, seq: SeqNumber) -> SeqNumber {
        self.add(seq, self.modulus as usize - 1)
    }

    /// Advance `seq` by `n` positions, wrapping at the modulus
    pub fn add(self, seq: SeqNumber, n: usize) -> SeqNumber {
        let m = self.modulus as usize;
        SeqNumber(((seq.0 as usize % m + n % m) % m) as u8)
    }

    /// Forward distance from `from` to `to`, in `[0, modulus)`
    pub fn distance(self, from: SeqNumber, to: SeqNumber) -> usize {
        let m = self.modulus as usize;
        (to.0 as usize + m - from.0 as usize % m) % m
    }

    /// Circular half-open window membership: is `value` in `[base, base + size)`?
    ///
    /// When the window crosses the wrap point it is split into the two linear
    /// ranges `[base, modulus)` and `[0, (base + size) mod modulus)`.
    pub fn in_window(self, base: SeqNumber, size: usize, value: SeqNumber) -> bool {
        let m = self.modulus as usize;
        let base = base.0 as usize;
        let value = value.0 as usize;

        if value >= m || base >= m {
            return false;
        }

        let end = base + size.min(m);
        if end <= m {
            base <= value && value < end
        } else {
            (base <= value && value < m) || value < end - m
        }
    }
}

impl fmt::Display for SeqSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mod {}", self.modulus)
    }
}
