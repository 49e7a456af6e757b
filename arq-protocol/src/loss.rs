//! Synthetic loss policies
//!
//! A receiver can be told to throw away a fraction of the valid frames it
//! receives, to exercise the retransmission path. The decision is injected as
//! a [`LossPolicy`] so the state machines themselves stay deterministic.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used by [`DivisorLoss::new`]
pub const DEFAULT_LOSS_SEED: u64 = 0x5EED_A4C0;

/// Decides whether the next received frame is dropped
pub trait LossPolicy: Send {
    /// Return `true` to drop the frame being processed
    fn should_drop(&mut self) -> bool;
}

impl<F> LossPolicy for F
where
    F: FnMut() -> bool + Send,
{
    fn should_drop(&mut self) -> bool {
        self()
    }
}

/// Never drops anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLoss;

impl LossPolicy for NoLoss {
    fn should_drop(&mut self) -> bool {
        false
    }
}

/// Drops each frame with probability `1 / divisor`
///
/// This is the "reliability number" of the command-line receiver. A divisor of
/// 0 disables dropping. Decisions come from a seeded generator, so a given
/// seed always produces the same drop pattern.
#[derive(Debug, Clone)]
pub struct DivisorLoss {
    divisor: u32,
    rng: StdRng,
}

impl DivisorLoss {
    /// Create a policy with the default seed
    pub fn new(divisor: u32) -> Self {
        Self::with_seed(divisor, DEFAULT_LOSS_SEED)
    }

    /// Create a policy with an explicit seed
    pub fn with_seed(divisor: u32, seed: u64) -> Self {
        DivisorLoss {
            divisor,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Configured divisor
    pub fn divisor(&self) -> u32 {
        self.divisor
    }

    /// Whether this policy ever drops
    pub fn is_enabled(&self) -> bool {
        self.divisor > 0
    }
}

impl LossPolicy for DivisorLoss {
    fn should_drop(&mut self) -> bool {
        self.divisor > 0 && self.rng.random_ratio(1, self.divisor)
    }
}

/// Drops exactly every `n`-th frame (the `n`-th, `2n`-th, ...)
///
/// `n == 0` disables dropping.
#[derive(Debug, Clone)]
pub struct EveryNth {
    n: u32,
    seen: u32,
}

impl EveryNth {
    /// Create a policy dropping every `n`-th frame
    pub fn new(n: u32) -> Self {
        EveryNth { n, seen: 0 }
    }
}

impl LossPolicy for EveryNth {
    fn should_drop(&mut self) -> bool {
        if self.n == 0 {
            return false;
        }
        self.seen += 1;
        if self.seen == self.n {
            self.seen = 0;
            true
        } else {
            false
        }
    }
}
