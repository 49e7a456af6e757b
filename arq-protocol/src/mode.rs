//! ARQ discipline selection
//!
//! Stop-and-wait and Go-Back-N share one engine. Stop-and-wait is simply the
//! single-outstanding, alternating-bit instance of the sliding window.

use crate::sequence::SeqSpace;
use std::fmt;
use thiserror::Error;

/// Largest usable Go-Back-N window
///
/// A window spanning the whole 128-number space would let the receiver
/// mistake a retransmitted frame for a new one after a lost round of acks,
/// so the window is limited to one less than the modulus.
pub const MAX_WINDOW_SIZE: usize = 127;

/// Default Go-Back-N window
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// ARQ discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArqMode {
    /// Single outstanding frame, alternating-bit sequence numbers,
    /// exact-match acknowledgment
    StopAndWait,
    /// Sliding window with cumulative acknowledgment over 7-bit sequence
    /// numbers
    GoBackN { window_size: usize },
}

impl ArqMode {
    /// Go-Back-N with the given window size, validated
    pub fn go_back_n(window_size: usize) -> Result<Self, ModeError> {
        let mode = ArqMode::GoBackN { window_size };
        mode.validate()?;
        Ok(mode)
    }

    /// Number of frames that may be outstanding at once
    pub fn window_size(self) -> usize {
        match self {
            ArqMode::StopAndWait => 1,
            ArqMode::GoBackN { window_size } => window_size,
        }
    }

    /// Sequence space used by this discipline
    pub fn seq_space(self) -> SeqSpace {
        match self {
            ArqMode::StopAndWait => SeqSpace::STOP_AND_WAIT,
            ArqMode::GoBackN { .. } => SeqSpace::GO_BACK_N,
        }
    }

    /// Whether acknowledgments are cumulative
    pub fn is_cumulative(self) -> bool {
        matches!(self, ArqMode::GoBackN { .. })
    }

    /// Check the window size against the sequence space
    pub fn validate(self) -> Result<(), ModeError> {
        match self {
            ArqMode::StopAndWait => Ok(()),
            ArqMode::GoBackN { window_size } => {
                if (1..=MAX_WINDOW_SIZE).contains(&window_size) {
                    Ok(())
                } else {
                    Err(ModeError::InvalidWindowSize {
                        size: window_size,
                        max: MAX_WINDOW_SIZE,
                    })
                }
            }
        }
    }
}

impl Default for ArqMode {
    fn default() -> Self {
        ArqMode::GoBackN {
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

impl fmt::Display for ArqMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArqMode::StopAndWait => write!(f, "stop-and-wait"),
            ArqMode::GoBackN { window_size } => write!(f, "go-back-n(window={})", window_size),
        }
    }
}

/// Mode configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModeError {
    #[error("Invalid window size {size}: must be between 1 and {max}")]
    InvalidWindowSize { size: usize, max: usize },
}
