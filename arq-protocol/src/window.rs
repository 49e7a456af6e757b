//! Sender-side sliding window
//!
//! Holds the encoded frames that have been transmitted but not yet
//! acknowledged, in transmission order, together with the window base and the
//! next sequence number to assign.
//!
//! ```text
//!   base                  next_seq
//!     │                      │
//! ────┼──────────────────────┼────────────────▶ seq space (mod N)
//!     │ <─── outstanding ───▶│ <── room ──▶│
//!     │<──────────── window size ─────────▶│
//! ```
//!
//! The window performs no I/O. The session transmits what [`SendWindow::push`]
//! returns and retransmits [`SendWindow::outstanding`] when its timer fires.

use crate::frame::{self, FrameError};
use crate::mode::{ArqMode, ModeError};
use crate::sequence::{SeqNumber, SeqSpace};
use bytes::Bytes;
use std::collections::VecDeque;
use thiserror::Error;

/// Window errors
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Window is full")]
    Full,

    #[error("Final frame already queued")]
    Finished,

    #[error("Mode error: {0}")]
    Mode(#[from] ModeError),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Result of feeding an acknowledgment to the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// The ack covered `acked` outstanding frames; the base moved past them
    Advanced { acked: usize },
    /// Stale, duplicate or out-of-window ack; nothing changed
    Ignored,
}

/// A transmitted, unacknowledged frame
#[derive(Debug, Clone)]
struct OutstandingFrame {
    seq: SeqNumber,
    bytes: Bytes,
    send_count: u32,
}

/// Sliding send window for one transfer
#[derive(Debug)]
pub struct SendWindow {
    mode: ArqMode,
    space: SeqSpace,
    size: usize,
    /// Oldest unacknowledged sequence number
    base: SeqNumber,
    /// Sequence number for the next new frame
    next_seq: SeqNumber,
    outstanding: VecDeque<OutstandingFrame>,
    final_queued: bool,
}

impl SendWindow {
    /// Create an empty window starting at sequence number 0
    pub fn new(mode: ArqMode) -> Result<Self, WindowError> {
        mode.validate()?;
        let size = mode.window_size();

        Ok(SendWindow {
            mode,
            space: mode.seq_space(),
            size,
            base: SeqNumber::default(),
            next_seq: SeqNumber::default(),
            outstanding: VecDeque::with_capacity(size),
            final_queued: false,
        })
    }

    /// ARQ discipline of this window
    pub fn mode(&self) -> ArqMode {
        self.mode
    }

    /// Oldest unacknowledged sequence number
    pub fn base(&self) -> SeqNumber {
        self.base
    }

    /// Sequence number the next pushed frame will carry
    pub fn next_seq(&self) -> SeqNumber {
        self.next_seq
    }

    /// Configured window size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of outstanding frames
    pub fn len(&self) -> usize {
        self.outstanding.len()
    }

    /// `true` when nothing is awaiting acknowledgment
    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// `true` when another frame may be sent
    pub fn has_room(&self) -> bool {
        self.outstanding.len() < self.size
    }

    /// `true` once the end-of-transmission frame has been pushed
    pub fn is_final_queued(&self) -> bool {
        self.final_queued
    }

    /// `true` once the final frame has been pushed and everything is acked
    pub fn is_complete(&self) -> bool {
        self.final_queued && self.outstanding.is_empty()
    }

    /// Encode `payload` as the next frame and place it in the window
    ///
    /// Returns the encoded frame for transmission.
    pub fn push(&mut self, payload: &[u8], is_last: bool) -> Result<Bytes, WindowError> {
        if self.final_queued {
            return Err(WindowError::Finished);
        }
        if !self.has_room() {
            return Err(WindowError::Full);
        }

        let seq = self.next_seq;
        let bytes = frame::encode(seq, payload, is_last)?;

        self.outstanding.push_back(OutstandingFrame {
            seq,
            bytes: bytes.clone(),
            send_count: 1,
        });
        self.next_seq = self.space.next(seq);
        self.final_queued = is_last;

        tracing::trace!(%seq, len = payload.len(), is_last, "frame queued");
        Ok(bytes)
    }

    /// Process an acknowledgment
    ///
    /// Go-Back-N acks are cumulative: an ack inside `[base, base + size)` that
    /// names an outstanding frame releases that frame and every frame before
    /// it. With a window of one this reduces to the exact-match rule of
    /// stop-and-wait. Any other ack is ignored, so a repeated ack never moves
    /// the base twice.
    pub fn on_ack(&mut self, ack: SeqNumber) -> AckOutcome {
        if self.outstanding.is_empty() || !self.space.in_window(self.base, self.size, ack) {
            return AckOutcome::Ignored;
        }

        let acked = self.space.distance(self.base, ack) + 1;
        if acked > self.outstanding.len() {
            // Names a sequence number we have not sent yet
            return AckOutcome::Ignored;
        }

        self.outstanding.drain(..acked);
        self.base = self.space.next(ack);

        tracing::trace!(%ack, acked, base = %self.base, "window advanced");
        AckOutcome::Advanced { acked }
    }

    /// Sequence numbers of the outstanding frames, oldest first
    pub fn outstanding_seqs(&self) -> impl Iterator<Item = SeqNumber> + '_ {
        self.outstanding.iter().map(|f| f.seq)
    }

    /// Encoded outstanding frames, oldest first
    pub fn outstanding(&self) -> impl Iterator<Item = &Bytes> + '_ {
        self.outstanding.iter().map(|f| &f.bytes)
    }

    /// Record that every outstanding frame was just sent again
    ///
    /// Returns the number of frames covered.
    pub fn mark_retransmitted(&mut self) -> usize {
        for frame in self.outstanding.iter_mut() {
            frame.send_count += 1;
        }
        self.outstanding.len()
    }

    /// Highest transmission count among outstanding frames
    pub fn max_send_count(&self) -> u32 {
        self.outstanding
            .iter()
            .map(|f| f.send_count)
            .max()
            .unwrap_or(0)
    }
}
