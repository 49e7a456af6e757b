//! Receiver-side delivery state machine
//!
//! Decides, per inbound frame, whether the payload is delivered to the sink
//! and which acknowledgment goes back. The machine performs no I/O; the
//! session writes payloads and transmits the returned ack frames.
//!
//! ```text
//!  AwaitingFrame ──in-order frame──▶ deliver + ack ──┐
//!       ▲                                            │
//!       └────────────────────────────────────────────┘
//!  AwaitingFrame ──accepted EOT frame──▶ Complete
//! ```

use crate::frame::{self, Frame, FrameError};
use crate::mode::ArqMode;
use crate::sequence::{SeqNumber, SeqSpace};
use bytes::Bytes;

/// Receiver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// Waiting for the next in-order frame
    AwaitingFrame,
    /// The end-of-transmission frame has been accepted
    Complete,
}

/// What the session should do with an inbound datagram
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveAction {
    /// Corrupt datagram: drop it and send nothing
    Discard(FrameError),
    /// New in-order frame: write `payload`, then send `ack`
    Deliver {
        seq: SeqNumber,
        payload: Bytes,
        end_of_transmission: bool,
        ack: Bytes,
    },
    /// Duplicate or out-of-order frame: send `ack` again, write nothing
    Reack { seq: SeqNumber, ack: Bytes },
}

impl ReceiveAction {
    /// Ack frame to transmit, if any
    pub fn ack(&self) -> Option<&Bytes> {
        match self {
            ReceiveAction::Discard(_) => None,
            ReceiveAction::Deliver { ack, .. } | ReceiveAction::Reack { ack, .. } => Some(ack),
        }
    }
}

/// In-order delivery state for one transfer
#[derive(Debug)]
pub struct Receiver {
    mode: ArqMode,
    space: SeqSpace,
    /// Last sequence number delivered to the sink
    last_delivered: Option<SeqNumber>,
    state: ReceiverState,
    delivered: u64,
}

impl Receiver {
    /// Create a receiver expecting sequence number 0 first
    pub fn new(mode: ArqMode) -> Self {
        Receiver {
            mode,
            space: mode.seq_space(),
            last_delivered: None,
            state: ReceiverState::AwaitingFrame,
            delivered: 0,
        }
    }

    /// ARQ discipline of this receiver
    pub fn mode(&self) -> ArqMode {
        self.mode
    }

    /// Current state
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// `true` once the end-of-transmission frame has been accepted
    pub fn is_complete(&self) -> bool {
        self.state == ReceiverState::Complete
    }

    /// Last sequence number delivered, if any
    pub fn last_delivered(&self) -> Option<SeqNumber> {
        self.last_delivered
    }

    /// Number of frames delivered so far
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// Sequence number the receiver currently acknowledges for anything it
    /// does not accept
    ///
    /// Before the first delivery this is the number preceding 0, which no
    /// sender window contains.
    pub fn cumulative_ack(&self) -> SeqNumber {
        self.last_delivered
            .unwrap_or_else(|| self.space.prev(SeqNumber::default()))
    }

    /// Validate a raw datagram and process it
    pub fn on_datagram(&mut self, bytes: &[u8]) -> ReceiveAction {
        match frame::decode(bytes) {
            Ok(frame) => self.on_frame(frame),
            Err(e) => {
                tracing::debug!(error = %e, len = bytes.len(), "discarding corrupt frame");
                ReceiveAction::Discard(e)
            }
        }
    }

    /// Process a frame that already passed validation
    pub fn on_frame(&mut self, frame: Frame) -> ReceiveAction {
        if self.state == ReceiverState::AwaitingFrame && self.accepts(frame.seq) {
            self.last_delivered = Some(frame.seq);
            self.delivered += 1;
            if frame.end_of_transmission {
                self.state = ReceiverState::Complete;
            }

            tracing::debug!(
                seq = %frame.seq,
                len = frame.payload.len(),
                eot = frame.end_of_transmission,
                "frame delivered"
            );

            return ReceiveAction::Deliver {
                seq: frame.seq,
                payload: frame.payload,
                end_of_transmission: frame.end_of_transmission,
                ack: frame::encode_ack(frame.seq),
            };
        }

        let ack = self.reack_seq(frame.seq);
        tracing::debug!(seq = %frame.seq, ack = %ack, "duplicate or out-of-order frame");
        ReceiveAction::Reack {
            seq: ack,
            ack: frame::encode_ack(ack),
        }
    }

    fn accepts(&self, seq: SeqNumber) -> bool {
        if !self.space.contains(seq) {
            return false;
        }
        match self.mode {
            ArqMode::StopAndWait => self.last_delivered != Some(seq),
            ArqMode::GoBackN { .. } => seq == self.expected(),
        }
    }

    fn expected(&self) -> SeqNumber {
        self.last_delivered
            .map(|last| self.space.next(last))
            .unwrap_or_default()
    }

    fn reack_seq(&self, seq: SeqNumber) -> SeqNumber {
        match self.mode {
            // Stop-and-wait only ever re-acks the duplicate it just saw, which
            // is the last delivered frame.
            ArqMode::StopAndWait if self.last_delivered == Some(seq) => seq,
            _ => self.cumulative_ack(),
        }
    }
}
