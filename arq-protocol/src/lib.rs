//! ARQ Protocol Core Implementation
//!
//! This crate implements the I/O-free core of reliable, ordered transfer over
//! an unreliable datagram channel: sequence arithmetic, the frame codec and
//! checksum, the sender's sliding window, the receiver's in-order delivery
//! state machine, and injectable loss policies. Stop-and-wait and Go-Back-N
//! share the same types, parameterized by [`ArqMode`].

pub mod frame;
pub mod loss;
pub mod mode;
pub mod receiver;
pub mod sequence;
pub mod window;

pub use frame::{Frame, FrameError, HEADER_SIZE, MAX_FRAME_SIZE, MAX_PAYLOAD_SIZE};
pub use loss::{DivisorLoss, EveryNth, LossPolicy, NoLoss};
pub use mode::{ArqMode, ModeError, DEFAULT_WINDOW_SIZE, MAX_WINDOW_SIZE};
pub use receiver::{ReceiveAction, Receiver, ReceiverState};
pub use sequence::{SeqNumber, SeqSpace};
pub use window::{AckOutcome, SendWindow, WindowError};
