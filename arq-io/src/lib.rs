//! ARQ I/O and Platform Abstraction
//!
//! This crate provides the datagram channels the transfer sessions run over
//! (a UDP socket and an in-memory pair with fault injection) and the
//! retransmission timer.

pub mod channel;
pub mod memory;
pub mod socket;
pub mod timer;

pub use channel::{Channel, ChannelError};
pub use memory::{FaultAction, LinkFault, MemoryChannel};
pub use socket::UdpChannel;
pub use timer::{RetransmitTimer, DEFAULT_RETRANSMIT_TIMEOUT};
