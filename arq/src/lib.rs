//! ARQ - reliable file transfer over lossy datagrams
//!
//! High-level Rust API: sender and receiver sessions running stop-and-wait or
//! Go-Back-N over any [`Channel`].
//!
//! ```no_run
//! use arq::{SenderSession, TransferConfig, UdpChannel};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let channel = UdpChannel::bind("0.0.0.0:9000".parse()?, "127.0.0.1:9001".parse()?)?;
//! let config = TransferConfig::go_back_n(10)?;
//! let file = std::fs::File::open("input.bin")?;
//! let report = SenderSession::new(Arc::new(channel), config).send(file)?;
//! println!("sent {} bytes", report.bytes);
//! # Ok(())
//! # }
//! ```

pub use arq_io as io;
pub use arq_protocol as protocol;

pub mod config;
pub mod error;
pub mod receiver;
pub mod report;
pub mod sender;

pub use config::{TransferConfig, DEFAULT_LINGER};
pub use error::{Result, TransferError};
pub use receiver::ReceiverSession;
pub use report::TransferReport;
pub use sender::SenderSession;

// Re-export commonly used types
pub use io::{Channel, ChannelError, MemoryChannel, UdpChannel, DEFAULT_RETRANSMIT_TIMEOUT};
pub use protocol::{ArqMode, DivisorLoss, EveryNth, LossPolicy, NoLoss, MAX_PAYLOAD_SIZE, MAX_WINDOW_SIZE};
