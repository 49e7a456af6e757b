//! Transfer configuration

use crate::error::TransferError;
use arq_io::DEFAULT_RETRANSMIT_TIMEOUT;
use arq_protocol::{ArqMode, MAX_PAYLOAD_SIZE};
use std::time::Duration;

/// How long a receiver keeps answering retransmitted frames after completion
pub const DEFAULT_LINGER: Duration = Duration::from_millis(300);

/// Parameters shared by the sending and receiving side of one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferConfig {
    /// ARQ discipline (and window size for Go-Back-N)
    pub mode: ArqMode,
    /// Payload bytes per frame (1..=124)
    pub chunk_size: usize,
    /// Retransmission period of the sender
    pub retransmit_timeout: Duration,
    /// Receiver quiet period after the final frame; zero disables it
    pub linger: Duration,
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            mode: ArqMode::default(),
            chunk_size: MAX_PAYLOAD_SIZE,
            retransmit_timeout: DEFAULT_RETRANSMIT_TIMEOUT,
            linger: DEFAULT_LINGER,
        }
    }
}

impl TransferConfig {
    /// Default configuration in stop-and-wait mode
    pub fn stop_and_wait() -> Self {
        TransferConfig {
            mode: ArqMode::StopAndWait,
            ..Default::default()
        }
    }

    /// Default configuration in Go-Back-N mode with the given window
    pub fn go_back_n(window_size: usize) -> Result<Self, TransferError> {
        let mode = ArqMode::go_back_n(window_size)
            .map_err(|e| TransferError::Config(e.to_string()))?;
        Ok(TransferConfig {
            mode,
            ..Default::default()
        })
    }

    pub fn with_mode(mut self, mode: ArqMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_retransmit_timeout(mut self, timeout: Duration) -> Self {
        self.retransmit_timeout = timeout;
        self
    }

    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    /// Check the configuration before a session starts
    pub fn validate(&self) -> Result<(), TransferError> {
        self.mode
            .validate()
            .map_err(|e| TransferError::Config(e.to_string()))?;

        if self.chunk_size == 0 || self.chunk_size > MAX_PAYLOAD_SIZE {
            return Err(TransferError::Config(format!(
                "chunk_size must be between 1 and {}, got {}",
                MAX_PAYLOAD_SIZE, self.chunk_size
            )));
        }

        if self.retransmit_timeout.is_zero() {
            return Err(TransferError::Config(
                "retransmit_timeout must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
