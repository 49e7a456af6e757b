//! Session errors

use arq_io::ChannelError;
use arq_protocol::WindowError;
use std::io;
use thiserror::Error;

/// Errors that end a transfer session
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Window error: {0}")]
    Window(#[from] WindowError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result alias for session operations
pub type Result<T> = std::result::Result<T, TransferError>;
