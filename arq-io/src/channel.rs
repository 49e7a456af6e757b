//! Datagram channel abstraction
//!
//! A channel is a datagram endpoint already bound to one peer. The ARQ
//! sessions only need blocking send, blocking receive, and a way to unblock a
//! pending receive from another thread when the session shuts down.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Channel errors
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("Channel is closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid socket address")]
    InvalidAddress,
}

/// A bound, connectionless datagram endpoint
pub trait Channel: Send + Sync {
    /// Send one datagram to the peer
    fn send(&self, datagram: &[u8]) -> Result<(), ChannelError>;

    /// Block until a datagram arrives
    ///
    /// Returns the number of bytes written into `buf` and the sender's
    /// address. There is no timeout; a concurrent [`Channel::close`] makes the
    /// call return [`ChannelError::Closed`].
    fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), ChannelError>;

    /// Like [`Channel::recv`], but gives up after `timeout` and returns `None`
    fn recv_timeout(
        &self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<(usize, SocketAddr)>, ChannelError>;

    /// Close the channel, unblocking any pending receive
    ///
    /// Closing twice is harmless.
    fn close(&self);

    /// Whether [`Channel::close`] has been called
    fn is_closed(&self) -> bool;
}

impl<C: Channel + ?Sized> Channel for Arc<C> {
    fn send(&self, datagram: &[u8]) -> Result<(), ChannelError> {
        (**self).send(datagram)
    }

    fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), ChannelError> {
        (**self).recv(buf)
    }

    fn recv_timeout(
        &self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<(usize, SocketAddr)>, ChannelError> {
        (**self).recv_timeout(buf, timeout)
    }

    fn close(&self) {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}

impl<C: Channel + ?Sized> Channel for Box<C> {
    fn send(&self, datagram: &[u8]) -> Result<(), ChannelError> {
        (**self).send(datagram)
    }

    fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), ChannelError> {
        (**self).recv(buf)
    }

    fn recv_timeout(
        &self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<(usize, SocketAddr)>, ChannelError> {
        (**self).recv_timeout(buf, timeout)
    }

    fn close(&self) {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
