//! UDP channel
//!
//! A UDP socket bound to a local address and sending to one fixed peer.

use crate::channel::{Channel, ChannelError};
use socket2::{Domain, Protocol, Socket, Type};
use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// How long a blocking receive sleeps in the kernel before rechecking for
/// [`Channel::close`]
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Socket receive buffer requested at bind time
const RECV_BUFFER_SIZE: usize = 256 * 1024;

/// UDP channel to a single peer
pub struct UdpChannel {
    inner: UdpSocket,
    peer: SocketAddr,
    closed: AtomicBool,
}

impl UdpChannel {
    /// Bind to `local` and send to `peer`
    pub fn bind(local: SocketAddr, peer: SocketAddr) -> Result<Self, ChannelError> {
        let domain = if local.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };

        let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
        socket.set_reuse_address(true)?;
        if let Err(e) = socket.set_recv_buffer_size(RECV_BUFFER_SIZE) {
            tracing::debug!(error = %e, "could not enlarge receive buffer");
        }
        socket.bind(&local.into())?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;

        let inner: UdpSocket = socket.into();
        tracing::debug!(local = ?inner.local_addr().ok(), %peer, "udp channel bound");

        Ok(UdpChannel {
            inner,
            peer,
            closed: AtomicBool::new(false),
        })
    }

    /// Get the local address this channel is bound to
    pub fn local_addr(&self) -> Result<SocketAddr, ChannelError> {
        Ok(self.inner.local_addr()?)
    }

    /// Address datagrams are sent to
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn recv_until(
        &self,
        buf: &mut [u8],
        deadline: Option<Instant>,
    ) -> Result<Option<(usize, SocketAddr)>, ChannelError> {
        loop {
            if self.is_closed() {
                return Err(ChannelError::Closed);
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return Ok(None);
                }
            }

            match self.inner.recv_from(buf) {
                Ok((n, addr)) => return Ok(Some((n, addr))),
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    continue
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                // ICMP port unreachable from an earlier send surfaces here on
                // some platforms; the peer may simply not be up yet.
                Err(e) if e.kind() == ErrorKind::ConnectionReset => {
                    tracing::trace!("ignoring connection reset on udp receive");
                    continue;
                }
                Err(e) => return Err(ChannelError::Io(e)),
            }
        }
    }
}

impl Channel for UdpChannel {
    fn send(&self, datagram: &[u8]) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        self.inner.send_to(datagram, self.peer)?;
        Ok(())
    }

    fn recv(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), ChannelError> {
        match self.recv_until(buf, None)? {
            Some(received) => Ok(received),
            None => Err(ChannelError::Closed),
        }
    }

    fn recv_timeout(
        &self,
        buf: &mut [u8],
        timeout: Duration,
    ) -> Result<Option<(usize, SocketAddr)>, ChannelError> {
        self.recv_until(buf, Some(Instant::now() + timeout))
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
