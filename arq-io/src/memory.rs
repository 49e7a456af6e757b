//! In-process channel for tests and simulations
//!
//! [`MemoryChannel::pair`] returns two connected endpoints backed by crossbeam
//! queues. Each endpoint can carry a [`LinkFault`] hook that decides, per
//! outgoing datagram, whether it is delivered, dropped, corrupted or
//! duplicated, so lossy links can be reproduced deterministically.

use crate::channel::{Channel, ChannelError};
use bytes::Bytes;
use crossbeam::channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// What happens to one outgoing datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultAction {
    /// Deliver unchanged
    Deliver,
    /// Silently lose it
    Drop,
    /// Deliver with the lowest bit of the last byte flipped
    Corrupt,
    /// Deliver twice
    Duplicate,
}

/// Per-datagram fault injection hook
pub trait LinkFault: Send {
    /// Decide the fate of `datagram`
    fn on_send(&mut self, datagram: &[u8]) -> FaultAction;
}

impl<F> LinkFault for F
where
    F: FnMut(&[u8]) -> FaultAction + Send,
{
    fn on_send(&mut self, datagram: &[u8]) -> FaultAction {
        self(datagram)
    }
}

/// One endpoint of an in-memory datagram link
pub struct MemoryChannel {
    tx: Sender<Bytes>,
    rx: Receiver<Bytes>,
    local: SocketAddr,
    peer: SocketAddr,
    fault: Mutex<Option<Box<dyn LinkFault>>>,
    closed: AtomicBool,
    sent: AtomicU64,
}

impl MemoryChannel {
    /// Create two connected endpoints
    pub fn pair() -> (MemoryChannel, MemoryChannel) {
        let a_addr: SocketAddr = ([127, 0, 0, 1], 10_001).into();
        let b_addr: SocketAddr = ([127, 0, 0, 1], 10_002).into();
        let (a_tx, b_rx) = unbounded();
        let (b_tx, a_rx) = unbounded();

        (
            MemoryChannel::new(a_tx, a_rx, a_addr, b_addr),
            MemoryChannel::new(b_tx, b_rx, b_addr, a_addr),
        )
    }

    fn new(tx: Sender<Bytes>, rx: Receiver<Bytes>, local: SocketAddr, peer: SocketAddr) -> Self {
        MemoryChannel {
            tx,
            rx,
            local,
            peer,
            fault: Mutex::new(None),
            closed: AtomicBool::new(false),
            sent: AtomicU64::new(0),
        }
    }

    /// Apply `fault` to every datagram sent from this endpoint
    pub fn with_fault(self, fault: impl LinkFault + 'static) -> Self {
        *self.fault.lock() = Some(Box::new(fault));
        self
    }

    /// Address reported for this endpoint
    pub fn local_addr(&self) -> SocketAddr {
        self.local
    }

    /// Number of datagrams handed to [`Channel::send`] on this endpoint
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    fn deliver(&self, datagram: Bytes) {
        // A vanished peer behaves like an unreachable UDP host: the datagram
        // is lost without an error.
        if self.tx.send(datagram).is_err() {
            tracing::trace!("peer endpoint gone, datagram lost");
        }
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

            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(None);
                    }
                    (deadline - now).min(POLL_INTERVAL)
                }
                None => POLL_INTERVAL,
            };

            match self.rx.recv_timeout(wait) {
                Ok(datagram) => {
                    // Like UDP, an undersized buffer truncates the datagram
                    let n = datagram.len().min(buf.len());
                    buf[..n].copy_from_slice(&datagram[..n]);
                    return Ok(Some((n, self.peer)));
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Err(ChannelError::Closed),
            }
        }
    }
}

impl Channel for MemoryChannel {
    fn send(&self, datagram: &[u8]) -> Result<(), ChannelError> {
        if self.is_closed() {
            return Err(ChannelError::Closed);
        }
        self.sent.fetch_add(1, Ordering::Relaxed);

        let action = match self.fault.lock().as_mut() {
            Some(fault) => fault.on_send(datagram),
            None => FaultAction::Deliver,
        };

        match action {
            FaultAction::Deliver => self.deliver(Bytes::copy_from_slice(datagram)),
            FaultAction::Drop => tracing::trace!(len = datagram.len(), "link dropped datagram"),
            FaultAction::Corrupt => {
                let mut damaged = datagram.to_vec();
                if let Some(last) = damaged.last_mut() {
                    *last ^= 0x01;
                }
                self.deliver(Bytes::from(damaged));
            }
            FaultAction::Duplicate => {
                let datagram = Bytes::copy_from_slice(datagram);
                self.deliver(datagram.clone());
                self.deliver(datagram);
            }
        }
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
