//! Shared helpers for the workspace integration tests

use arq::{
    ArqMode, LossPolicy, MemoryChannel, ReceiverSession, SenderSession, TransferConfig,
    TransferReport,
};
use std::io::{self, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Retransmission period used by tests
pub const TEST_TIMEOUT: Duration = Duration::from_millis(20);

/// Receiver linger used by tests
pub const TEST_LINGER: Duration = Duration::from_millis(100);

/// Deterministic, non-repeating-looking test content
pub fn pattern_bytes(len: usize) -> Vec<u8> {
    (0..len)
        .map(|i| (i.wrapping_mul(31) ^ (i >> 7)) as u8)
        .collect()
}

/// Session configuration with short timers
pub fn fast_config(mode: ArqMode) -> TransferConfig {
    TransferConfig::default()
        .with_mode(mode)
        .with_retransmit_timeout(TEST_TIMEOUT)
        .with_linger(TEST_LINGER)
}

/// Sink that keeps every `write` call separately
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub chunks: Vec<Vec<u8>>,
    pub flushes: usize,
}

impl RecordingSink {
    /// All written bytes in order
    pub fn concat(&self) -> Vec<u8> {
        self.chunks.concat()
    }
}

impl Write for RecordingSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.chunks.push(buf.to_vec());
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flushes += 1;
        Ok(())
    }
}

/// Both sides of a finished transfer
#[derive(Debug)]
pub struct TransferOutcome {
    pub sink: RecordingSink,
    pub sender: TransferReport,
    pub receiver: TransferReport,
}

impl TransferOutcome {
    pub fn output(&self) -> Vec<u8> {
        self.sink.concat()
    }
}

/// Send `data` from `sender_end` to a receiver session on `receiver_end`
///
/// The receiver runs on its own thread, the sender on the caller's.
pub fn run_transfer<L>(
    data: &[u8],
    config: TransferConfig,
    sender_end: MemoryChannel,
    receiver_end: MemoryChannel,
    loss: L,
) -> TransferOutcome
where
    L: LossPolicy + 'static,
{
    let receiver = thread::spawn(move || {
        let mut sink = RecordingSink::default();
        let report = ReceiverSession::new(Arc::new(receiver_end), config)
            .with_loss_policy(loss)
            .receive(&mut sink)
            .expect("receiver failed");
        (sink, report)
    });

    let sender = SenderSession::new(Arc::new(sender_end), config)
        .send(data)
        .expect("sender failed");
    let (sink, receiver) = receiver.join().expect("receiver thread panicked");

    TransferOutcome {
        sink,
        sender,
        receiver,
    }
}

/// [`run_transfer`] over a fault-free in-memory link
pub fn run_memory_transfer<L>(data: &[u8], config: TransferConfig, loss: L) -> TransferOutcome
where
    L: LossPolicy + 'static,
{
    let (sender_end, receiver_end) = MemoryChannel::pair();
    run_transfer(data, config, sender_end, receiver_end, loss)
}
