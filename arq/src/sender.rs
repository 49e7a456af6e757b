//! Sending side of a transfer
//!
//! The session runs two activities against one [`SendWindow`]: the main loop,
//! which fills the window from the source and advances it on acks, and the
//! retransmission timer, which re-sends everything outstanding each time it
//! fires. The window sits behind a single mutex shared by exactly those two.
//! The main loop never calls into the timer while holding the window lock.

use crate::config::TransferConfig;
use crate::error::Result;
use crate::report::TransferReport;
use arq_io::{Channel, RetransmitTimer};
use arq_protocol::frame;
use arq_protocol::{AckOutcome, SendWindow, MAX_FRAME_SIZE};
use parking_lot::Mutex;
use std::io::{self, ErrorKind, Read};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Sends one byte stream to the peer of `channel`
pub struct SenderSession<C: Channel + 'static> {
    channel: Arc<C>,
    config: TransferConfig,
}

impl<C: Channel + 'static> SenderSession<C> {
    pub fn new(channel: Arc<C>, config: TransferConfig) -> Self {
        SenderSession { channel, config }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Transfer everything `reader` yields, returning once the final frame has
    /// been acknowledged
    ///
    /// The channel is closed when this returns, successfully or not.
    pub fn send<R: Read>(self, mut reader: R) -> Result<TransferReport> {
        let retransmissions = Arc::new(AtomicU64::new(0));
        let (window, mut timer) = match self.setup(&retransmissions) {
            Ok(parts) => parts,
            Err(e) => {
                self.channel.close();
                return Err(e);
            }
        };

        tracing::info!(
            mode = %self.config.mode,
            chunk_size = self.config.chunk_size,
            timeout_ms = self.config.retransmit_timeout.as_millis() as u64,
            "starting transfer"
        );

        let started = Instant::now();
        let mut report = TransferReport::default();
        let result = self.run(&mut reader, &window, &timer, &mut report);

        timer.shutdown();
        self.channel.close();

        result?;
        report.retransmissions = retransmissions.load(Ordering::Relaxed);
        report.duration = started.elapsed();

        tracing::info!(
            bytes = report.bytes,
            frames = report.frames,
            retransmissions = report.retransmissions,
            elapsed_ms = report.duration.as_millis() as u64,
            "transfer complete"
        );
        Ok(report)
    }

    fn setup(
        &self,
        retransmissions: &Arc<AtomicU64>,
    ) -> Result<(Arc<Mutex<SendWindow>>, RetransmitTimer)> {
        self.config.validate()?;
        let window = Arc::new(Mutex::new(SendWindow::new(self.config.mode)?));
        let timer = self.spawn_timer(&window, retransmissions)?;
        Ok((window, timer))
    }

    fn spawn_timer(
        &self,
        window: &Arc<Mutex<SendWindow>>,
        retransmissions: &Arc<AtomicU64>,
    ) -> io::Result<RetransmitTimer> {
        let window = Arc::clone(window);
        let channel = Arc::clone(&self.channel);
        let retransmissions = Arc::clone(retransmissions);

        RetransmitTimer::spawn(
            "arq-retransmit",
            self.config.retransmit_timeout,
            move || {
                let mut window = window.lock();
                if window.is_empty() {
                    return;
                }

                for frame in window.outstanding() {
                    if let Err(e) = channel.send(frame) {
                        tracing::warn!(error = %e, "retransmission failed");
                    }
                }
                let resent = window.mark_retransmitted();
                retransmissions.fetch_add(resent as u64, Ordering::Relaxed);

                tracing::debug!(
                    base = %window.base(),
                    resent,
                    attempts = window.max_send_count(),
                    "timeout, resent outstanding frames"
                );
            },
        )
    }

    fn run<R: Read>(
        &self,
        reader: &mut R,
        window: &Mutex<SendWindow>,
        timer: &RetransmitTimer,
        report: &mut TransferReport,
    ) -> Result<()> {
        let mut chunk = vec![0u8; self.config.chunk_size];
        // One spare byte so an oversized datagram is seen as such
        let mut buf = [0u8; MAX_FRAME_SIZE + 1];
        let mut input_done = false;

        loop {
            while !input_done && window.lock().has_room() {
                let n = read_chunk(reader, &mut chunk)?;
                let is_last = n < chunk.len();

                let frame = window.lock().push(&chunk[..n], is_last)?;
                self.channel.send(&frame)?;

                report.frames += 1;
                report.bytes += n as u64;
                input_done = is_last;

                if !timer.is_armed() {
                    timer.start();
                }
            }

            if window.lock().is_complete() {
                return Ok(());
            }

            let (n, from) = self.channel.recv(&mut buf)?;
            let ack = match frame::decode(&buf[..n]) {
                Ok(ack) => ack,
                Err(e) => {
                    tracing::debug!(%from, error = %e, "discarding corrupt ack");
                    report.discarded += 1;
                    continue;
                }
            };

            let outcome = window.lock().on_ack(ack.seq);
            match outcome {
                AckOutcome::Advanced { acked } => {
                    timer.cancel();
                    let pending = window.lock().len();
                    if pending > 0 {
                        timer.start();
                    }
                    tracing::debug!(ack = %ack.seq, acked, pending, "ack accepted");
                }
                AckOutcome::Ignored => {
                    tracing::debug!(ack = %ack.seq, "ignoring ack");
                    report.duplicates += 1;
                }
            }
        }
    }
}

/// Read until `buf` is full or the source is exhausted
fn read_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
