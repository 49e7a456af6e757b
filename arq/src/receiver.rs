//! Receiving side of a transfer
//!
//! Single-threaded: each datagram is validated, offered to the loss policy,
//! then to the delivery state machine, and the resulting ack is sent before
//! the next receive. After the final frame the session lingers briefly so a
//! sender whose last ack was lost still hears it again.

use crate::config::TransferConfig;
use crate::error::Result;
use crate::report::TransferReport;
use arq_io::{Channel, ChannelError};
use arq_protocol::frame;
use arq_protocol::{LossPolicy, NoLoss, ReceiveAction, Receiver, MAX_FRAME_SIZE};
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

/// Receives one byte stream from the peer of `channel`
pub struct ReceiverSession<C: Channel> {
    channel: Arc<C>,
    config: TransferConfig,
    loss: Box<dyn LossPolicy>,
}

impl<C: Channel> ReceiverSession<C> {
    pub fn new(channel: Arc<C>, config: TransferConfig) -> Self {
        ReceiverSession {
            channel,
            config,
            loss: Box::new(NoLoss),
        }
    }

    /// Drop valid frames as decided by `policy` (for exercising retransmission)
    pub fn with_loss_policy(mut self, policy: impl LossPolicy + 'static) -> Self {
        self.loss = Box::new(policy);
        self
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Write every delivered payload to `writer` until the end-of-transmission
    /// frame is accepted, then flush it
    ///
    /// The channel is closed when this returns, successfully or not.
    pub fn receive<W: Write>(mut self, mut writer: W) -> Result<TransferReport> {
        let mut report = TransferReport::default();
        let result = self.run(&mut writer, &mut report);
        self.channel.close();
        result?;
        Ok(report)
    }

    fn run<W: Write>(&mut self, writer: &mut W, report: &mut TransferReport) -> Result<()> {
        self.config.validate()?;

        let mut receiver = Receiver::new(self.config.mode);
        let mut buf = [0u8; MAX_FRAME_SIZE + 1];
        let mut started: Option<Instant> = None;

        tracing::info!(mode = %self.config.mode, "waiting for transfer");

        while !receiver.is_complete() {
            let (n, from) = self.channel.recv(&mut buf)?;
            let frame = match frame::decode(&buf[..n]) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::debug!(%from, error = %e, "discarding corrupt frame");
                    report.discarded += 1;
                    continue;
                }
            };
            started.get_or_insert_with(Instant::now);

            if self.loss.should_drop() {
                tracing::debug!(seq = %frame.seq, "simulated loss, dropping frame");
                report.dropped += 1;
                continue;
            }

            match receiver.on_frame(frame) {
                ReceiveAction::Deliver { payload, ack, .. } => {
                    writer.write_all(&payload)?;
                    report.bytes += payload.len() as u64;
                    report.frames += 1;
                    self.channel.send(&ack)?;
                }
                ReceiveAction::Reack { seq, ack } => {
                    tracing::debug!(%seq, "duplicate or out-of-order frame, re-acking");
                    report.duplicates += 1;
                    self.channel.send(&ack)?;
                }
                ReceiveAction::Discard(_) => report.discarded += 1,
            }
        }

        writer.flush()?;
        if let Some(started) = started {
            report.duration = started.elapsed();
        }

        tracing::info!(
            bytes = report.bytes,
            frames = report.frames,
            duplicates = report.duplicates,
            dropped = report.dropped,
            elapsed_ms = report.duration.as_millis() as u64,
            "transfer complete"
        );

        self.linger(&mut receiver, &mut buf, report)
    }

    /// Re-ack anything that arrives until the line has been quiet for the
    /// configured linger period
    fn linger(
        &self,
        receiver: &mut Receiver,
        buf: &mut [u8],
        report: &mut TransferReport,
    ) -> Result<()> {
        if self.config.linger.is_zero() {
            return Ok(());
        }

        loop {
            let n = match self.channel.recv_timeout(buf, self.config.linger) {
                Ok(Some((n, _))) => n,
                Ok(None) => break,
                // The sender hung up first; nothing left to answer
                Err(ChannelError::Closed) => break,
                Err(e) => return Err(e.into()),
            };
            if let ReceiveAction::Reack { seq, ack } = receiver.on_datagram(&buf[..n]) {
                tracing::debug!(%seq, "re-acking frame after completion");
                report.duplicates += 1;
                self.channel.send(&ack)?;
            }
        }
        Ok(())
    }
}
