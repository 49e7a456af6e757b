//! Transfer statistics

use std::time::Duration;

/// Counters collected by one side of a finished transfer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// Payload bytes sent or delivered
    pub bytes: u64,
    /// Distinct data frames sent or delivered
    pub frames: u64,
    /// Frames sent again by the retransmission timer (sender only)
    pub retransmissions: u64,
    /// Ignored acks on the sender, re-acked frames on the receiver
    pub duplicates: u64,
    /// Datagrams that failed validation
    pub discarded: u64,
    /// Valid frames thrown away by the loss policy (receiver only)
    pub dropped: u64,
    /// Time from the first frame to completion
    pub duration: Duration,
}

impl TransferReport {
    /// Payload throughput in bytes per second
    pub fn throughput(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.bytes as f64 / secs
        } else {
            0.0
        }
    }
}
