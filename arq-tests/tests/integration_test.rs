//! End-to-end integration tests
//!
//! Runs complete sender and receiver sessions against each other over
//! in-memory links (with and without injected faults) and over UDP loopback.

use arq::{
    ArqMode, DivisorLoss, EveryNth, NoLoss, ReceiverSession, SenderSession, UdpChannel,
    MAX_PAYLOAD_SIZE,
};
use arq_io::{FaultAction, MemoryChannel};
use arq_tests::{fast_config, pattern_bytes, run_memory_transfer, run_transfer, RecordingSink};
use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

fn gbn(window_size: usize) -> ArqMode {
    ArqMode::GoBackN { window_size }
}

#[test]
fn test_500_byte_file_delivers_five_chunks() {
    let data = pattern_bytes(500);
    let outcome = run_memory_transfer(&data, fast_config(gbn(10)), NoLoss);

    let sizes: Vec<usize> = outcome.sink.chunks.iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![124, 124, 124, 124, 4]);
    assert_eq!(outcome.output(), data);
    assert_eq!(outcome.receiver.frames, 5);
    assert_eq!(outcome.sender.frames, 5);
    assert_eq!(outcome.sink.flushes, 1);
}

#[test]
fn test_lossless_transfer_needs_no_retransmission() {
    let data = pattern_bytes(3000);
    let outcome = run_memory_transfer(&data, fast_config(gbn(8)), NoLoss);

    assert_eq!(outcome.output(), data);
    assert_eq!(outcome.receiver.dropped, 0);
    assert_eq!(outcome.receiver.discarded, 0);
}

#[test]
fn test_every_third_frame_dropped_stop_and_wait() {
    let data = pattern_bytes(2000);
    let outcome = run_memory_transfer(&data, fast_config(ArqMode::StopAndWait), EveryNth::new(3));

    assert_eq!(outcome.output(), data);
    assert!(outcome.receiver.dropped > 0);
    assert!(outcome.sender.retransmissions > 0);
}

#[test]
fn test_every_third_frame_dropped_go_back_n() {
    let data = pattern_bytes(2000);
    let outcome = run_memory_transfer(&data, fast_config(gbn(2)), EveryNth::new(3));

    assert_eq!(outcome.output(), data);
    assert!(outcome.receiver.dropped > 0);
}

#[test]
fn test_random_loss_large_window() {
    let data = pattern_bytes(5000);
    let outcome = run_memory_transfer(&data, fast_config(gbn(16)), DivisorLoss::with_seed(3, 7));

    assert_eq!(outcome.output(), data);
    assert!(outcome.receiver.dropped > 0);
    // Each chunk reaches the sink once, however often it was sent
    assert_eq!(outcome.sink.chunks.len() as u64, outcome.sender.frames);
}

#[test]
fn test_window_one_matches_stop_and_wait() {
    let data = pattern_bytes(1234);

    let windowed = run_memory_transfer(&data, fast_config(gbn(1)), NoLoss);
    let single = run_memory_transfer(&data, fast_config(ArqMode::StopAndWait), NoLoss);

    assert_eq!(windowed.output(), single.output());
    assert_eq!(windowed.sink.chunks, single.sink.chunks);
    assert_eq!(windowed.sender.frames, single.sender.frames);
    assert_eq!(windowed.output(), data);
}

#[test]
fn test_sequence_numbers_wrap() {
    // Well past 128 frames
    let data = pattern_bytes(MAX_PAYLOAD_SIZE * 300 + 17);
    let outcome = run_memory_transfer(&data, fast_config(gbn(7)), NoLoss);

    assert_eq!(outcome.output(), data);
    assert_eq!(outcome.receiver.frames, 301);
}

#[test]
fn test_sequence_wrap_under_loss() {
    let data = pattern_bytes(MAX_PAYLOAD_SIZE * 150);
    let outcome = run_memory_transfer(&data, fast_config(gbn(5)), DivisorLoss::with_seed(6, 99));

    assert_eq!(outcome.output(), data);
}

#[test]
fn test_exact_multiple_ends_with_empty_frame() {
    let data = pattern_bytes(MAX_PAYLOAD_SIZE * 3);
    let outcome = run_memory_transfer(&data, fast_config(gbn(4)), NoLoss);

    assert_eq!(outcome.output(), data);
    assert_eq!(outcome.sender.frames, 4);
    assert_eq!(outcome.receiver.frames, 4);
    // The empty final payload writes nothing
    assert_eq!(outcome.sink.chunks.len(), 3);
}

#[test]
fn test_empty_file() {
    let outcome = run_memory_transfer(&[], fast_config(ArqMode::StopAndWait), NoLoss);

    assert!(outcome.output().is_empty());
    assert_eq!(outcome.receiver.frames, 1);
}

#[test]
fn test_small_chunk_size() {
    let data = pattern_bytes(100);
    let config = fast_config(gbn(4)).with_chunk_size(16);
    let outcome = run_memory_transfer(&data, config, NoLoss);

    assert_eq!(outcome.output(), data);
    assert_eq!(outcome.sender.frames, 7);
}

#[test]
fn test_lost_acks_recovered() {
    let data = pattern_bytes(3000);
    let (sender_end, receiver_end) = MemoryChannel::pair();
    let mut acks = 0u32;
    let receiver_end = receiver_end.with_fault(move |_: &[u8]| {
        acks += 1;
        if acks % 4 == 0 {
            FaultAction::Drop
        } else {
            FaultAction::Deliver
        }
    });

    let outcome = run_transfer(&data, fast_config(gbn(4)), sender_end, receiver_end, NoLoss);
    assert_eq!(outcome.output(), data);
}

#[test]
fn test_corrupt_acks_discarded() {
    let data = pattern_bytes(1500);
    let (sender_end, receiver_end) = MemoryChannel::pair();
    let mut acks = 0u32;
    let receiver_end = receiver_end.with_fault(move |_: &[u8]| {
        acks += 1;
        if acks % 3 == 0 {
            FaultAction::Corrupt
        } else {
            FaultAction::Deliver
        }
    });

    let outcome = run_transfer(
        &data,
        fast_config(ArqMode::StopAndWait),
        sender_end,
        receiver_end,
        NoLoss,
    );
    assert_eq!(outcome.output(), data);
    assert!(outcome.sender.discarded > 0);
}

#[test]
fn test_duplicate_acks_ignored() {
    let data = pattern_bytes(2500);
    let (sender_end, receiver_end) = MemoryChannel::pair();
    let receiver_end = receiver_end.with_fault(|_: &[u8]| FaultAction::Duplicate);

    let outcome = run_transfer(&data, fast_config(gbn(6)), sender_end, receiver_end, NoLoss);
    assert_eq!(outcome.output(), data);
    assert!(outcome.sender.duplicates > 0);
}

#[test]
fn test_corrupt_and_duplicated_data_frames() {
    let data = pattern_bytes(2500);
    let (sender_end, receiver_end) = MemoryChannel::pair();
    let mut frames = 0u32;
    let sender_end = sender_end.with_fault(move |_: &[u8]| {
        frames += 1;
        match frames % 5 {
            0 => FaultAction::Corrupt,
            2 => FaultAction::Duplicate,
            _ => FaultAction::Deliver,
        }
    });

    let outcome = run_transfer(&data, fast_config(gbn(4)), sender_end, receiver_end, NoLoss);
    assert_eq!(outcome.output(), data);
    assert!(outcome.receiver.discarded > 0);
    assert!(outcome.receiver.duplicates > 0);
}

/// Two UDP channels on loopback pointed at each other
fn udp_pair() -> (UdpChannel, UdpChannel) {
    let any: SocketAddr = "127.0.0.1:0".parse().unwrap();
    let probe_a = UdpChannel::bind(any, any).unwrap();
    let probe_b = UdpChannel::bind(any, any).unwrap();
    let addr_a = probe_a.local_addr().unwrap();
    let addr_b = probe_b.local_addr().unwrap();
    drop(probe_a);
    drop(probe_b);

    (
        UdpChannel::bind(addr_a, addr_b).unwrap(),
        UdpChannel::bind(addr_b, addr_a).unwrap(),
    )
}

#[test]
fn test_udp_loopback_transfer() {
    let data = pattern_bytes(10_000);
    let (sender_end, receiver_end) = udp_pair();
    let config = fast_config(gbn(5));

    let receiver = thread::spawn(move || {
        let mut sink = RecordingSink::default();
        let report = ReceiverSession::new(Arc::new(receiver_end), config)
            .with_loss_policy(DivisorLoss::with_seed(4, 1))
            .receive(&mut sink)
            .unwrap();
        (sink, report)
    });

    let sent = SenderSession::new(Arc::new(sender_end), config)
        .send(&data[..])
        .unwrap();
    let (sink, received) = receiver.join().unwrap();

    assert_eq!(sink.concat(), data);
    assert_eq!(sent.bytes, 10_000);
    assert_eq!(received.bytes, 10_000);
}
