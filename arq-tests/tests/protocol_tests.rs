//! Integration tests for the protocol state machines
//!
//! Drives the send window and the receiver directly, without channels or
//! threads, through the exchanges a lossy link produces.

use arq_protocol::frame::{decode, encode};
use arq_protocol::{AckOutcome, ArqMode, ReceiveAction, Receiver, SendWindow, SeqNumber};
use bytes::Bytes;

fn seq(v: u8) -> SeqNumber {
    SeqNumber::new(v)
}

fn gbn(window_size: usize) -> ArqMode {
    ArqMode::GoBackN { window_size }
}

fn ack_seq(action: &ReceiveAction) -> Option<SeqNumber> {
    action.ack().map(|ack| decode(ack).unwrap().seq)
}

fn delivered(action: &ReceiveAction) -> Option<Bytes> {
    match action {
        ReceiveAction::Deliver { payload, .. } => Some(payload.clone()),
        _ => None,
    }
}

#[test]
fn test_go_back_n_in_order_despite_noise() {
    let mut rx = Receiver::new(gbn(4));
    let frames: Vec<Bytes> = (0..4u8)
        .map(|i| encode(seq(i), &[i; 3], i == 3).unwrap())
        .collect();

    let mut corrupt = frames[1].to_vec();
    corrupt[3] ^= 0x10;

    let arrivals: Vec<&[u8]> = vec![
        &frames[0][..],
        &frames[2][..], // ahead of time
        &frames[0][..], // duplicate
        &corrupt[..],
        &frames[1][..],
        &frames[1][..], // duplicate
        &frames[3][..], // ahead of time
        &frames[2][..],
        &frames[2][..], // duplicate
        &frames[3][..],
    ];

    let mut sink = Vec::new();
    for datagram in arrivals {
        if let Some(payload) = delivered(&rx.on_datagram(datagram)) {
            sink.push(payload);
        }
    }

    assert_eq!(
        sink,
        vec![
            Bytes::from(vec![0u8; 3]),
            Bytes::from(vec![1u8; 3]),
            Bytes::from(vec![2u8; 3]),
            Bytes::from(vec![3u8; 3]),
        ]
    );
    assert!(rx.is_complete());
    assert_eq!(rx.delivered(), 4);
}

#[test]
fn test_go_back_n_reacks_last_in_order() {
    let mut rx = Receiver::new(gbn(8));

    // Nothing delivered yet: the re-ack names the number before 0
    let early = rx.on_datagram(&encode(seq(3), b"x", false).unwrap());
    assert_eq!(ack_seq(&early), Some(seq(127)));

    rx.on_datagram(&encode(seq(0), b"a", false).unwrap());
    let gap = rx.on_datagram(&encode(seq(2), b"c", false).unwrap());
    assert!(matches!(gap, ReceiveAction::Reack { .. }));
    assert_eq!(ack_seq(&gap), Some(seq(0)));
}

#[test]
fn test_stop_and_wait_duplicate_is_reacked_not_delivered() {
    let mut rx = Receiver::new(ArqMode::StopAndWait);
    let first = encode(seq(0), b"one", false).unwrap();

    let action = rx.on_datagram(&first);
    assert_eq!(delivered(&action), Some(Bytes::from_static(b"one")));
    assert_eq!(ack_seq(&action), Some(seq(0)));

    let again = rx.on_datagram(&first);
    assert!(matches!(again, ReceiveAction::Reack { .. }));
    assert_eq!(ack_seq(&again), Some(seq(0)));

    let second = rx.on_datagram(&encode(seq(1), b"two", true).unwrap());
    assert_eq!(delivered(&second), Some(Bytes::from_static(b"two")));
    assert!(rx.is_complete());
}

#[test]
fn test_corrupt_frame_is_silent() {
    let mut rx = Receiver::new(ArqMode::StopAndWait);
    let action = rx.on_datagram(&[0x00]);
    assert!(matches!(action, ReceiveAction::Discard(_)));
    assert!(action.ack().is_none());
    assert_eq!(rx.delivered(), 0);
}

#[test]
fn test_complete_only_on_accepted_eot() {
    let mut rx = Receiver::new(gbn(4));
    // An out-of-order EOT frame must not end the transfer
    rx.on_datagram(&encode(seq(1), b"end", true).unwrap());
    assert!(!rx.is_complete());

    rx.on_datagram(&encode(seq(0), b"start", false).unwrap());
    assert!(!rx.is_complete());
    rx.on_datagram(&encode(seq(1), b"end", true).unwrap());
    assert!(rx.is_complete());

    // Retransmissions after completion are answered but not delivered
    let late = rx.on_datagram(&encode(seq(1), b"end", true).unwrap());
    assert!(matches!(late, ReceiveAction::Reack { .. }));
    assert_eq!(ack_seq(&late), Some(seq(1)));
    assert_eq!(rx.delivered(), 2);
}

#[test]
fn test_cumulative_ack_is_idempotent() {
    let mut window = SendWindow::new(gbn(5)).unwrap();
    for i in 0..5u8 {
        window.push(&[i], false).unwrap();
    }

    assert_eq!(window.on_ack(seq(2)), AckOutcome::Advanced { acked: 3 });
    assert_eq!(window.base(), seq(3));
    assert_eq!(window.on_ack(seq(2)), AckOutcome::Ignored);
    assert_eq!(window.on_ack(seq(2)), AckOutcome::Ignored);
    assert_eq!(window.base(), seq(3));
    assert_eq!(window.len(), 2);
}

#[test]
fn test_ack_for_unsent_frame_ignored() {
    let mut window = SendWindow::new(gbn(5)).unwrap();
    window.push(b"a", false).unwrap();
    window.push(b"b", false).unwrap();

    // In [base, base + size) but never transmitted
    assert_eq!(window.on_ack(seq(3)), AckOutcome::Ignored);
    assert_eq!(window.len(), 2);
}

#[test]
fn test_stop_and_wait_exact_match() {
    let mut window = SendWindow::new(ArqMode::StopAndWait).unwrap();
    window.push(b"a", false).unwrap();

    assert_eq!(window.on_ack(seq(1)), AckOutcome::Ignored);
    assert_eq!(window.on_ack(seq(0)), AckOutcome::Advanced { acked: 1 });

    window.push(b"b", false).unwrap();
    // Stale ack for the previous frame
    assert_eq!(window.on_ack(seq(0)), AckOutcome::Ignored);
    assert_eq!(window.on_ack(seq(1)), AckOutcome::Advanced { acked: 1 });
}

#[test]
fn test_window_and_receiver_lockstep_across_wrap() {
    let mut window = SendWindow::new(gbn(9)).unwrap();
    let mut rx = Receiver::new(gbn(9));
    let total = 400usize;
    let mut sent = 0usize;
    let mut output = Vec::new();

    while !window.is_complete() {
        let mut in_flight = Vec::new();
        while window.has_room() && !window.is_final_queued() {
            let last = sent + 1 == total;
            in_flight.push(window.push(&(sent as u32).to_be_bytes(), last).unwrap());
            sent += 1;
        }

        // Every other round, lose the first frame of the burst
        let skip = usize::from(sent % 2 == 0 && in_flight.len() > 1);
        for frame in &in_flight[skip..] {
            let action = rx.on_datagram(frame);
            if let Some(payload) = delivered(&action) {
                output.push(u32::from_be_bytes(payload[..].try_into().unwrap()));
            }
            if let Some(ack) = ack_seq(&action) {
                window.on_ack(ack);
            }
        }

        // Timeout: resend whatever is still outstanding
        let outstanding: Vec<Bytes> = window.outstanding().cloned().collect();
        for frame in outstanding {
            let action = rx.on_datagram(&frame);
            if let Some(payload) = delivered(&action) {
                output.push(u32::from_be_bytes(payload[..].try_into().unwrap()));
            }
            if let Some(ack) = ack_seq(&action) {
                window.on_ack(ack);
            }
        }
    }

    let expected: Vec<u32> = (0..total as u32).collect();
    assert_eq!(output, expected);
    assert!(rx.is_complete());
}
