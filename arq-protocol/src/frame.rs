//! ARQ Frame Structure and Serialization
//!
//! Every datagram exchanged by the ARQ engine is a frame with a 2-byte header
//! followed by an optional payload:
//!
//! ```text
//!  0       1       2 ...
//! +-+-----+-------+------------------+
//! |E| seq | csum  | payload (0..124) |
//! +-+-----+-------+------------------+
//! ```
//!
//! Byte 0 holds the 7-bit sequence number with the end-of-transmission flag in
//! bit 7. Byte 1 is an 8-bit one's-complement checksum over the whole frame
//! (computed with the checksum byte zeroed). Acknowledgments use the same
//! layout with an empty payload.

use crate::sequence::SeqNumber;
use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Size of the frame header in bytes (sequence byte + checksum byte)
pub const HEADER_SIZE: usize = 2;

/// Maximum payload carried by one frame
pub const MAX_PAYLOAD_SIZE: usize = 124;

/// Largest valid frame on the wire
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE;

/// End-of-transmission flag (bit 7 of the sequence byte)
pub const EOT_FLAG: u8 = 0x80;

/// Mask for the sequence number (bits 0-6)
pub const SEQ_MASK: u8 = 0x7F;

/// Offset of the checksum byte within the header
const CHECKSUM_OFFSET: usize = 1;

/// One's complement of the 8-bit wrapping sum of `bytes`
///
/// This is a cheap integrity check, not a cryptographic one: it catches any
/// single corrupted byte but can miss compensating multi-byte errors and
/// reordering.
#[inline]
pub fn checksum(bytes: &[u8]) -> u8 {
    !bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Checksum of a serialized frame, treating its checksum byte as zero
fn frame_checksum(frame: &[u8]) -> u8 {
    let sum = frame
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != CHECKSUM_OFFSET)
        .fold(0u8, |acc, (_, &b)| acc.wrapping_add(b));
    !sum
}

/// Decoded frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Sequence number (data) or acknowledged sequence number (ack)
    pub seq: SeqNumber,
    /// Set on the final data frame of a transfer
    pub end_of_transmission: bool,
    /// Payload bytes
    pub payload: Bytes,
}

impl Frame {
    /// Create a data frame
    pub fn data(seq: SeqNumber, payload: Bytes, end_of_transmission: bool) -> Self {
        Frame {
            seq,
            end_of_transmission,
            payload,
        }
    }

    /// Create an acknowledgment frame
    pub fn ack(seq: SeqNumber) -> Self {
        Frame {
            seq,
            end_of_transmission: false,
            payload: Bytes::new(),
        }
    }

    /// Total size of the frame on the wire
    pub fn size(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Serialize the frame, filling in the checksum
    pub fn to_bytes(&self) -> Result<Bytes, FrameError> {
        encode(self.seq, &self.payload, self.end_of_transmission)
    }

    /// Parse and verify a frame
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        decode(bytes)
    }
}

/// Build a frame on the wire
///
/// Packs the sequence number and end flag into byte 0, zeroes byte 1, computes
/// the checksum over the full buffer and stores it in byte 1.
pub fn encode(seq: SeqNumber, payload: &[u8], is_last: bool) -> Result<Bytes, FrameError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD_SIZE,
        });
    }

    let mut header = seq.as_raw() & SEQ_MASK;
    if is_last {
        header |= EOT_FLAG;
    }

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
    buf.put_u8(header);
    buf.put_u8(0);
    buf.put_slice(payload);

    buf[CHECKSUM_OFFSET] = checksum(&buf);
    Ok(buf.freeze())
}

/// Build an acknowledgment frame for `seq`
pub fn encode_ack(seq: SeqNumber) -> Bytes {
    let header = seq.as_raw() & SEQ_MASK;
    let mut buf = BytesMut::with_capacity(HEADER_SIZE);
    buf.put_u8(header);
    buf.put_u8(checksum(&[header, 0]));
    buf.freeze()
}

/// Parse a frame, rejecting truncated, oversized or corrupted datagrams
pub fn decode(bytes: &[u8]) -> Result<Frame, FrameError> {
    if bytes.len() < HEADER_SIZE {
        return Err(FrameError::Truncated {
            expected: HEADER_SIZE,
            actual: bytes.len(),
        });
    }

    if bytes.len() > MAX_FRAME_SIZE {
        return Err(FrameError::Oversized {
            size: bytes.len(),
            max: MAX_FRAME_SIZE,
        });
    }

    let stored = bytes[CHECKSUM_OFFSET];
    let computed = frame_checksum(bytes);
    if stored != computed {
        return Err(FrameError::ChecksumMismatch { stored, computed });
    }

    let header = bytes[0];
    Ok(Frame {
        seq: SeqNumber::new_unchecked(header & SEQ_MASK),
        end_of_transmission: header & EOT_FLAG != 0,
        payload: Bytes::copy_from_slice(&bytes[HEADER_SIZE..]),
    })
}

/// Frame building and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Truncated frame: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Oversized frame: {size} bytes (max {max})")]
    Oversized { size: usize, max: usize },

    #[error("Checksum mismatch: stored {stored:#04x}, computed {computed:#04x}")]
    ChecksumMismatch { stored: u8, computed: u8 },

    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

impl FrameError {
    /// Whether this error describes a damaged datagram (as opposed to a
    /// caller asking to build an invalid frame)
    pub fn is_corrupt(&self) -> bool {
        !matches!(self, FrameError::PayloadTooLarge { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_complemented_sum() {
        assert_eq!(checksum(&[]), 0xFF);
        assert_eq!(checksum(&[1, 2, 3]), !6u8);
        assert_eq!(checksum(&[0xFF, 0x02]), !0x01u8);
    }

    #[test]
    fn test_encode_layout() {
        let bytes = encode(SeqNumber::new(5), b"abc", false).unwrap();
        assert_eq!(bytes.len(), 5);
        assert_eq!(bytes[0], 5);
        assert_eq!(&bytes[2..], b"abc");

        let mut zeroed = bytes.to_vec();
        zeroed[1] = 0;
        assert_eq!(bytes[1], checksum(&zeroed));
    }

    #[test]
    fn test_encode_sets_eot_bit() {
        let bytes = encode(SeqNumber::new(127), b"", true).unwrap();
        assert_eq!(bytes[0], 0xFF);

        let frame = decode(&bytes).unwrap();
        assert_eq!(frame.seq, SeqNumber::new(127));
        assert!(frame.end_of_transmission);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_data_frame_roundtrip() {
        let payload = Bytes::from(vec![0xAB; MAX_PAYLOAD_SIZE]);
        let frame = Frame::data(SeqNumber::new(64), payload.clone(), false);
        let decoded = Frame::from_bytes(&frame.to_bytes().unwrap()).unwrap();

        assert_eq!(decoded, frame);
        assert_eq!(decoded.size(), MAX_FRAME_SIZE);
    }

    #[test]
    fn test_ack_frame() {
        let bytes = encode_ack(SeqNumber::new(42));
        assert_eq!(bytes.len(), HEADER_SIZE);

        let frame = decode(&bytes).unwrap();
        assert_eq!(frame, Frame::ack(SeqNumber::new(42)));
        assert_eq!(bytes, Frame::ack(SeqNumber::new(42)).to_bytes().unwrap());
    }

    #[test]
    fn test_payload_too_large() {
        let err = encode(SeqNumber::new(0), &[0u8; MAX_PAYLOAD_SIZE + 1], false).unwrap_err();
        assert!(matches!(err, FrameError::PayloadTooLarge { .. }));
        assert!(!err.is_corrupt());
    }

    #[test]
    fn test_truncated() {
        assert!(matches!(
            decode(&[]),
            Err(FrameError::Truncated { actual: 0, .. })
        ));
        assert!(matches!(
            decode(&[0x01]),
            Err(FrameError::Truncated { actual: 1, .. })
        ));
    }

    #[test]
    fn test_oversized() {
        let err = decode(&[0u8; MAX_FRAME_SIZE + 1]).unwrap_err();
        assert!(matches!(err, FrameError::Oversized { .. }));
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_corrupted_payload_detected() {
        let mut bytes = encode(SeqNumber::new(3), b"hello", false).unwrap().to_vec();
        bytes[4] ^= 0x10;
        assert!(matches!(
            decode(&bytes),
            Err(FrameError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_corrupted_header_detected() {
        let mut bytes = encode(SeqNumber::new(3), b"hello", false).unwrap().to_vec();
        bytes[0] ^= EOT_FLAG;
        assert!(decode(&bytes).is_err());
    }

    #[test]
    fn test_corrupted_checksum_detected() {
        let mut bytes = encode_ack(SeqNumber::new(9)).to_vec();
        bytes[1] = bytes[1].wrapping_add(1);
        assert!(decode(&bytes).is_err());
    }
}
