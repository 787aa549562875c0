//! Stream framing for the TCP byte stream.
//!
//! Frames are length-prefixed with a little-endian base-128 varint (7 bits
//! per byte, high bit = "more bytes follow"):
//!
//! ```text
//! client → server:  varint(len) | fingerprint u8 | id u16 | payload
//! server → client:  varint(len) | id u16 | payload
//! ```
//!
//! `len` covers `id + payload` only. The outbound fingerprint byte sits
//! between the prefix and the identifier and is not counted.

use crate::{Identifier, ProtocolError};

/// Longest accepted length prefix, in bytes (5 × 7 = 35 bits).
const MAX_PREFIX_BYTES: usize = 5;

/// Configuration for the framing layer.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum allowed frame size in bytes. Default: 1 MiB.
    pub max_frame_size: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_frame_size: 1_048_576,
        }
    }
}

/// Appends `value` as a base-128 varint.
pub fn write_varint(out: &mut Vec<u8>, mut value: usize) {
    while value >= 0x80 {
        out.push((value as u8 & 0x7F) | 0x80);
        value >>= 7;
    }
    out.push(value as u8);
}

/// Builds a complete outbound frame ready for the socket.
///
/// `payload` must already be ciphered if the packet requires it.
pub fn encode_frame(fingerprint: u8, id: Identifier, payload: &[u8]) -> Vec<u8> {
    let body_len = 2 + payload.len();
    let mut out = Vec::with_capacity(body_len + MAX_PREFIX_BYTES + 1);
    write_varint(&mut out, body_len);
    out.push(fingerprint);
    out.extend_from_slice(&id.into_inner().to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Builds an inbound-shaped frame (no fingerprint byte). Used by tests and
/// by anything that needs to play the server's side of the stream.
pub fn encode_server_frame(id: Identifier, payload: &[u8]) -> Vec<u8> {
    let body_len = 2 + payload.len();
    let mut out = Vec::with_capacity(body_len + MAX_PREFIX_BYTES);
    write_varint(&mut out, body_len);
    out.extend_from_slice(&id.into_inner().to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Reassembles inbound frames from arbitrarily split chunks.
///
/// Feed bytes with [`extend`](Self::extend), then drain complete frames
/// with [`next_frame`](Self::next_frame) until it returns `Ok(None)`.
/// Each yielded frame is `id u16 | payload`.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    config: FrameConfig,
}

impl FrameDecoder {
    pub fn new(config: FrameConfig) -> Self {
        Self {
            buf: Vec::new(),
            config,
        }
    }

    /// Appends freshly read bytes.
    pub fn extend(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
    }

    /// Bytes buffered but not yet returned as a frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pops the next complete frame, if one is buffered.
    ///
    /// # Errors
    /// A malformed or oversized length prefix is unrecoverable for the
    /// stream (we no longer know where the next frame starts), so the
    /// caller should close the connection.
    pub fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProtocolError> {
        let mut len: usize = 0;
        let mut prefix = 0;
        loop {
            if prefix == MAX_PREFIX_BYTES {
                return Err(ProtocolError::BadLengthPrefix);
            }
            let Some(&byte) = self.buf.get(prefix) else {
                return Ok(None);
            };
            len |= ((byte & 0x7F) as usize) << (7 * prefix);
            prefix += 1;
            if byte & 0x80 == 0 {
                break;
            }
        }

        if len > self.config.max_frame_size {
            return Err(ProtocolError::FrameTooLarge {
                size: len,
                max: self.config.max_frame_size,
            });
        }
        if self.buf.len() < prefix + len {
            return Ok(None);
        }

        let frame = self.buf[prefix..prefix + len].to_vec();
        self.buf.drain(..prefix + len);
        Ok(Some(frame))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_small_and_large() {
        let mut out = Vec::new();
        write_varint(&mut out, 5);
        assert_eq!(out, vec![5]);

        let mut out = Vec::new();
        write_varint(&mut out, 300);
        // 300 = 0b1_0010_1100 → 0xAC 0x02
        assert_eq!(out, vec![0xAC, 0x02]);
    }

    #[test]
    fn test_encode_frame_layout() {
        let frame = encode_frame(7, Identifier::new(26, 26), &[]);
        assert_eq!(frame, vec![2, 7, 26, 26]);

        let frame = encode_frame(0, Identifier::new(6, 6), &[1, 2, 3]);
        assert_eq!(frame, vec![5, 0, 6, 6, 1, 2, 3]);
    }

    #[test]
    fn test_decoder_yields_frames_split_across_chunks() {
        let mut wire = encode_server_frame(Identifier::new(26, 3), &[9; 200]);
        wire.extend(encode_server_frame(Identifier::new(44, 22), &[4]));

        let mut dec = FrameDecoder::default();
        let mut frames = Vec::new();
        for chunk in wire.chunks(7) {
            dec.extend(chunk);
            while let Some(f) = dec.next_frame().unwrap() {
                frames.push(f);
            }
        }

        assert_eq!(frames.len(), 2);
        assert_eq!(&frames[0][..2], &[26, 3]);
        assert_eq!(frames[0].len(), 202);
        assert_eq!(frames[1], vec![44, 22, 4]);
        assert_eq!(dec.buffered(), 0);
    }

    #[test]
    fn test_decoder_waits_for_incomplete_prefix() {
        let mut dec = FrameDecoder::default();
        dec.extend(&[0x80]);
        assert_eq!(dec.next_frame().unwrap(), None);
        dec.extend(&[0x01]);
        // Prefix complete (128) but body missing.
        assert_eq!(dec.next_frame().unwrap(), None);
    }

    #[test]
    fn test_decoder_rejects_runaway_prefix() {
        let mut dec = FrameDecoder::default();
        dec.extend(&[0xFF; 6]);
        assert_eq!(dec.next_frame(), Err(ProtocolError::BadLengthPrefix));
    }

    #[test]
    fn test_decoder_rejects_oversized_frame() {
        let mut dec = FrameDecoder::new(FrameConfig { max_frame_size: 16 });
        let mut wire = Vec::new();
        write_varint(&mut wire, 17);
        dec.extend(&wire);
        assert_eq!(
            dec.next_frame(),
            Err(ProtocolError::FrameTooLarge { size: 17, max: 16 })
        );
    }
}
