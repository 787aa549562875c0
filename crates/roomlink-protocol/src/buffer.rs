//! A growable byte buffer with a read cursor and typed accessors.
//!
//! Every packet the client sends or receives passes through a
//! [`ByteBuffer`]. Writes always append at the end; reads start at the
//! cursor and move it forward. All multi-byte integers are big-endian
//! (network order), which is what the game server speaks.
//!
//! ```rust
//! use roomlink_protocol::ByteBuffer;
//!
//! let mut packet = ByteBuffer::new();
//! packet.write_u32(7).write_str("hello").unwrap().write_bool(true);
//!
//! let mut reader = ByteBuffer::from_vec(packet.into_vec());
//! assert_eq!(reader.read_u32().unwrap(), 7);
//! assert_eq!(reader.read_str().unwrap(), "hello");
//! assert!(reader.read_bool().unwrap());
//! ```

use crate::ProtocolError;

/// Sequential, resizable byte buffer.
///
/// The buffer knows nothing about identifiers or ciphers. It is the
/// lowest layer: bytes in, typed values out (and back).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    data: Vec<u8>,
    pos: usize,
}

impl ByteBuffer {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps existing bytes; the cursor starts at the beginning.
    pub fn from_vec(data: Vec<u8>) -> Self {
        Self { data, pos: 0 }
    }

    /// All bytes, including those already read.
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// The unread bytes after the cursor.
    pub fn remaining_slice(&self) -> &[u8] {
        &self.data[self.pos..]
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Total length of the buffer.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer holds no bytes at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current read position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Consumes the buffer and returns its bytes.
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    // -- writes ----------------------------------------------------------

    /// Appends one byte.
    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.data.push(value);
        self
    }

    /// Appends one byte, two's complement.
    pub fn write_i8(&mut self, value: i8) -> &mut Self {
        self.write_u8(value as u8)
    }

    /// Appends a big-endian u16. Identifiers, string lengths and
    /// platform sub-codes are all this width.
    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Appends a big-endian i16, as used for the client version and
    /// tribulle request codes.
    pub fn write_i16(&mut self, value: i16) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Appends a big-endian u32.
    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Appends a big-endian i32.
    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.data.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Writes one byte: 1 for `true`, 0 for `false`.
    pub fn write_bool(&mut self, value: bool) -> &mut Self {
        self.write_u8(u8::from(value))
    }

    /// Appends a raw run of bytes with no length prefix.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    /// Writes a u16 length prefix followed by the UTF-8 bytes.
    ///
    /// # Errors
    /// Returns [`ProtocolError::StringTooLong`] if the text is longer than
    /// 65535 bytes. Nothing is written in that case.
    pub fn write_str(&mut self, value: &str) -> Result<&mut Self, ProtocolError> {
        let len = u16::try_from(value.len())
            .map_err(|_| ProtocolError::StringTooLong(value.len()))?;
        self.write_u16(len);
        self.data.extend_from_slice(value.as_bytes());
        Ok(self)
    }

    // -- reads -----------------------------------------------------------

    /// Takes the next `n` bytes and advances the cursor.
    fn take(&mut self, n: usize) -> Result<&[u8], ProtocolError> {
        let remaining = self.remaining();
        if n > remaining {
            return Err(ProtocolError::UnexpectedEof {
                needed: n,
                remaining,
            });
        }
        let start = self.pos;
        self.pos += n;
        Ok(&self.data[start..self.pos])
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads one byte.
    ///
    /// # Errors
    /// [`ProtocolError::UnexpectedEof`] when the buffer is exhausted; the
    /// cursor does not move. Every `read_*` below behaves the same way.
    pub fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take_array::<1>()?[0])
    }

    /// Reads one byte as two's complement.
    pub fn read_i8(&mut self) -> Result<i8, ProtocolError> {
        Ok(self.read_u8()? as i8)
    }

    /// Reads a big-endian u16.
    pub fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        Ok(u16::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian i16.
    pub fn read_i16(&mut self) -> Result<i16, ProtocolError> {
        Ok(i16::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian u32. Pcodes, player ids and colours use this.
    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        Ok(u32::from_be_bytes(self.take_array()?))
    }

    /// Reads a big-endian i32.
    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        Ok(i32::from_be_bytes(self.take_array()?))
    }

    /// Reads one byte; any nonzero value is `true`.
    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads exactly `n` raw bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, ProtocolError> {
        Ok(self.take(n)?.to_vec())
    }

    /// Reads everything left after the cursor.
    pub fn read_remaining(&mut self) -> Vec<u8> {
        let rest = self.data[self.pos..].to_vec();
        self.pos = self.data.len();
        rest
    }

    /// Reads a u16-length-prefixed UTF-8 string.
    ///
    /// # Errors
    /// [`ProtocolError::UnexpectedEof`] if the prefix or the text is cut
    /// short, [`ProtocolError::InvalidUtf8`] if the bytes are not UTF-8.
    pub fn read_str(&mut self) -> Result<String, ProtocolError> {
        let len = self.read_u16()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| ProtocolError::InvalidUtf8)
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self::from_vec(data)
    }
}

impl From<&[u8]> for ByteBuffer {
    fn from(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }
}
