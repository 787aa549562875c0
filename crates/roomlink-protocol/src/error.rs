//! Error types for the protocol layer.
//!
//! Each crate in roomlink defines its own error enum. A `ProtocolError`
//! always means the bytes themselves were wrong (short, malformed, or
//! undecryptable), never that a socket failed.

/// Errors that can occur while encoding, decoding, framing or ciphering.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A read asked for more bytes than the buffer has left.
    ///
    /// This is the "short frame" case: the frame is dropped, the session
    /// carries on.
    #[error("unexpected end of buffer: needed {needed} bytes, {remaining} left")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// A length-prefixed string was not valid UTF-8.
    #[error("invalid utf-8 in string field")]
    InvalidUtf8,

    /// A string is too long for its 16-bit length prefix.
    #[error("string of {0} bytes does not fit a u16 length prefix")]
    StringTooLong(usize),

    /// A script upload is too long for its 24-bit length prefix.
    #[error("script of {0} bytes does not fit a 24-bit length prefix")]
    ScriptTooLong(usize),

    /// The stream length prefix is malformed (more than five 7-bit groups).
    #[error("malformed frame length prefix")]
    BadLengthPrefix,

    /// A frame exceeds the configured maximum size.
    #[error("frame of {size} bytes exceeds maximum {max}")]
    FrameTooLarge { size: usize, max: usize },

    /// A legacy text frame did not start with two characters of code
    /// point `0xFF` or below.
    #[error("legacy frame has no sub-identifier")]
    MissingLegacyId,

    /// The cipher cannot run with the key material it was given.
    #[error("cipher key error: {0}")]
    InvalidKey(String),

    /// The ciphertext does not have the shape the cipher produces.
    #[error("malformed ciphertext: {0}")]
    BadCiphertext(String),
}
