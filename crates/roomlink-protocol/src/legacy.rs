//! The legacy text sub-format.
//!
//! Some notices still travel in an older framing: a single length-prefixed
//! string, wrapped in a frame tagged [`Identifier::LEGACY`], whose fields
//! are joined by the control byte `0x01`. The first two characters of the
//! first field are not text at all; their code points (each at most
//! `0xFF`) are the two halves of a legacy sub-identifier.
//!
//! ```text
//! [u16 len]["\x08\x07" 0x01 "1234" 0x01 ...]
//!            └ id (8,7)      └ field 0
//! ```

use crate::{ByteBuffer, Identifier, ProtocolError};

/// Field separator inside a legacy frame.
pub const SEPARATOR: char = '\u{1}';

/// A decoded legacy frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyFrame {
    /// Legacy sub-identifier taken from the first two characters.
    pub id: Identifier,
    /// Remaining fields, in order.
    pub fields: Vec<String>,
}

impl LegacyFrame {
    /// Decodes the payload of a [`Identifier::LEGACY`] frame. The cursor
    /// must sit right after the outer identifier.
    pub fn decode(payload: &mut ByteBuffer) -> Result<Self, ProtocolError> {
        let text = payload.read_str()?;
        let mut parts = text.split(SEPARATOR);
        let mut head = parts.next().unwrap_or_default().chars();
        let (Some(major), Some(minor)) = (head.next(), head.next()) else {
            return Err(ProtocolError::MissingLegacyId);
        };
        let (Ok(major), Ok(minor)) = (u8::try_from(major), u8::try_from(minor)) else {
            return Err(ProtocolError::MissingLegacyId);
        };
        Ok(Self {
            id: Identifier::new(major, minor),
            fields: parts.map(str::to_owned).collect(),
        })
    }

    /// Encodes the frame payload (without the outer identifier).
    ///
    /// Each id half becomes one character with that code point, so halves
    /// of `0x80` and above take two UTF-8 bytes on the wire.
    pub fn encode(&self, out: &mut ByteBuffer) -> Result<(), ProtocolError> {
        let mut text = String::new();
        text.push(char::from(self.id.major()));
        text.push(char::from(self.id.minor()));
        for field in &self.fields {
            text.push(SEPARATOR);
            text.push_str(field);
        }
        out.write_str(&text)?;
        Ok(())
    }
}
