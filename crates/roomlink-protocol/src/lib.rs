//! Wire protocol for roomlink.
//!
//! This crate knows how bytes look on the wire and nothing else:
//!
//! - **Codec** ([`ByteBuffer`]): typed big-endian reads and writes.
//! - **Framing** ([`FrameDecoder`], [`encode_frame`]): the varint length
//!   prefix and per-connection fingerprint byte.
//! - **Identifiers** ([`Identifier`]): the 16-bit message tags.
//! - **Legacy frames** ([`LegacyFrame`]): the older delimiter-joined text
//!   format that still carries a few notices.
//! - **Ciphers** ([`CipherKeys`], [`CipherMethod`]): xor and XXTEA payload
//!   transforms.
//!
//! # Architecture
//!
//! ```text
//! Transport (socket bytes) → Protocol (frames, fields) → Client (events)
//! ```
//!
//! Nothing in here touches a socket, a timer or session state, so all of
//! it is testable with plain byte vectors.

mod buffer;
pub mod cipher;
mod error;
pub mod frame;
mod identifier;
pub mod legacy;

pub use buffer::ByteBuffer;
pub use cipher::{CipherKeys, CipherMethod};
pub use error::ProtocolError;
pub use frame::{encode_frame, encode_server_frame, FrameConfig, FrameDecoder};
pub use identifier::{legacy_ids, platform_codes, Identifier};
pub use legacy::LegacyFrame;
