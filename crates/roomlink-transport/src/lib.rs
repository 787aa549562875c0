//! Transport layer for roomlink.
//!
//! Provides [`Channel`]: one TCP connection to a game server with its own
//! connect/close lifecycle, stream framing and per-connection fingerprint.
//! A session owns two of them (main and room-server); reconnecting one
//! never disturbs the other.
//!
//! Channels never call back into their owner. Everything that happens on
//! the socket is posted as a [`ChannelEvent`] to an mpsc queue, and the
//! owner processes those one at a time.

mod channel;
mod error;

pub use channel::{
    Channel, ChannelEvent, ChannelId, ChannelKind, ChannelState, CloseReason, EventSender,
};
pub use error::TransportError;
