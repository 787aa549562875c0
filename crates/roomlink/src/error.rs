//! Unified error type for roomlink.

use roomlink_protocol::ProtocolError;
use roomlink_session::SessionError;
use roomlink_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// Callers of the `roomlink` crate only ever see this type; `?` converts
/// the sub-crate errors through the `#[from]` impls.
#[derive(Debug, thiserror::Error)]
pub enum RoomlinkError {
    /// Connection, framing or outbound cipher failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A packet could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Bootstrap failed or returned unusable keys.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The client loop is gone; the command was not queued.
    #[error("client is closed")]
    ClientClosed,
}
