use roomlink_protocol::ProtocolError;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The TCP connect did not succeed.
    #[error("connect to {addr} failed: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Writing to the socket failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Reading from the socket failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The inbound byte stream could not be split into frames.
    #[error("framing error: {0}")]
    Framing(#[source] ProtocolError),

    /// The outbound payload could not be ciphered.
    #[error("cipher error: {0}")]
    Cipher(#[source] ProtocolError),

    /// The peer closed the connection.
    #[error("connection closed by peer")]
    PeerClosed,

    /// The channel was closed locally.
    #[error("channel shut down")]
    Shutdown,
}
