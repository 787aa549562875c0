//! One framed TCP connection.
//!
//! A [`Channel`] is driven from a single owner (the client loop). Socket
//! work happens in spawned tasks that only move bytes:
//!
//! ```text
//!            ┌──────── connect task ────────┐
//! connect() ─┤ TcpStream::connect           │
//!            │   ├─ reader: bytes → frames ─┼─→ ChannelEvent (mpsc)
//!            │   └─ writer: queue → socket  │
//!            └──────────────────────────────┘
//! ```
//!
//! Every event carries the channel's [`ChannelId`]. A replaced channel
//! keeps its own generation, so the owner can tell its late events apart
//! from those of the new instance.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use roomlink_protocol::{encode_frame, CipherKeys, CipherMethod, FrameConfig, FrameDecoder, Identifier};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, watch};

use crate::TransportError;

/// Counter for channel generations, shared by all channels.
static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Fingerprints cycle through `0..FINGERPRINT_MODULUS`. A server-assigned
/// value may lie outside that range; it is used once, then wraps.
const FINGERPRINT_MODULUS: u16 = 100;

/// Socket read size.
const READ_CHUNK: usize = 8192;

/// Which of the two session connections this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    /// The gateway connection, open for the whole session.
    Main,
    /// The per-room server connection, replaced on every migration.
    RoomServer,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Main => f.write_str("main"),
            Self::RoomServer => f.write_str("room-server"),
        }
    }
}

/// Identifies one channel instance: its kind plus a unique generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId {
    pub kind: ChannelKind,
    pub generation: u64,
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.generation)
    }
}

/// Why a channel stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// [`Channel::close`] was called.
    Local,
    /// The server closed the socket.
    PeerClosed,
    /// Connect, read or framing failure.
    Failed(String),
}

/// Something that happened on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// The TCP connection is up.
    Connected(ChannelId),
    /// One complete inbound frame: `id u16 | payload`.
    Frame(ChannelId, Vec<u8>),
    /// The channel is gone. Posted exactly once per connect attempt.
    Closed(ChannelId, CloseReason),
}

impl ChannelEvent {
    pub fn channel(&self) -> ChannelId {
        match self {
            Self::Connected(id) | Self::Frame(id, _) | Self::Closed(id, _) => *id,
        }
    }
}

/// Sender half used by channels to report events to their owner.
pub type EventSender = mpsc::UnboundedSender<ChannelEvent>;

/// Lifecycle of a single channel instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    /// Created, `connect` not called yet.
    Idle,
    /// Connect in flight.
    Connecting,
    /// Connected; sends go out.
    Open,
    /// Closed locally or remotely. Terminal.
    Closed,
}

/// A framed TCP connection with an independent connect/close lifecycle.
pub struct Channel {
    id: ChannelId,
    host: String,
    port: u16,
    state: ChannelState,
    fingerprint: u8,
    config: FrameConfig,
    events: EventSender,
    writer: Option<mpsc::UnboundedSender<Vec<u8>>>,
    shutdown: Option<watch::Sender<bool>>,
}

impl Channel {
    /// Creates an idle channel that will report to `events`.
    pub fn new(kind: ChannelKind, events: EventSender, config: FrameConfig) -> Self {
        let generation = NEXT_GENERATION.fetch_add(1, Ordering::Relaxed);
        Self {
            id: ChannelId { kind, generation },
            host: String::new(),
            port: 0,
            state: ChannelState::Idle,
            fingerprint: 0,
            config,
            events,
            writer: None,
            shutdown: None,
        }
    }

    pub fn id(&self) -> ChannelId {
        self.id
    }

    pub fn kind(&self) -> ChannelKind {
        self.id.kind
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ChannelState::Open
    }

    /// Remote address as `host:port`, empty before `connect`.
    pub fn peer(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn fingerprint(&self) -> u8 {
        self.fingerprint
    }

    /// Replaces the fingerprint, as assigned by the server.
    ///
    /// Any byte is accepted. The next send uses it as-is and the one after
    /// continues from `(value + 1) % 100`.
    pub fn set_fingerprint(&mut self, value: u8) {
        self.fingerprint = value;
    }

    /// Starts connecting. Returns immediately; the outcome arrives as a
    /// [`ChannelEvent::Connected`] or [`ChannelEvent::Closed`].
    ///
    /// Only an idle channel can connect. Calling this twice is ignored,
    /// there is no implicit retry.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn connect(&mut self, host: &str, port: u16) {
        if self.state != ChannelState::Idle {
            tracing::debug!(channel = %self.id, state = ?self.state, "connect ignored");
            return;
        }
        self.host = host.to_string();
        self.port = port;
        self.state = ChannelState::Connecting;

        let (writer_tx, writer_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.writer = Some(writer_tx);
        self.shutdown = Some(shutdown_tx);

        tracing::info!(channel = %self.id, addr = %self.peer(), "connecting");
        tokio::spawn(run_channel(
            self.id,
            self.peer(),
            self.events.clone(),
            self.config.clone(),
            writer_rx,
            shutdown_rx,
        ));
    }

    /// Marks the channel open. The owner calls this when it processes the
    /// matching [`ChannelEvent::Connected`]; events for another generation
    /// are ignored.
    pub fn on_connected(&mut self, id: ChannelId) -> bool {
        if id != self.id || self.state != ChannelState::Connecting {
            return false;
        }
        self.state = ChannelState::Open;
        true
    }

    /// Marks the channel closed after the owner sees
    /// [`ChannelEvent::Closed`] for this generation.
    pub fn on_closed(&mut self, id: ChannelId) -> bool {
        if id != self.id {
            return false;
        }
        self.release();
        true
    }

    /// Ciphers, frames and queues one packet.
    ///
    /// A send on a channel that is not open does nothing and returns
    /// `Ok(())`. Check [`is_open`](Self::is_open) first if that matters.
    ///
    /// # Errors
    /// [`TransportError::Cipher`] when the key material cannot drive the
    /// requested cipher; nothing is written and the fingerprint is kept.
    pub fn send(
        &mut self,
        id: Identifier,
        payload: &[u8],
        method: CipherMethod,
        keys: &CipherKeys,
    ) -> Result<(), TransportError> {
        if !self.is_open() {
            tracing::trace!(channel = %self.id, %id, "send on closed channel dropped");
            return Ok(());
        }

        let fingerprint = self.fingerprint;
        let body = keys
            .encrypt(method, fingerprint, payload)
            .map_err(TransportError::Cipher)?;
        let frame = encode_frame(fingerprint, id, &body);
        self.fingerprint = ((u16::from(fingerprint) + 1) % FINGERPRINT_MODULUS) as u8;

        tracing::trace!(channel = %self.id, %id, ?method, len = frame.len(), "send");
        let delivered = self
            .writer
            .as_ref()
            .is_some_and(|writer| writer.send(frame).is_ok());
        if !delivered {
            // Writer task already gone; the Closed event is on its way.
            tracing::debug!(channel = %self.id, "writer gone, frame dropped");
        }
        Ok(())
    }

    /// Closes the channel. Idempotent.
    ///
    /// Reading stops at once. Frames already handed to [`send`](Self::send)
    /// are still flushed before the socket shuts down.
    pub fn close(&mut self) {
        match self.state {
            ChannelState::Closed => return,
            ChannelState::Idle => {}
            ChannelState::Connecting | ChannelState::Open => {
                tracing::info!(channel = %self.id, "closing");
            }
        }
        if let Some(shutdown) = &self.shutdown {
            let _ = shutdown.send(true);
        }
        self.release();
    }

    fn release(&mut self) {
        self.state = ChannelState::Closed;
        self.writer = None;
        self.shutdown = None;
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("id", &self.id)
            .field("peer", &self.peer())
            .field("state", &self.state)
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Socket tasks
// ---------------------------------------------------------------------------

async fn run_channel(
    id: ChannelId,
    addr: String,
    events: EventSender,
    config: FrameConfig,
    writer_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    let connected = tokio::select! {
        result = TcpStream::connect(addr.as_str()) => result,
        _ = shutdown_rx.changed() => {
            let _ = events.send(ChannelEvent::Closed(id, CloseReason::Local));
            return;
        }
    };

    let stream = match connected {
        Ok(stream) => stream,
        Err(source) => {
            let err = TransportError::ConnectFailed { addr, source };
            tracing::warn!(channel = %id, error = %err, "connect failed");
            let _ = events.send(ChannelEvent::Closed(id, CloseReason::Failed(err.to_string())));
            return;
        }
    };
    if let Err(e) = stream.set_nodelay(true) {
        tracing::debug!(channel = %id, error = %e, "set_nodelay failed");
    }

    tracing::info!(channel = %id, %addr, "connected");
    let (reader, writer) = stream.into_split();
    if events.send(ChannelEvent::Connected(id)).is_err() {
        return;
    }

    tokio::spawn(write_loop(id, writer, writer_rx));
    let reason = read_loop(id, reader, &events, config, &mut shutdown_rx).await;
    tracing::info!(channel = %id, ?reason, "channel closed");
    let _ = events.send(ChannelEvent::Closed(id, reason));
}

/// Reads until EOF, error, framing failure or local shutdown.
async fn read_loop(
    id: ChannelId,
    mut reader: OwnedReadHalf,
    events: &EventSender,
    config: FrameConfig,
    shutdown_rx: &mut watch::Receiver<bool>,
) -> CloseReason {
    let mut decoder = FrameDecoder::new(config);
    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        tokio::select! {
            result = reader.read(&mut buf) => {
                let n = match result {
                    Ok(0) => return CloseReason::PeerClosed,
                    Ok(n) => n,
                    Err(e) => {
                        let err = TransportError::ReceiveFailed(e);
                        tracing::warn!(channel = %id, error = %err, "read failed");
                        return CloseReason::Failed(err.to_string());
                    }
                };
                decoder.extend(&buf[..n]);
                loop {
                    match decoder.next_frame() {
                        Ok(Some(frame)) => {
                            if events.send(ChannelEvent::Frame(id, frame)).is_err() {
                                return CloseReason::Local;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            let err = TransportError::Framing(e);
                            tracing::warn!(channel = %id, error = %err, "bad frame stream");
                            return CloseReason::Failed(err.to_string());
                        }
                    }
                }
            }
            _ = shutdown_rx.changed() => return CloseReason::Local,
        }
    }
}

/// Drains the outbound queue into the socket. Ends when the owning
/// channel drops its sender, after everything queued was written.
async fn write_loop(
    id: ChannelId,
    mut writer: OwnedWriteHalf,
    mut queue: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    while let Some(frame) = queue.recv().await {
        if let Err(e) = writer.write_all(&frame).await {
            let err = TransportError::SendFailed(e);
            tracing::warn!(channel = %id, error = %err, "write failed");
            return;
        }
    }
    let _ = writer.shutdown().await;
    tracing::trace!(channel = %id, "writer finished");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idle(kind: ChannelKind) -> (Channel, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Channel::new(kind, tx, FrameConfig::default()), rx)
    }

    #[test]
    fn test_generations_are_unique() {
        let (a, _ra) = idle(ChannelKind::RoomServer);
        let (b, _rb) = idle(ChannelKind::RoomServer);
        assert_ne!(a.id(), b.id());
        assert!(b.id().generation > a.id().generation);
    }

    #[test]
    fn test_channel_id_display() {
        let id = ChannelId {
            kind: ChannelKind::RoomServer,
            generation: 4,
        };
        assert_eq!(id.to_string(), "room-server#4");
    }

    #[test]
    fn test_send_on_idle_channel_is_silent_noop() {
        let (mut ch, _rx) = idle(ChannelKind::Main);
        ch.send(Identifier::HEARTBEAT, &[], CipherMethod::None, &CipherKeys::default())
            .unwrap();
        // Nothing sent, so the fingerprint did not move.
        assert_eq!(ch.fingerprint(), 0);
    }

    #[test]
    fn test_close_is_idempotent() {
        let (mut ch, _rx) = idle(ChannelKind::Main);
        ch.close();
        ch.close();
        assert_eq!(ch.state(), ChannelState::Closed);
    }

    #[test]
    fn test_stale_events_are_ignored() {
        let (mut ch, _rx) = idle(ChannelKind::Main);
        let other = ChannelId {
            kind: ChannelKind::Main,
            generation: ch.id().generation + 1000,
        };
        assert!(!ch.on_connected(other));
        assert!(!ch.on_closed(other));
        assert_eq!(ch.state(), ChannelState::Idle);
    }
}
