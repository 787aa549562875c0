//! The client runtime.
//!
//! A [`Client`] owns the session, both connections and the heartbeat, and
//! processes one thing at a time from a single `tokio::select!`:
//!
//! ```text
//!   channel events (both connections) ─┐
//!   handle commands ───────────────────┼─→ Client::run ─→ listeners
//!   heartbeat beats ───────────────────┘
//! ```
//!
//! Nothing is shared with other tasks, so nothing is locked.

use roomlink_heartbeat::{next_beat, Heartbeat};
use roomlink_protocol::{CipherMethod, Identifier};
use roomlink_session::{password_digest, Bootstrap, Session, SessionKeys, SessionPhase};
use roomlink_transport::{Channel, ChannelEvent, ChannelKind, TransportError};
use tokio::sync::mpsc;

use crate::dispatch::{handle_frame, Action};
use crate::events::{ClientEvent, EventBus, EventKind, ListenerId};
use crate::handle::Command;
use crate::{packets, ClientBuilder, ClientConfig, ClientHandle, RoomlinkError};

/// A game client: one session over a main and a room-server connection.
///
/// # Example
///
/// ```rust,no_run
/// use roomlink::prelude::*;
///
/// # async fn demo() -> Result<(), RoomlinkError> {
/// let mut client = Client::builder().build();
/// client.on(EventKind::LoginReady, |_, handle| {
///     let _ = handle.login("Bot#0000", "secret", "1");
/// });
/// client.on(EventKind::RoomMessage, |event, handle| {
///     if let ClientEvent::RoomMessage(msg) = event {
///         let _ = msg.reply(handle, "hello");
///     }
/// });
///
/// let bootstrap = StaticBootstrap::from_json(&std::fs::read_to_string("keys.json").unwrap())?;
/// client.start(&bootstrap, "id", "token").await?;
/// client.run().await;
/// # Ok(())
/// # }
/// ```
pub struct Client {
    config: ClientConfig,
    session: Session,
    main: Channel,
    room_server: Channel,
    /// Auth packet for the room-server connection currently connecting.
    pending_room_auth: Option<Vec<u8>>,
    heartbeat: Option<Heartbeat>,
    bus: EventBus,
    handle: ClientHandle,
    commands: mpsc::UnboundedReceiver<Command>,
    channel_tx: mpsc::UnboundedSender<ChannelEvent>,
    channel_rx: mpsc::UnboundedReceiver<ChannelEvent>,
}

impl Client {
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn new(config: ClientConfig) -> Self {
        let (channel_tx, channel_rx) = mpsc::unbounded_channel();
        let (handle, commands) = ClientHandle::channel();
        Self {
            main: Channel::new(ChannelKind::Main, channel_tx.clone(), config.frame.clone()),
            room_server: Channel::new(
                ChannelKind::RoomServer,
                channel_tx.clone(),
                config.frame.clone(),
            ),
            config,
            session: Session::default(),
            pending_room_auth: None,
            heartbeat: None,
            bus: EventBus::new(),
            handle,
            commands,
            channel_tx,
            channel_rx,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// A handle for queuing commands from outside the loop.
    pub fn handle(&self) -> ClientHandle {
        self.handle.clone()
    }

    /// Registers a listener. See [`EventBus::on`].
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&ClientEvent, &ClientHandle) + Send + 'static,
    {
        self.bus.on(kind, listener)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.bus.off(id)
    }

    /// Fetches session keys and opens the main connection.
    ///
    /// # Errors
    /// Any bootstrap failure. The main connection is not opened then.
    pub async fn start<B: Bootstrap>(
        &mut self,
        bootstrap: &B,
        id: &str,
        token: &str,
    ) -> Result<(), RoomlinkError> {
        let keys = bootstrap.fetch_keys(id, token).await?.into_keys()?;
        self.connect(keys)
    }

    /// Opens the main connection with keys obtained elsewhere.
    pub fn connect(&mut self, keys: SessionKeys) -> Result<(), RoomlinkError> {
        if self.session.is_ended() {
            return Err(RoomlinkError::ClientClosed);
        }
        let port = keys
            .primary_port()
            .ok_or_else(|| roomlink_session::SessionError::InvalidKeys("no ports".into()))?;
        let host = keys.host.clone();
        self.session.keys = keys;
        self.session.advance(SessionPhase::Connecting);
        tracing::info!(%host, port, version = self.session.keys.version, "starting session");
        self.main.connect(&host, port);
        Ok(())
    }

    /// Runs the client loop until [`disconnect`](Self::disconnect).
    pub async fn run(mut self) {
        while !self.session.is_ended() {
            tokio::select! {
                Some(event) = self.channel_rx.recv() => self.on_channel_event(event),
                Some(command) = self.commands.recv() => self.on_command(command),
                beat = next_beat(&mut self.heartbeat) => {
                    tracing::trace!(beat = beat.beat, "keep-alive");
                    self.send_heartbeat();
                }
            }
        }
        tracing::info!("client loop finished");
    }

    /// Stops the heartbeat, closes both connections and emits
    /// [`ClientEvent::Disconnect`]. Idempotent.
    pub fn disconnect(&mut self) {
        if self.session.is_ended() {
            return;
        }
        tracing::info!(nickname = %self.session.nickname, "disconnecting");
        self.heartbeat = None;
        self.pending_room_auth = None;
        self.main.close();
        self.room_server.close();
        self.session.advance(SessionPhase::Disconnected);
        self.emit(ClientEvent::Disconnect);
    }

    // -----------------------------------------------------------------------
    // Channel events
    // -----------------------------------------------------------------------

    fn on_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected(id) => {
                if self.main.on_connected(id) {
                    self.session.advance(SessionPhase::Handshaking);
                    self.emit(ClientEvent::ChannelOpened(ChannelKind::Main));
                    self.send_handshake();
                } else if self.room_server.on_connected(id) {
                    self.emit(ClientEvent::ChannelOpened(ChannelKind::RoomServer));
                    if let Some(auth) = self.pending_room_auth.take() {
                        self.send(ChannelKind::RoomServer, Identifier::ROOM_SERVER, &auth, CipherMethod::None);
                    }
                } else {
                    tracing::trace!(channel = %id, "stale connect ignored");
                }
            }
            ChannelEvent::Frame(id, frame) => {
                let kind = if id == self.main.id() {
                    ChannelKind::Main
                } else if id == self.room_server.id() {
                    ChannelKind::RoomServer
                } else {
                    tracing::trace!(channel = %id, "frame from replaced channel dropped");
                    return;
                };
                let dispatch = handle_frame(&mut self.session, kind, frame);
                for action in dispatch.actions {
                    self.apply(action);
                }
                for event in dispatch.events {
                    self.emit(event);
                }
            }
            ChannelEvent::Closed(id, reason) => {
                let current = self.main.on_closed(id) || self.room_server.on_closed(id);
                if !current {
                    tracing::debug!(channel = %id, ?reason, "replaced channel closed");
                }
                self.emit(ClientEvent::ChannelClosed {
                    channel: id.kind,
                    reason,
                    current,
                });
            }
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Send {
                channel,
                id,
                payload,
                cipher,
            } => self.send(channel, id, &payload, cipher),
            Action::SendSystemInfo => match packets::system_info(&self.config.system_info) {
                Ok(payload) => self.send(ChannelKind::Main, Identifier::SYSTEM_INFO, &payload, CipherMethod::None),
                Err(e) => tracing::warn!(error = %e, "system info not sent"),
            },
            Action::StartHeartbeat => {
                if self.heartbeat.is_none() {
                    self.heartbeat = Some(Heartbeat::new(self.config.heartbeat.clone()));
                }
            }
            Action::SetFingerprint { channel, value } => {
                tracing::debug!(%channel, value, "fingerprint assigned");
                self.channel_mut(channel).set_fingerprint(value);
            }
            Action::Migrate { host, port, auth } => {
                self.room_server.close();
                self.room_server = Channel::new(
                    ChannelKind::RoomServer,
                    self.channel_tx.clone(),
                    self.config.frame.clone(),
                );
                self.pending_room_auth = Some(auth);
                self.room_server.connect(&host, port);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    fn on_command(&mut self, command: Command) {
        if let Err(e) = self.run_command(command) {
            tracing::warn!(error = %e, "command failed");
        }
    }

    fn run_command(&mut self, command: Command) -> Result<(), RoomlinkError> {
        use ChannelKind::{Main, RoomServer};

        match command {
            Command::Login {
                nickname,
                password,
                room,
            } => {
                let payload = packets::login(
                    &nickname,
                    &password_digest(&password),
                    &self.config.client_descriptor,
                    &room,
                    self.session.login_token(),
                )?;
                tracing::info!(%nickname, %room, "logging in");
                self.try_send(Main, Identifier::LOGIN, &payload, CipherMethod::Xxtea)?;
            }
            Command::RoomMessage(text) => {
                let payload = packets::text(&text)?;
                self.try_send(RoomServer, Identifier::ROOM_MESSAGE, &payload, CipherMethod::Xor)?;
            }
            Command::Command(text) => {
                let payload = packets::text(&text)?;
                self.try_send(Main, Identifier::COMMAND, &payload, CipherMethod::Xor)?;
            }
            Command::Whisper { nickname, message } => {
                let data = packets::whisper(&nickname, &message)?;
                self.send_tribulle(packets::WHISPER_CODE, &data)?;
            }
            Command::Tribulle { code, payload } => self.send_tribulle(code, &payload)?,
            Command::Community(id) => {
                self.try_send(Main, Identifier::COMMUNITY, &packets::community(id), CipherMethod::None)?;
            }
            Command::JoinTribeHouse => {
                self.try_send(Main, Identifier::JOIN_TRIBE_HOUSE, &[], CipherMethod::None)?;
            }
            Command::LoadLua(script) => {
                let payload = packets::load_lua(&script)?;
                self.try_send(RoomServer, Identifier::LOAD_LUA, &payload, CipherMethod::None)?;
            }
            Command::Raw {
                channel,
                id,
                payload,
                cipher,
            } => self.try_send(channel, id, &payload, cipher)?,
            Command::Off(id) => {
                self.bus.off(id);
            }
            Command::Disconnect => self.disconnect(),
        }
        Ok(())
    }

    fn send_tribulle(&mut self, code: i16, data: &[u8]) -> Result<(), RoomlinkError> {
        let request_id = self.session.next_tribulle_id();
        let payload = packets::tribulle(code, request_id, data);
        Ok(self.try_send(ChannelKind::Main, Identifier::COMMUNITY_PLATFORM, &payload, CipherMethod::Xor)?)
    }

    // -----------------------------------------------------------------------
    // Outbound helpers
    // -----------------------------------------------------------------------

    fn send_handshake(&mut self) {
        let keys = &self.session.keys;
        match packets::handshake(keys.version, &self.config.locale, &keys.connection_key) {
            Ok(payload) => {
                tracing::info!(version = keys.version, "sending handshake");
                self.send(ChannelKind::Main, Identifier::HANDSHAKE, &payload, CipherMethod::None);
            }
            Err(e) => tracing::warn!(error = %e, "handshake not sent"),
        }
    }

    fn send_heartbeat(&mut self) {
        self.send(ChannelKind::Main, Identifier::HEARTBEAT, &[], CipherMethod::None);
        if self.room_server.is_open() {
            self.send(ChannelKind::RoomServer, Identifier::HEARTBEAT, &[], CipherMethod::None);
        }
    }

    fn channel_mut(&mut self, kind: ChannelKind) -> &mut Channel {
        match kind {
            ChannelKind::Main => &mut self.main,
            ChannelKind::RoomServer => &mut self.room_server,
        }
    }

    fn try_send(
        &mut self,
        kind: ChannelKind,
        id: Identifier,
        payload: &[u8],
        cipher: CipherMethod,
    ) -> Result<(), TransportError> {
        let channel = match kind {
            ChannelKind::Main => &mut self.main,
            ChannelKind::RoomServer => &mut self.room_server,
        };
        channel.send(id, payload, cipher, &self.session.keys.cipher)
    }

    fn send(&mut self, kind: ChannelKind, id: Identifier, payload: &[u8], cipher: CipherMethod) {
        if let Err(e) = self.try_send(kind, id, payload, cipher) {
            tracing::warn!(%kind, %id, error = %e, "send failed");
        }
    }

    fn emit(&mut self, event: ClientEvent) {
        self.bus.emit(&event, &self.handle);
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("phase", &self.session.phase())
            .field("main", &self.main)
            .field("room_server", &self.room_server)
            .field("heartbeat", &self.heartbeat.is_some())
            .finish()
    }
}
