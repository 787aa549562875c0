//! Client events and the listener registry.
//!
//! Listeners are plain closures registered per [`EventKind`]. They run on
//! the client loop, synchronously and in registration order, each getting
//! the event and a [`ClientHandle`] to queue replies with. A listener must
//! not block: the next frame is not processed until it returns.

use std::fmt;

use roomlink_protocol::Identifier;
use roomlink_room::{Player, PlayerMap, Room};
use roomlink_transport::{ChannelKind, CloseReason};

use crate::{ClientHandle, RoomlinkError};

/// A chat line in the current room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMessage {
    /// The sender, looked up by pcode when the message arrived. `None` if
    /// the sender was not (or no longer) in the room mirror.
    pub author: Option<Player>,
    /// Sender nickname as carried by the message itself.
    pub nickname: String,
    pub community: u8,
    pub content: String,
}

impl RoomMessage {
    /// Answers in the room with `"@{author} {text}"`.
    pub fn reply(&self, handle: &ClientHandle, text: &str) -> Result<(), RoomlinkError> {
        let author = self
            .author
            .as_ref()
            .map_or(self.nickname.as_str(), |p| p.nickname.as_str());
        handle.send_room_message(format!("@{author} {text}"))
    }
}

/// A whisper received through the community platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhisperMessage {
    pub author: String,
    pub community: u32,
    pub recipient: String,
    pub content: String,
}

impl WhisperMessage {
    /// Whispers `text` back to the author.
    pub fn reply(&self, handle: &ClientHandle, text: &str) -> Result<(), RoomlinkError> {
        handle.send_whisper(&self.author, text)
    }
}

/// Everything the client reports to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The server accepts login credentials now.
    LoginReady,
    Logged { nickname: String, pcode: u32 },
    /// The community platform finished connecting.
    Ready,
    RoomChange { before: Room, after: Room },
    /// A full player snapshot replaced the map.
    RoomUpdate { before: PlayerMap, after: PlayerMap },
    RoomPlayerJoin(Player),
    RoomPlayerUpdate { before: Player, after: Player },
    RoomPlayerLeft(Player),
    RoomMessage(RoomMessage),
    Whisper(WhisperMessage),
    /// A line from the script chat log.
    LuaLog(String),
    /// Every current-format frame, handled or not. `payload` is everything
    /// after the identifier.
    RawPacket {
        channel: ChannelKind,
        id: Identifier,
        payload: Vec<u8>,
    },
    /// Every legacy frame.
    RawOldPacket {
        channel: ChannelKind,
        id: Identifier,
        fields: Vec<String>,
    },
    /// Every community platform message except the ready signal. `payload`
    /// is everything after the sub-code.
    RawTribulle { code: u16, payload: Vec<u8> },
    ChannelOpened(ChannelKind),
    /// A connection closed.
    ///
    /// `current` is `false` for a room-server connection that a migration
    /// already replaced; its close is expected and changes nothing.
    ChannelClosed {
        channel: ChannelKind,
        reason: CloseReason,
        current: bool,
    },
    /// The client was disconnected. Always the last event.
    Disconnect,
}

/// The discriminant of a [`ClientEvent`], used as the registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    LoginReady,
    Logged,
    Ready,
    RoomChange,
    RoomUpdate,
    RoomPlayerJoin,
    RoomPlayerUpdate,
    RoomPlayerLeft,
    RoomMessage,
    Whisper,
    LuaLog,
    RawPacket,
    RawOldPacket,
    RawTribulle,
    ChannelOpened,
    ChannelClosed,
    Disconnect,
}

impl EventKind {
    pub const ALL: [EventKind; 17] = [
        Self::LoginReady,
        Self::Logged,
        Self::Ready,
        Self::RoomChange,
        Self::RoomUpdate,
        Self::RoomPlayerJoin,
        Self::RoomPlayerUpdate,
        Self::RoomPlayerLeft,
        Self::RoomMessage,
        Self::Whisper,
        Self::LuaLog,
        Self::RawPacket,
        Self::RawOldPacket,
        Self::RawTribulle,
        Self::ChannelOpened,
        Self::ChannelClosed,
        Self::Disconnect,
    ];
}

impl ClientEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::LoginReady => EventKind::LoginReady,
            Self::Logged { .. } => EventKind::Logged,
            Self::Ready => EventKind::Ready,
            Self::RoomChange { .. } => EventKind::RoomChange,
            Self::RoomUpdate { .. } => EventKind::RoomUpdate,
            Self::RoomPlayerJoin(_) => EventKind::RoomPlayerJoin,
            Self::RoomPlayerUpdate { .. } => EventKind::RoomPlayerUpdate,
            Self::RoomPlayerLeft(_) => EventKind::RoomPlayerLeft,
            Self::RoomMessage(_) => EventKind::RoomMessage,
            Self::Whisper(_) => EventKind::Whisper,
            Self::LuaLog(_) => EventKind::LuaLog,
            Self::RawPacket { .. } => EventKind::RawPacket,
            Self::RawOldPacket { .. } => EventKind::RawOldPacket,
            Self::RawTribulle { .. } => EventKind::RawTribulle,
            Self::ChannelOpened(_) => EventKind::ChannelOpened,
            Self::ChannelClosed { .. } => EventKind::ChannelClosed,
            Self::Disconnect => EventKind::Disconnect,
        }
    }
}

/// Identifies one registered listener, for [`EventBus::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Boxed listener callback.
pub type Listener = Box<dyn FnMut(&ClientEvent, &ClientHandle) + Send>;

/// Ordered listener registry.
#[derive(Default)]
pub struct EventBus {
    next_id: u64,
    listeners: Vec<(ListenerId, EventKind, Listener)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for `kind`. Listeners for the same kind run in
    /// the order they were registered.
    pub fn on<F>(&mut self, kind: EventKind, listener: F) -> ListenerId
    where
        F: FnMut(&ClientEvent, &ClientHandle) + Send + 'static,
    {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.listeners.push((id, kind, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Calls every listener registered for the event's kind.
    pub fn emit(&mut self, event: &ClientEvent, handle: &ClientHandle) {
        let kind = event.kind();
        for (_, k, listener) in self.listeners.iter_mut() {
            if *k == kind {
                listener(event, handle);
            }
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners.iter().filter(|(_, k, _)| *k == kind).count()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
