//! Packet identifiers.
//!
//! Every frame starts with a 16-bit identifier. The server thinks of it as
//! a `(major, minor)` pair of bytes, so that is how the constants below
//! are written.

use std::fmt;

/// A 16-bit packet identifier: `major << 8 | minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(pub u16);

impl Identifier {
    /// Builds an identifier from its two halves.
    pub const fn new(major: u8, minor: u8) -> Self {
        Self(((major as u16) << 8) | minor as u16)
    }

    pub const fn major(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn minor(self) -> u8 {
        self.0 as u8
    }

    /// Returns the underlying `u16`.
    pub const fn into_inner(self) -> u16 {
        self.0
    }

    // -- inbound -----------------------------------------------------------

    /// Reserved identifier wrapping a legacy text frame.
    pub const LEGACY: Self = Self::new(1, 1);
    /// Handshake accepted: online players, community, country, auth value.
    pub const CORRECT_VERSION: Self = Self::new(26, 3);
    /// The server is ready to receive login credentials.
    pub const LOGIN_READY: Self = Self::new(26, 35);
    /// Login succeeded.
    pub const LOGGED: Self = Self::new(26, 2);
    /// Server-assigned fingerprint for the receiving channel.
    pub const FINGERPRINT: Self = Self::new(44, 22);
    /// Room-server migration notice (inbound) and room-server auth (outbound).
    pub const ROOM_SERVER: Self = Self::new(44, 1);
    /// Community platform relay, multiplexed by sub-code.
    pub const COMMUNITY_PLATFORM: Self = Self::new(60, 3);
    /// Script chat-log relay.
    pub const LUA_CHAT_LOG: Self = Self::new(29, 6);
    /// Room chat message (both directions).
    pub const ROOM_MESSAGE: Self = Self::new(6, 6);
    /// The client moved to another room: public flag, room name.
    ///
    /// The player map is emptied; a [`Self::ROOM_PLAYER_LIST`] follows.
    pub const ROOM_CHANGE: Self = Self::new(5, 21);
    /// Full player-list snapshot.
    pub const ROOM_PLAYER_LIST: Self = Self::new(144, 1);
    /// Incremental player join or update.
    pub const ROOM_NEW_PLAYER: Self = Self::new(144, 2);

    // -- outbound ----------------------------------------------------------

    /// First packet on the main connection: version, locale, connection
    /// key and the desktop player's fingerprint strings.
    pub const HANDSHAKE: Self = Self::new(28, 1);
    /// Host language, OS and player version, sent once the version is
    /// accepted.
    pub const SYSTEM_INFO: Self = Self::new(28, 17);
    /// Login credentials. The only XXTEA-ciphered packet.
    pub const LOGIN: Self = Self::new(26, 8);
    /// Empty keep-alive. Sent on main every heartbeat period, and on the
    /// room-server connection too while it is open.
    pub const HEARTBEAT: Self = Self::new(26, 26);
    /// Server command text, without the leading `/`. Xor-ciphered.
    pub const COMMAND: Self = Self::new(6, 26);
    /// Change of language community: `[id, 0]`, sent in clear.
    pub const COMMUNITY: Self = Self::new(8, 2);
    /// Empty request to move to the tribe house room.
    pub const JOIN_TRIBE_HOUSE: Self = Self::new(16, 1);
    /// Script upload to the current room, on the room-server connection.
    pub const LOAD_LUA: Self = Self::new(29, 1);
}

impl From<u16> for Identifier {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.major(), self.minor())
    }
}

/// Sub-identifiers carried inside legacy text frames.
pub mod legacy_ids {
    use super::Identifier;

    /// A player left the room; field 0 is the pcode in decimal.
    pub const ROOM_PLAYER_LEFT: Identifier = Identifier::new(8, 7);
}

/// Community platform sub-codes.
pub mod platform_codes {
    /// The platform finished connecting.
    pub const READY: u16 = 3;
    /// Outgoing whisper request.
    pub const SEND_WHISPER: u16 = 52;
    /// Incoming whisper.
    pub const WHISPER: u16 = 66;
}
