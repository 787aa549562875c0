//! The room mirror and its reconciliation rules.
//!
//! Three kinds of notices touch the player map, and each has one method:
//!
//! ```text
//! full snapshot     → Room::replace_players   (map replaced, never merged)
//! join / update     → Room::upsert            (one entry inserted or replaced)
//! leave (legacy)    → Room::remove            (one entry removed, if present)
//! ```
//!
//! Notices are applied strictly in arrival order. The resulting map is the
//! latest snapshot with every later notice applied on top of it.

use std::collections::BTreeMap;

use roomlink_protocol::{ByteBuffer, ProtocolError};
use serde::{Deserialize, Serialize};

use crate::Player;

/// Players keyed by pcode.
pub type PlayerMap = BTreeMap<u32, Player>;

/// Outcome of [`Room::upsert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upsert {
    /// The pcode was not in the room.
    Joined(Player),
    /// The pcode was already present; `before` is the replaced record.
    Updated { before: Player, after: Player },
}

/// The room the client is currently in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub name: String,
    pub is_public: bool,
    players: PlayerMap,
}

impl Room {
    /// Creates an empty room. Rooms start with no players; the server
    /// follows a room change with a full snapshot.
    pub fn new(name: impl Into<String>, is_public: bool) -> Self {
        Self {
            name: name.into(),
            is_public,
            players: PlayerMap::new(),
        }
    }

    /// Reads a room-change notice: `bool is_public | str name`.
    pub fn read(buf: &mut ByteBuffer) -> Result<Self, ProtocolError> {
        let is_public = buf.read_bool()?;
        let name = buf.read_str()?;
        Ok(Self::new(name, is_public))
    }

    pub fn players(&self) -> &PlayerMap {
        &self.players
    }

    pub fn player(&self, pcode: u32) -> Option<&Player> {
        self.players.get(&pcode)
    }

    /// Case-insensitive nickname lookup.
    pub fn player_by_nickname(&self, nickname: &str) -> Option<&Player> {
        self.players
            .values()
            .find(|p| p.nickname.eq_ignore_ascii_case(nickname))
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Replaces the whole player map, returning the previous one.
    pub fn replace_players(&mut self, players: PlayerMap) -> PlayerMap {
        tracing::trace!(room = %self.name, count = players.len(), "player snapshot");
        std::mem::replace(&mut self.players, players)
    }

    /// Inserts `player` or replaces the record with the same pcode.
    pub fn upsert(&mut self, player: Player) -> Upsert {
        match self.players.insert(player.pcode, player.clone()) {
            Some(before) => Upsert::Updated {
                before,
                after: player,
            },
            None => {
                tracing::trace!(room = %self.name, pcode = player.pcode, "player joined");
                Upsert::Joined(player)
            }
        }
    }

    /// Removes the player with `pcode`. Unknown pcodes are a no-op.
    pub fn remove(&mut self, pcode: u32) -> Option<Player> {
        let removed = self.players.remove(&pcode);
        if removed.is_some() {
            tracing::trace!(room = %self.name, pcode, "player left");
        }
        removed
    }
}

/// Reads a full player-list snapshot: `u16 count | count × player`.
///
/// A pcode that appears twice keeps its last record.
pub fn read_player_list(buf: &mut ByteBuffer) -> Result<PlayerMap, ProtocolError> {
    let count = buf.read_u16()?;
    let mut players = PlayerMap::new();
    for _ in 0..count {
        let player = Player::read(buf)?;
        players.insert(player.pcode, player);
    }
    Ok(players)
}
