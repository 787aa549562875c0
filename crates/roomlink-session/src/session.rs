//! The client's record of its own session.

use std::time::SystemTime;

use roomlink_room::{Player, Room};

use crate::{SessionKeys, SessionPhase, Transition};

/// Keys, identity, counters and room for one client session.
///
/// Owned by the client loop; nothing here is shared across tasks.
#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Filled by bootstrap before the main connection opens.
    pub keys: SessionKeys,

    // -- from the correct-version packet ---------------------------------
    /// Server half of the login token.
    pub auth_server: u32,
    pub online_players: u32,
    /// Community code string the server assigned.
    pub server_community: String,
    pub country: String,

    // -- from the login reply --------------------------------------------
    pub player_id: u32,
    pub nickname: String,
    /// Total playing time, in seconds.
    pub playing_time: u32,
    pub community: u8,
    pub pcode: u32,
    pub connected_at: Option<SystemTime>,

    // -- room mirror -----------------------------------------------------
    pub room: Room,
    /// The client's own player, refreshed from each full snapshot.
    pub player: Option<Player>,

    phase: SessionPhase,
    ended: bool,
    tribulle_id: u32,
}

impl Session {
    pub fn new(keys: SessionKeys) -> Self {
        Self {
            keys,
            ..Self::default()
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// `true` once the session was disconnected. Terminal.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Requests a phase change. Returns `true` if the phase moved.
    ///
    /// After disconnect the session never leaves `Disconnected`.
    pub fn advance(&mut self, target: SessionPhase) -> bool {
        if self.ended {
            tracing::debug!(to = %target, "session ended, transition ignored");
            return false;
        }
        let from = self.phase;
        let moved = self.phase.advance(target) != Transition::Refused;
        if moved {
            tracing::debug!(%from, to = %target, "session phase");
        }
        if target == SessionPhase::Disconnected {
            self.ended = true;
        }
        moved
    }

    /// The value appended to the login packet.
    pub fn login_token(&self) -> u32 {
        self.auth_server ^ self.keys.auth_client
    }

    /// Next community-platform request id: 1, 2, …, `u32::MAX`, 1, …
    pub fn next_tribulle_id(&mut self) -> u32 {
        self.tribulle_id = self.tribulle_id.checked_add(1).unwrap_or(1);
        self.tribulle_id
    }
}
