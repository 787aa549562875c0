//! Connection lifecycle phases.

use std::fmt;

/// Where the session is in its lifecycle.
///
/// ```text
/// Disconnected → Connecting → Handshaking → Authenticating → LoggedIn
///                                                              │
///                     ┌────────────────────────────────────────┘
///                     ↓
///            RoomServerConnecting ⇄ RoomServerReady
///
/// any ──(disconnect)──→ Disconnected
/// ```
///
/// - **Connecting**: keys fetched, main connection in flight.
/// - **Handshaking**: main connected, handshake sent.
/// - **Authenticating**: version accepted; waiting for the caller to log in.
/// - **LoggedIn**: login confirmed by the server.
/// - **RoomServerConnecting**: a migration notice replaced the room-server
///   connection.
/// - **RoomServerReady**: the community platform reported ready.
///
/// Every migration notice goes back to `RoomServerConnecting`, so the last
/// two phases alternate for the rest of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Disconnected,
    Connecting,
    Handshaking,
    Authenticating,
    LoggedIn,
    RoomServerConnecting,
    RoomServerReady,
}

/// How [`SessionPhase::advance`] treated a requested transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A listed transition; the phase moved.
    Expected,
    /// Not listed but forward; the phase moved anyway because the server
    /// is authoritative.
    Skipped,
    /// Backwards and not listed; the phase did not move.
    Refused,
}

impl SessionPhase {
    fn rank(self) -> u8 {
        match self {
            Self::Disconnected => 0,
            Self::Connecting => 1,
            Self::Handshaking => 2,
            Self::Authenticating => 3,
            Self::LoggedIn => 4,
            Self::RoomServerConnecting => 5,
            Self::RoomServerReady => 6,
        }
    }

    /// Returns `true` if `target` is a listed transition from `self`.
    pub fn can_transition_to(self, target: Self) -> bool {
        use SessionPhase::*;
        matches!(
            (self, target),
            (_, Disconnected)
                | (Disconnected, Connecting)
                | (Connecting, Handshaking)
                | (Handshaking, Authenticating)
                | (Authenticating, LoggedIn)
                | (LoggedIn, RoomServerConnecting)
                | (RoomServerConnecting, RoomServerConnecting)
                | (RoomServerConnecting, RoomServerReady)
                | (RoomServerReady, RoomServerConnecting)
        )
    }

    /// Moves to `target` if it is listed or lies further along the
    /// lifecycle. Unlisted forward jumps are logged at `debug`.
    pub fn advance(&mut self, target: Self) -> Transition {
        if self.can_transition_to(target) {
            *self = target;
            return Transition::Expected;
        }
        if target.rank() > self.rank() {
            tracing::debug!(from = %self, to = %target, "out-of-order phase transition");
            *self = target;
            return Transition::Skipped;
        }
        tracing::debug!(from = %self, to = %target, "phase transition refused");
        Transition::Refused
    }

    /// Logged in, with or without a room-server connection.
    pub fn is_logged_in(self) -> bool {
        self.rank() >= Self::LoggedIn.rank()
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Handshaking => "Handshaking",
            Self::Authenticating => "Authenticating",
            Self::LoggedIn => "LoggedIn",
            Self::RoomServerConnecting => "RoomServerConnecting",
            Self::RoomServerReady => "RoomServerReady",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_is_all_expected() {
        let mut phase = SessionPhase::default();
        for next in [
            SessionPhase::Connecting,
            SessionPhase::Handshaking,
            SessionPhase::Authenticating,
            SessionPhase::LoggedIn,
            SessionPhase::RoomServerConnecting,
            SessionPhase::RoomServerReady,
            SessionPhase::RoomServerConnecting,
        ] {
            assert_eq!(phase.advance(next), Transition::Expected);
            assert_eq!(phase, next);
        }
    }

    #[test]
    fn test_forward_jump_is_skipped_but_applied() {
        let mut phase = SessionPhase::Handshaking;
        assert_eq!(phase.advance(SessionPhase::LoggedIn), Transition::Skipped);
        assert_eq!(phase, SessionPhase::LoggedIn);
    }

    #[test]
    fn test_backwards_jump_is_refused() {
        let mut phase = SessionPhase::LoggedIn;
        assert_eq!(phase.advance(SessionPhase::Handshaking), Transition::Refused);
        assert_eq!(phase, SessionPhase::LoggedIn);
    }

    #[test]
    fn test_disconnect_is_always_listed() {
        for from in [
            SessionPhase::Connecting,
            SessionPhase::LoggedIn,
            SessionPhase::RoomServerReady,
        ] {
            assert!(from.can_transition_to(SessionPhase::Disconnected));
        }
    }

    #[test]
    fn test_is_logged_in() {
        assert!(!SessionPhase::Authenticating.is_logged_in());
        assert!(SessionPhase::LoggedIn.is_logged_in());
        assert!(SessionPhase::RoomServerReady.is_logged_in());
    }
}
