//! Inbound packet dispatch and state reconciliation.
//!
//! [`handle_frame`] turns one reassembled frame into a [`Dispatch`]: the
//! events to emit and the actions the client loop must perform. Handlers
//! only touch the [`Session`], never a socket, so everything here runs in
//! plain unit tests.
//!
//! ```text
//! frame ─┬─ id == LEGACY ─→ legacy text split ─→ legacy handlers ─→ RawOldPacket
//!        └─ otherwise ────→ match on Identifier ─→ handler ─────────→ RawPacket
//! ```
//!
//! A handler reads every field before it changes any state, so a
//! truncated or malformed frame leaves the session untouched and produces
//! nothing.

use std::time::SystemTime;

use roomlink_protocol::{
    legacy_ids, platform_codes, ByteBuffer, CipherMethod, Identifier, LegacyFrame, ProtocolError,
};
use roomlink_room::{read_player_list, Player, Room, Upsert};
use roomlink_session::{Session, SessionPhase};
use roomlink_transport::ChannelKind;

use crate::events::{ClientEvent, RoomMessage, WhisperMessage};
use crate::packets;

/// Something the client loop must do in response to a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Send a packet.
    Send {
        channel: ChannelKind,
        id: Identifier,
        payload: Vec<u8>,
        cipher: CipherMethod,
    },
    /// Report host information (language, OS, player version) on main.
    SendSystemInfo,
    /// Start the keep-alive scheduler. Ignored if already running.
    StartHeartbeat,
    /// Replace the fingerprint of one connection.
    SetFingerprint { channel: ChannelKind, value: u8 },
    /// Replace the room-server connection.
    ///
    /// Close the current one, connect a new one to `host:port`, and send
    /// `auth` under [`Identifier::ROOM_SERVER`] as soon as it connects.
    Migrate {
        host: String,
        port: u16,
        auth: Vec<u8>,
    },
}

/// The outcome of dispatching one frame.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub events: Vec<ClientEvent>,
    pub actions: Vec<Action>,
}

impl Dispatch {
    fn event(mut self, event: ClientEvent) -> Self {
        self.events.push(event);
        self
    }

    fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }
}

/// Dispatches one inbound frame (`id u16 | payload`) received on `channel`.
///
/// Decode failures are logged at `debug` and yield an empty [`Dispatch`].
pub fn handle_frame(session: &mut Session, channel: ChannelKind, frame: Vec<u8>) -> Dispatch {
    let mut buf = ByteBuffer::from_vec(frame);
    let id = match buf.read_u16() {
        Ok(raw) => Identifier(raw),
        Err(e) => {
            tracing::debug!(%channel, error = %e, "frame without identifier dropped");
            return Dispatch::default();
        }
    };

    let result = if id == Identifier::LEGACY {
        handle_legacy(session, channel, &mut buf)
    } else {
        handle_packet(session, channel, id, &mut buf)
    };

    match result {
        Ok(dispatch) => dispatch,
        Err(e) => {
            tracing::debug!(%channel, %id, error = %e, "frame dropped");
            Dispatch::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Legacy frames
// ---------------------------------------------------------------------------

fn handle_legacy(
    session: &mut Session,
    channel: ChannelKind,
    buf: &mut ByteBuffer,
) -> Result<Dispatch, ProtocolError> {
    let frame = LegacyFrame::decode(buf)?;
    tracing::trace!(%channel, id = %frame.id, fields = frame.fields.len(), "legacy frame");

    let mut out = Dispatch::default();
    if frame.id == legacy_ids::ROOM_PLAYER_LEFT {
        let left = frame
            .fields
            .first()
            .and_then(|f| f.parse::<u32>().ok())
            .and_then(|pcode| session.room.remove(pcode));
        if let Some(player) = left {
            out = out.event(ClientEvent::RoomPlayerLeft(player));
        }
    }

    Ok(out.event(ClientEvent::RawOldPacket {
        channel,
        id: frame.id,
        fields: frame.fields,
    }))
}

// ---------------------------------------------------------------------------
// Current-format frames
// ---------------------------------------------------------------------------

fn handle_packet(
    session: &mut Session,
    channel: ChannelKind,
    id: Identifier,
    buf: &mut ByteBuffer,
) -> Result<Dispatch, ProtocolError> {
    let payload = buf.remaining_slice().to_vec();

    let out = match id {
        Identifier::CORRECT_VERSION => correct_version(session, buf)?,
        Identifier::LOGIN_READY => Dispatch::default().event(ClientEvent::LoginReady),
        Identifier::FINGERPRINT => {
            let value = buf.read_u8()?;
            Dispatch::default().action(Action::SetFingerprint { channel, value })
        }
        Identifier::ROOM_SERVER => migration(session, buf)?,
        Identifier::LOGGED => logged(session, buf)?,
        Identifier::COMMUNITY_PLATFORM => community_platform(session, buf)?,
        Identifier::LUA_CHAT_LOG => Dispatch::default().event(ClientEvent::LuaLog(buf.read_str()?)),
        Identifier::ROOM_MESSAGE => room_message(session, buf)?,
        Identifier::ROOM_CHANGE => room_change(session, buf)?,
        Identifier::ROOM_PLAYER_LIST => player_list(session, buf)?,
        Identifier::ROOM_NEW_PLAYER => new_player(session, buf)?,
        _ => {
            tracing::trace!(%channel, %id, len = payload.len(), "unhandled packet");
            Dispatch::default()
        }
    };

    Ok(out.event(ClientEvent::RawPacket {
        channel,
        id,
        payload,
    }))
}

fn correct_version(session: &mut Session, buf: &mut ByteBuffer) -> Result<Dispatch, ProtocolError> {
    let online_players = buf.read_u32()?;
    let community = buf.read_str()?;
    let country = buf.read_str()?;
    let auth_server = buf.read_u32()?;

    session.online_players = online_players;
    session.server_community = community;
    session.country = country;
    session.auth_server = auth_server;
    session.advance(SessionPhase::Authenticating);
    tracing::info!(online_players, community = %session.server_community, "version accepted");

    Ok(Dispatch::default()
        .action(Action::SendSystemInfo)
        .action(Action::StartHeartbeat))
}

fn migration(session: &mut Session, buf: &mut ByteBuffer) -> Result<Dispatch, ProtocolError> {
    let timestamp = buf.read_u32()?;
    let player_id = buf.read_u32()?;
    let pcode = buf.read_u32()?;
    let host = buf.read_str()?;
    let notice_ports: Vec<u16> = buf
        .read_str()?
        .split('-')
        .filter_map(|p| p.parse().ok())
        .collect();

    // The notice lists its own ports, but room servers listen on the
    // gateway's first port.
    let Some(port) = session.keys.primary_port() else {
        tracing::debug!(%host, "migration notice without a known port ignored");
        return Ok(Dispatch::default());
    };

    session.advance(SessionPhase::RoomServerConnecting);
    tracing::info!(%host, port, ?notice_ports, "room-server migration");
    Ok(Dispatch::default().action(Action::Migrate {
        host,
        port,
        auth: packets::room_server_auth(timestamp, player_id, pcode),
    }))
}

fn logged(session: &mut Session, buf: &mut ByteBuffer) -> Result<Dispatch, ProtocolError> {
    let player_id = buf.read_u32()?;
    let nickname = buf.read_str()?;
    let playing_time = buf.read_u32()?;
    let community = buf.read_u8()?;
    let pcode = buf.read_u32()?;

    session.player_id = player_id;
    session.nickname = nickname.clone();
    session.playing_time = playing_time;
    session.community = community;
    session.pcode = pcode;
    session.connected_at = Some(SystemTime::now());
    session.advance(SessionPhase::LoggedIn);
    tracing::info!(%nickname, pcode, "logged in");

    Ok(Dispatch::default().event(ClientEvent::Logged { nickname, pcode }))
}

fn community_platform(
    session: &mut Session,
    buf: &mut ByteBuffer,
) -> Result<Dispatch, ProtocolError> {
    let code = buf.read_u16()?;
    if code == platform_codes::READY {
        session.advance(SessionPhase::RoomServerReady);
        tracing::info!("community platform ready");
        return Ok(Dispatch::default().event(ClientEvent::Ready));
    }

    let payload = buf.remaining_slice().to_vec();
    let mut out = Dispatch::default();
    if code == platform_codes::WHISPER {
        let author = buf.read_str()?;
        let community = buf.read_u32()?;
        let recipient = buf.read_str()?;
        let content = buf.read_str()?;
        out = out.event(ClientEvent::Whisper(WhisperMessage {
            author,
            community,
            recipient,
            content,
        }));
    }
    Ok(out.event(ClientEvent::RawTribulle { code, payload }))
}

fn room_message(session: &mut Session, buf: &mut ByteBuffer) -> Result<Dispatch, ProtocolError> {
    let pcode = buf.read_u32()?;
    let nickname = buf.read_str()?;
    let community = buf.read_u8()?;
    let content = buf.read_str()?;

    Ok(Dispatch::default().event(ClientEvent::RoomMessage(RoomMessage {
        author: session.room.player(pcode).cloned(),
        nickname,
        community,
        content,
    })))
}

fn room_change(session: &mut Session, buf: &mut ByteBuffer) -> Result<Dispatch, ProtocolError> {
    let after = Room::read(buf)?;
    let before = std::mem::replace(&mut session.room, after.clone());
    tracing::info!(from = %before.name, to = %after.name, "room changed");
    Ok(Dispatch::default().event(ClientEvent::RoomChange { before, after }))
}

fn player_list(session: &mut Session, buf: &mut ByteBuffer) -> Result<Dispatch, ProtocolError> {
    let players = read_player_list(buf)?;
    let before = session.room.replace_players(players);
    session.player = session.room.player(session.pcode).cloned();
    Ok(Dispatch::default().event(ClientEvent::RoomUpdate {
        before,
        after: session.room.players().clone(),
    }))
}

fn new_player(session: &mut Session, buf: &mut ByteBuffer) -> Result<Dispatch, ProtocolError> {
    let player = Player::read(buf)?;
    let event = match session.room.upsert(player) {
        Upsert::Joined(player) => ClientEvent::RoomPlayerJoin(player),
        Upsert::Updated { before, after } => ClientEvent::RoomPlayerUpdate { before, after },
    };
    Ok(Dispatch::default().event(event))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(id: Identifier, build: impl FnOnce(&mut ByteBuffer)) -> Vec<u8> {
        let mut buf = ByteBuffer::new();
        buf.write_u16(id.into_inner());
        build(&mut buf);
        buf.into_vec()
    }

    #[test]
    fn test_empty_frame_is_dropped() {
        let mut s = Session::default();
        assert_eq!(handle_frame(&mut s, ChannelKind::Main, vec![7]), Dispatch::default());
    }

    #[test]
    fn test_unknown_id_still_raises_raw_packet() {
        let mut s = Session::default();
        let out = handle_frame(&mut s, ChannelKind::RoomServer, vec![9, 9, 1, 2]);
        assert_eq!(
            out.events,
            vec![ClientEvent::RawPacket {
                channel: ChannelKind::RoomServer,
                id: Identifier::new(9, 9),
                payload: vec![1, 2],
            }]
        );
        assert!(out.actions.is_empty());
    }

    #[test]
    fn test_fingerprint_targets_receiving_channel() {
        let mut s = Session::default();
        let out = handle_frame(
            &mut s,
            ChannelKind::RoomServer,
            frame(Identifier::FINGERPRINT, |b| {
                b.write_u8(42);
            }),
        );
        assert_eq!(
            out.actions,
            vec![Action::SetFingerprint {
                channel: ChannelKind::RoomServer,
                value: 42
            }]
        );
    }

    #[test]
    fn test_truncated_frame_changes_nothing() {
        let mut s = Session::default();
        let out = handle_frame(
            &mut s,
            ChannelKind::Main,
            frame(Identifier::CORRECT_VERSION, |b| {
                b.write_u32(10).write_str("en").unwrap();
            }),
        );
        assert_eq!(out, Dispatch::default());
        assert_eq!(s.online_players, 0);
        assert_eq!(s.server_community, "");
    }
}
