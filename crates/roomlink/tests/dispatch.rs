//! Dispatcher tests: frames in, events and actions out. No sockets.

use roomlink::dispatch::{handle_frame, Action, Dispatch};
use roomlink::protocol::{ByteBuffer, Identifier, LegacyFrame};
use roomlink::room::{Player, Room};
use roomlink::session::{Session, SessionKeys, SessionPhase};
use roomlink::transport::ChannelKind;
use roomlink::{ClientEvent, EventKind};

// =========================================================================
// Helpers
// =========================================================================

fn frame(id: Identifier, build: impl FnOnce(&mut ByteBuffer)) -> Vec<u8> {
    let mut buf = ByteBuffer::new();
    buf.write_u16(id.into_inner());
    build(&mut buf);
    buf.into_vec()
}

fn player(pcode: u32, nickname: &str) -> Player {
    Player {
        nickname: nickname.into(),
        pcode,
        ..Player::default()
    }
}

fn player_list(players: &[Player]) -> Vec<u8> {
    frame(Identifier::ROOM_PLAYER_LIST, |b| {
        b.write_u16(players.len() as u16);
        for p in players {
            p.write(b).unwrap();
        }
    })
}

fn new_player(p: &Player) -> Vec<u8> {
    frame(Identifier::ROOM_NEW_PLAYER, |b| p.write(b).unwrap())
}

fn player_left(pcode: &str) -> Vec<u8> {
    frame(Identifier::LEGACY, |b| {
        LegacyFrame {
            id: Identifier::new(8, 7),
            fields: vec![pcode.into()],
        }
        .encode(b)
        .unwrap();
    })
}

fn kinds(d: &Dispatch) -> Vec<EventKind> {
    d.events.iter().map(ClientEvent::kind).collect()
}

fn session_in_room() -> Session {
    let mut s = Session::default();
    s.room = Room::new("village", true);
    s
}

// =========================================================================
// Routing
// =========================================================================

#[test]
fn test_legacy_and_binary_frames_take_different_paths() {
    let mut s = session_in_room();

    let legacy = handle_frame(&mut s, ChannelKind::Main, player_left("1"));
    assert_eq!(kinds(&legacy), vec![EventKind::RawOldPacket]);
    assert!(matches!(
        &legacy.events[0],
        ClientEvent::RawOldPacket { id, fields, .. }
            if *id == Identifier::new(8, 7) && fields == &vec!["1".to_string()]
    ));

    let binary = handle_frame(&mut s, ChannelKind::Main, frame(Identifier::LOGIN_READY, |_| {}));
    assert_eq!(kinds(&binary), vec![EventKind::LoginReady, EventKind::RawPacket]);
}

#[test]
fn test_raw_packet_carries_payload_after_identifier() {
    let mut s = Session::default();
    let out = handle_frame(
        &mut s,
        ChannelKind::RoomServer,
        frame(Identifier::LUA_CHAT_LOG, |b| {
            b.write_str("<V>[Lua]</V> ok").unwrap();
        }),
    );
    assert_eq!(out.events[0], ClientEvent::LuaLog("<V>[Lua]</V> ok".into()));
    match &out.events[1] {
        ClientEvent::RawPacket {
            channel,
            id,
            payload,
        } => {
            assert_eq!(*channel, ChannelKind::RoomServer);
            assert_eq!(*id, Identifier::LUA_CHAT_LOG);
            assert_eq!(payload.len(), 2 + "<V>[Lua]</V> ok".len());
        }
        other => panic!("expected raw packet, got {other:?}"),
    }
}

// =========================================================================
// Handshake and login
// =========================================================================

#[test]
fn test_correct_version_records_server_values() {
    let mut s = Session::default();
    s.advance(SessionPhase::Connecting);
    s.advance(SessionPhase::Handshaking);

    let out = handle_frame(
        &mut s,
        ChannelKind::Main,
        frame(Identifier::CORRECT_VERSION, |b| {
            b.write_u32(12_345)
                .write_str("en")
                .unwrap()
                .write_str("GB")
                .unwrap()
                .write_u32(0xCAFE);
        }),
    );

    assert_eq!(out.actions, vec![Action::SendSystemInfo, Action::StartHeartbeat]);
    assert_eq!(s.online_players, 12_345);
    assert_eq!(s.server_community, "en");
    assert_eq!(s.country, "GB");
    assert_eq!(s.auth_server, 0xCAFE);
    assert_eq!(s.phase(), SessionPhase::Authenticating);
}

#[test]
fn test_logged_sets_identity() {
    let mut s = Session::default();
    let out = handle_frame(
        &mut s,
        ChannelKind::Main,
        frame(Identifier::LOGGED, |b| {
            b.write_u32(99)
                .write_str("Bot#0000")
                .unwrap()
                .write_u32(3600)
                .write_u8(1)
                .write_u32(4242);
        }),
    );

    assert_eq!(
        out.events[0],
        ClientEvent::Logged {
            nickname: "Bot#0000".into(),
            pcode: 4242
        }
    );
    assert_eq!(s.player_id, 99);
    assert_eq!(s.playing_time, 3600);
    assert_eq!(s.community, 1);
    assert!(s.connected_at.is_some());
    assert!(s.phase().is_logged_in());
}

// =========================================================================
// Migration
// =========================================================================

#[test]
fn test_migration_targets_bootstrap_port() {
    let mut s = Session::new(SessionKeys {
        ports: vec![11801, 12801],
        ..SessionKeys::default()
    });

    let out = handle_frame(
        &mut s,
        ChannelKind::Main,
        frame(Identifier::ROOM_SERVER, |b| {
            b.write_u32(1)
                .write_u32(2)
                .write_u32(3)
                .write_str("10.0.0.7")
                .unwrap()
                .write_str("5555-6666")
                .unwrap();
        }),
    );

    assert_eq!(
        out.actions,
        vec![Action::Migrate {
            host: "10.0.0.7".into(),
            port: 11801,
            auth: vec![0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3],
        }]
    );
    assert_eq!(s.phase(), SessionPhase::RoomServerConnecting);
}

#[test]
fn test_migration_without_keys_is_ignored() {
    let mut s = Session::default();
    let out = handle_frame(
        &mut s,
        ChannelKind::Main,
        frame(Identifier::ROOM_SERVER, |b| {
            b.write_u32(1)
                .write_u32(2)
                .write_u32(3)
                .write_str("h")
                .unwrap()
                .write_str("1")
                .unwrap();
        }),
    );
    assert!(out.actions.is_empty());
    assert_eq!(kinds(&out), vec![EventKind::RawPacket]);
}

// =========================================================================
// Community platform
// =========================================================================

#[test]
fn test_platform_ready_is_not_forwarded() {
    let mut s = Session::default();
    let out = handle_frame(
        &mut s,
        ChannelKind::Main,
        frame(Identifier::COMMUNITY_PLATFORM, |b| {
            b.write_u16(3);
        }),
    );
    assert_eq!(kinds(&out), vec![EventKind::Ready, EventKind::RawPacket]);
    assert_eq!(s.phase(), SessionPhase::RoomServerReady);
}

#[test]
fn test_whisper_is_decoded_then_forwarded() {
    let mut s = Session::default();
    let out = handle_frame(
        &mut s,
        ChannelKind::Main,
        frame(Identifier::COMMUNITY_PLATFORM, |b| {
            b.write_u16(66)
                .write_str("Souris#0001")
                .unwrap()
                .write_u32(2)
                .write_str("bot#0000")
                .unwrap()
                .write_str("psst")
                .unwrap();
        }),
    );

    assert_eq!(
        kinds(&out),
        vec![EventKind::Whisper, EventKind::RawTribulle, EventKind::RawPacket]
    );
    match &out.events[0] {
        ClientEvent::Whisper(w) => {
            assert_eq!(w.author, "Souris#0001");
            assert_eq!(w.community, 2);
            assert_eq!(w.recipient, "bot#0000");
            assert_eq!(w.content, "psst");
        }
        other => panic!("expected whisper, got {other:?}"),
    }
    assert!(matches!(&out.events[1], ClientEvent::RawTribulle { code: 66, .. }));
}

#[test]
fn test_other_platform_codes_are_raw_only() {
    let mut s = Session::default();
    let out = handle_frame(
        &mut s,
        ChannelKind::Main,
        frame(Identifier::COMMUNITY_PLATFORM, |b| {
            b.write_u16(40).write_bytes(&[1, 2, 3]);
        }),
    );
    assert_eq!(
        out.events[0],
        ClientEvent::RawTribulle {
            code: 40,
            payload: vec![1, 2, 3]
        }
    );
}

// =========================================================================
// Room state reconciliation
// =========================================================================

#[test]
fn test_room_change_resets_room() {
    let mut s = session_in_room();
    handle_frame(&mut s, ChannelKind::RoomServer, new_player(&player(1, "A")));

    let out = handle_frame(
        &mut s,
        ChannelKind::RoomServer,
        frame(Identifier::ROOM_CHANGE, |b| {
            b.write_bool(true).write_str("2").unwrap();
        }),
    );
    match &out.events[0] {
        ClientEvent::RoomChange { before, after } => {
            assert_eq!(before.name, "village");
            assert_eq!(before.player_count(), 1);
            assert_eq!(after.name, "2");
            assert_eq!(after.player_count(), 0);
        }
        other => panic!("expected room change, got {other:?}"),
    }
    assert_eq!(s.room.name, "2");
}

#[test]
fn test_snapshot_replaces_and_refreshes_own_player() {
    let mut s = session_in_room();
    s.pcode = 2;
    handle_frame(&mut s, ChannelKind::RoomServer, new_player(&player(9, "Old")));

    let out = handle_frame(
        &mut s,
        ChannelKind::RoomServer,
        player_list(&[player(1, "A"), player(2, "Me")]),
    );

    match &out.events[0] {
        ClientEvent::RoomUpdate { before, after } => {
            assert_eq!(before.keys().copied().collect::<Vec<_>>(), vec![9]);
            assert_eq!(after.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        }
        other => panic!("expected room update, got {other:?}"),
    }
    assert!(s.room.player(9).is_none());
    assert_eq!(s.player.as_ref().map(|p| p.nickname.as_str()), Some("Me"));
}

#[test]
fn test_new_player_joins_then_updates() {
    let mut s = session_in_room();

    let out = handle_frame(&mut s, ChannelKind::RoomServer, new_player(&player(5, "A")));
    assert_eq!(out.events[0], ClientEvent::RoomPlayerJoin(player(5, "A")));

    let mut changed = player(5, "A");
    changed.has_cheese = true;
    let out = handle_frame(&mut s, ChannelKind::RoomServer, new_player(&changed));
    assert_eq!(
        out.events[0],
        ClientEvent::RoomPlayerUpdate {
            before: player(5, "A"),
            after: changed.clone(),
        }
    );
    assert_eq!(s.room.player(5), Some(&changed));
}

#[test]
fn test_legacy_leave_removes_known_player_only() {
    let mut s = session_in_room();
    handle_frame(&mut s, ChannelKind::RoomServer, new_player(&player(7, "A")));

    let out = handle_frame(&mut s, ChannelKind::RoomServer, player_left("7"));
    assert_eq!(out.events[0], ClientEvent::RoomPlayerLeft(player(7, "A")));
    assert_eq!(s.room.player_count(), 0);

    // Unknown or unparsable pcodes only raise the raw event.
    for pcode in ["7", "not-a-number"] {
        let out = handle_frame(&mut s, ChannelKind::RoomServer, player_left(pcode));
        assert_eq!(kinds(&out), vec![EventKind::RawOldPacket]);
    }
}

#[test]
fn test_room_message_resolves_author() {
    let mut s = session_in_room();
    handle_frame(&mut s, ChannelKind::RoomServer, new_player(&player(3, "Souris#0001")));

    let msg = |pcode: u32| {
        frame(Identifier::ROOM_MESSAGE, |b| {
            b.write_u32(pcode)
                .write_str("Souris#0001")
                .unwrap()
                .write_u8(0)
                .write_str("hello")
                .unwrap();
        })
    };

    let out = handle_frame(&mut s, ChannelKind::RoomServer, msg(3));
    match &out.events[0] {
        ClientEvent::RoomMessage(m) => {
            assert_eq!(m.author.as_ref().map(|p| p.pcode), Some(3));
            assert_eq!(m.content, "hello");
        }
        other => panic!("expected room message, got {other:?}"),
    }

    // Author already gone: message still delivered, without a player.
    let out = handle_frame(&mut s, ChannelKind::RoomServer, msg(4));
    assert!(matches!(&out.events[0], ClientEvent::RoomMessage(m) if m.author.is_none()));
}

#[test]
fn test_decode_failure_discards_whole_frame() {
    let mut s = session_in_room();
    // Player record cut short.
    let mut bytes = new_player(&player(1, "A"));
    bytes.truncate(bytes.len() - 3);

    let out = handle_frame(&mut s, ChannelKind::RoomServer, bytes);
    assert_eq!(out, Dispatch::default());
    assert_eq!(s.room.player_count(), 0);
}
