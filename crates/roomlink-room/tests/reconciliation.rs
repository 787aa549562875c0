//! Applying server notices to a room in arrival order.

use roomlink_protocol::ByteBuffer;
use roomlink_room::{read_player_list, Player, PlayerMap, Room, Upsert};

fn player(pcode: u32, nickname: &str, score: i16) -> Player {
    Player {
        nickname: nickname.into(),
        pcode,
        score,
        ..Player::default()
    }
}

fn snapshot(players: &[Player]) -> ByteBuffer {
    let mut buf = ByteBuffer::new();
    buf.write_u16(players.len() as u16);
    for p in players {
        p.write(&mut buf).unwrap();
    }
    ByteBuffer::from_vec(buf.into_vec())
}

#[test]
fn test_snapshot_then_incremental_notices() {
    let mut room = Room::new("village", true);

    let mut wire = snapshot(&[player(1, "A", 0), player(2, "B", 0)]);
    let first = read_player_list(&mut wire).unwrap();
    assert!(room.replace_players(first).is_empty());

    // Update for a known pcode, join for a new one.
    assert!(matches!(
        room.upsert(player(2, "B", 4)),
        Upsert::Updated { ref before, .. } if before.score == 0
    ));
    assert!(matches!(room.upsert(player(3, "C", 0)), Upsert::Joined(_)));
    assert_eq!(room.remove(1).map(|p| p.nickname), Some("A".to_string()));

    let expected: PlayerMap = [(2, player(2, "B", 4)), (3, player(3, "C", 0))]
        .into_iter()
        .collect();
    assert_eq!(room.players(), &expected);

    // A new snapshot drops everything the notices built up.
    let mut wire = snapshot(&[player(9, "Z", 1)]);
    let before = room.replace_players(read_player_list(&mut wire).unwrap());
    assert_eq!(before, expected);
    assert_eq!(room.players().keys().copied().collect::<Vec<_>>(), vec![9]);
}

#[test]
fn test_before_values_do_not_alias_the_map() {
    let mut room = Room::new("village", true);
    room.upsert(player(1, "A", 0));
    let Upsert::Updated { before, .. } = room.upsert(player(1, "A", 10)) else {
        panic!("expected update");
    };
    room.upsert(player(1, "A", 20));
    assert_eq!(before.score, 0);
    assert_eq!(room.player(1).unwrap().score, 20);
}

#[test]
fn test_truncated_snapshot_is_rejected() {
    let mut buf = ByteBuffer::new();
    buf.write_u16(2);
    player(1, "A", 0).write(&mut buf).unwrap();
    let mut wire = ByteBuffer::from_vec(buf.into_vec());
    assert!(read_player_list(&mut wire).is_err());
}

#[test]
fn test_room_serializes_for_inspection() {
    let mut room = Room::new("village", false);
    room.upsert(player(1, "A", 0));
    let json = serde_json::to_value(&room).unwrap();
    assert_eq!(json["name"], "village");
    assert_eq!(json["players"]["1"]["nickname"], "A");
}
