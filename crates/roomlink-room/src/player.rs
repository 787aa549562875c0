//! A single player as described by the server.

use roomlink_protocol::{ByteBuffer, ProtocolError};
use serde::{Deserialize, Serialize};

/// One player in the room.
///
/// A `Player` is a value. Every update notice produces a fresh one that
/// replaces the stored copy wholesale, so a `before` handed to a listener
/// never changes under it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Display name with its `#tag` discriminator, e.g. `Souris#0001`.
    pub nickname: String,
    /// Per-session player code. Unique within a room.
    pub pcode: u32,
    /// Whether the player is a shaman this round.
    pub is_shaman: bool,
    /// Whether the player died this round.
    pub is_dead: bool,
    /// Round score shown on the scoreboard.
    pub score: i16,
    /// Whether the player is carrying the cheese.
    pub has_cheese: bool,
    /// Selected title id; 0 for none.
    pub title: i16,
    /// Star level of the selected title.
    pub title_stars: u8,
    /// Gender code as sent by the server.
    pub gender: u8,
    /// Outfit descriptor string.
    pub look: String,
    /// Fur colour as `0xRRGGBB`.
    pub mouse_color: u32,
    /// Shaman feather colour as `0xRRGGBB`.
    pub shaman_color: u32,
    /// Nickname colour on the scoreboard, `0xRRGGBB`.
    pub name_color: u32,
}

impl Player {
    /// Reads one player record.
    ///
    /// The record interleaves fields the client does not track; they are
    /// read and discarded so the cursor ends exactly after the record.
    pub fn read(buf: &mut ByteBuffer) -> Result<Self, ProtocolError> {
        let nickname = buf.read_str()?;
        let pcode = buf.read_u32()?;
        let is_shaman = buf.read_bool()?;
        let is_dead = buf.read_bool()?;
        let score = buf.read_i16()?;
        let has_cheese = buf.read_bool()?;
        let title = buf.read_i16()?;
        let title_stars = buf.read_u8()?;
        let gender = buf.read_u8()?;
        let _ = buf.read_str()?;
        let look = buf.read_str()?;
        let _ = buf.read_bool()?;
        let mouse_color = buf.read_u32()?;
        let shaman_color = buf.read_u32()?;
        let _ = buf.read_u32()?;
        let name_color = buf.read_u32()?;

        Ok(Self {
            nickname,
            pcode,
            is_shaman,
            is_dead,
            score,
            has_cheese,
            title,
            title_stars,
            gender,
            look,
            mouse_color,
            shaman_color,
            name_color,
        })
    }

    /// Writes the record in the order [`read`](Self::read) expects, with
    /// the untracked fields zeroed. Used to play the server side in tests.
    pub fn write(&self, buf: &mut ByteBuffer) -> Result<(), ProtocolError> {
        buf.write_str(&self.nickname)?
            .write_u32(self.pcode)
            .write_bool(self.is_shaman)
            .write_bool(self.is_dead)
            .write_i16(self.score)
            .write_bool(self.has_cheese)
            .write_i16(self.title)
            .write_u8(self.title_stars)
            .write_u8(self.gender)
            .write_str("")?
            .write_str(&self.look)?
            .write_bool(false)
            .write_u32(self.mouse_color)
            .write_u32(self.shaman_color)
            .write_u32(0)
            .write_u32(self.name_color);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Player {
        Player {
            nickname: "Souris#0001".into(),
            pcode: 77,
            is_shaman: true,
            is_dead: false,
            score: -3,
            has_cheese: true,
            title: 230,
            title_stars: 2,
            gender: 1,
            look: "1;0,0,0,0,0,0,0,0,0".into(),
            mouse_color: 0x78583A,
            shaman_color: 0x95D9D6,
            name_color: 0xFFFFFF,
        }
    }

    #[test]
    fn test_read_consumes_exactly_one_record() {
        let mut buf = ByteBuffer::new();
        sample().write(&mut buf).unwrap();
        buf.write_u8(0xEE);

        let player = Player::read(&mut buf).unwrap();
        assert_eq!(player, sample());
        assert_eq!(buf.read_u8().unwrap(), 0xEE);
    }

    #[test]
    fn test_read_skips_untracked_fields() {
        let mut buf = ByteBuffer::new();
        buf.write_str("A").unwrap()
            .write_u32(1)
            .write_bool(false)
            .write_bool(true)
            .write_i16(10)
            .write_bool(false)
            .write_i16(0)
            .write_u8(0)
            .write_u8(2)
            .write_str("ignored").unwrap()
            .write_str("look").unwrap()
            .write_bool(true)
            .write_u32(5)
            .write_u32(6)
            .write_u32(0xDEAD)
            .write_u32(7);

        let player = Player::read(&mut buf).unwrap();
        assert!(player.is_dead);
        assert_eq!(player.look, "look");
        assert_eq!(player.mouse_color, 5);
        assert_eq!(player.shaman_color, 6);
        assert_eq!(player.name_color, 7);
        assert_eq!(buf.remaining(), 0);
    }

    #[test]
    fn test_truncated_record_is_error() {
        let mut buf = ByteBuffer::new();
        buf.write_str("A").unwrap().write_u32(1);
        assert!(matches!(
            Player::read(&mut buf),
            Err(ProtocolError::UnexpectedEof { .. })
        ));
    }
}
