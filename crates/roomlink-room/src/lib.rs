//! Room and player state for roomlink.
//!
//! The client keeps a mirror of the room it is in: the room's name and
//! visibility plus every player the server has told it about. All of it is
//! plain data; the dispatcher in the `roomlink` crate decides when to call
//! each reconciliation method.
//!
//! # Key types
//!
//! - [`Player`]: one player as last described by the server
//! - [`Room`]: the current room and its player map
//! - [`Upsert`]: what an incremental player notice did to the map

mod player;
mod room;

pub use player::Player;
pub use room::{read_player_list, PlayerMap, Room, Upsert};
