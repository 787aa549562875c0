//! # roomlink
//!
//! Client for a proprietary binary game protocol: an encrypted session
//! with a gateway server, migration to per-room servers, a live mirror of
//! the room and its players, and typed events for everything the server
//! says.
//!
//! ## Layers
//!
//! ```text
//! roomlink            ← Client loop, dispatcher, events, handle
//!   roomlink-session  ← phases, keys, bootstrap, login digest
//!   roomlink-room     ← Room / Player mirror
//!   roomlink-heartbeat← keep-alive scheduler
//!   roomlink-transport← framed TCP channels
//!   roomlink-protocol ← ByteBuffer, framing, ciphers, identifiers
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomlink::prelude::*;
//!
//! # async fn demo(bootstrap: StaticBootstrap) -> Result<(), RoomlinkError> {
//! roomlink::init_tracing();
//!
//! let mut client = Client::builder().build();
//! client.on(EventKind::LoginReady, |_, handle| {
//!     let _ = handle.login("Bot#0000", "secret", "1");
//! });
//! client.start(&bootstrap, "id", "token").await?;
//! client.run().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
pub mod dispatch;
mod error;
mod events;
mod handle;
mod logging;
mod packets;

pub use client::Client;
pub use config::{ClientBuilder, ClientConfig, SystemInfo, DEFAULT_CLIENT_DESCRIPTOR};
pub use error::RoomlinkError;
pub use events::{
    ClientEvent, EventBus, EventKind, Listener, ListenerId, RoomMessage, WhisperMessage,
};
pub use handle::ClientHandle;
pub use logging::{init_tracing, DEFAULT_FILTER};

pub use roomlink_heartbeat as heartbeat;
pub use roomlink_protocol as protocol;
pub use roomlink_room as room;
pub use roomlink_session as session;
pub use roomlink_transport as transport;

/// Everything a bot usually needs.
pub mod prelude {
    pub use crate::{
        Client, ClientBuilder, ClientConfig, ClientEvent, ClientHandle, EventKind, ListenerId,
        RoomMessage, RoomlinkError, WhisperMessage,
    };
    pub use roomlink_protocol::{CipherMethod, Identifier};
    pub use roomlink_room::{Player, Room};
    pub use roomlink_session::{Bootstrap, BootstrapResponse, SessionKeys, StaticBootstrap};
    pub use roomlink_transport::ChannelKind;
}
