//! Session management for roomlink.
//!
//! This crate holds everything the client knows about its login, apart
//! from the sockets themselves:
//!
//! 1. **Bootstrap**: trading an external identity for session keys
//!    ([`Bootstrap`] trait, [`BootstrapResponse`])
//! 2. **Phase tracking**: where the connection is in its lifecycle
//!    ([`SessionPhase`])
//! 3. **Session state**: keys, identity, counters and the room mirror
//!    ([`Session`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Client (above)        ← drives phases from inbound packets
//!     ↕
//! Session (this crate)  ← keys, identity, phase, room
//!     ↕
//! Protocol (below)      ← CipherKeys, ByteBuffer
//! ```

#![allow(async_fn_in_trait)]

mod bootstrap;
mod digest;
mod error;
mod phase;
mod session;

pub use bootstrap::{Bootstrap, BootstrapResponse, SessionKeys, StaticBootstrap};
pub use digest::password_digest;
pub use error::SessionError;
pub use phase::{SessionPhase, Transition};
pub use session::Session;
