//! `ClientHandle`: the cheap, cloneable way to talk to a running client.

use roomlink_protocol::{CipherMethod, Identifier};
use roomlink_transport::ChannelKind;
use tokio::sync::mpsc;

use crate::events::ListenerId;
use crate::RoomlinkError;

/// Commands queued by a [`ClientHandle`] for the client loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Login {
        nickname: String,
        password: String,
        room: String,
    },
    RoomMessage(String),
    Command(String),
    Whisper {
        nickname: String,
        message: String,
    },
    Tribulle {
        code: i16,
        payload: Vec<u8>,
    },
    Community(u8),
    JoinTribeHouse,
    LoadLua(String),
    Raw {
        channel: ChannelKind,
        id: Identifier,
        payload: Vec<u8>,
        cipher: CipherMethod,
    },
    Off(ListenerId),
    Disconnect,
}

/// Queues commands for the client loop.
///
/// Every method returns as soon as the command is queued; the packet goes
/// out when the loop gets to it, after the listener that queued it returns.
/// Fails only with [`RoomlinkError::ClientClosed`] once the loop is gone.
#[derive(Debug, Clone)]
pub struct ClientHandle {
    sender: mpsc::UnboundedSender<Command>,
}

impl ClientHandle {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Command>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    #[cfg(test)]
    pub(crate) fn detached() -> Self {
        Self::channel().0
    }

    fn queue(&self, command: Command) -> Result<(), RoomlinkError> {
        self.sender
            .send(command)
            .map_err(|_| RoomlinkError::ClientClosed)
    }

    /// Logs in. Call after [`ClientEvent::LoginReady`](crate::ClientEvent::LoginReady).
    ///
    /// The password is hashed by the client loop; it never goes on the
    /// wire in clear.
    pub fn login(
        &self,
        nickname: impl Into<String>,
        password: impl Into<String>,
        room: impl Into<String>,
    ) -> Result<(), RoomlinkError> {
        self.queue(Command::Login {
            nickname: nickname.into(),
            password: password.into(),
            room: room.into(),
        })
    }

    /// Says `message` in the current room.
    pub fn send_room_message(&self, message: impl Into<String>) -> Result<(), RoomlinkError> {
        self.queue(Command::RoomMessage(message.into()))
    }

    /// Runs a server command, without the leading `/`.
    pub fn send_command(&self, command: impl Into<String>) -> Result<(), RoomlinkError> {
        self.queue(Command::Command(command.into()))
    }

    pub fn send_whisper(
        &self,
        nickname: impl Into<String>,
        message: impl Into<String>,
    ) -> Result<(), RoomlinkError> {
        self.queue(Command::Whisper {
            nickname: nickname.into(),
            message: message.into(),
        })
    }

    /// Sends a raw community platform request. The request id is added by
    /// the client.
    pub fn send_tribulle(&self, code: i16, payload: Vec<u8>) -> Result<(), RoomlinkError> {
        self.queue(Command::Tribulle { code, payload })
    }

    pub fn set_community(&self, id: u8) -> Result<(), RoomlinkError> {
        self.queue(Command::Community(id))
    }

    pub fn join_tribe_house(&self) -> Result<(), RoomlinkError> {
        self.queue(Command::JoinTribeHouse)
    }

    /// Uploads a script to the current room.
    pub fn load_lua(&self, script: impl Into<String>) -> Result<(), RoomlinkError> {
        self.queue(Command::LoadLua(script.into()))
    }

    /// Sends an arbitrary packet.
    pub fn send_raw(
        &self,
        channel: ChannelKind,
        id: Identifier,
        payload: Vec<u8>,
        cipher: CipherMethod,
    ) -> Result<(), RoomlinkError> {
        self.queue(Command::Raw {
            channel,
            id,
            payload,
            cipher,
        })
    }

    /// Removes a listener registered with [`Client::on`](crate::Client::on).
    pub fn off(&self, id: ListenerId) -> Result<(), RoomlinkError> {
        self.queue(Command::Off(id))
    }

    /// Stops the heartbeat, closes both connections and ends the loop.
    pub fn disconnect(&self) -> Result<(), RoomlinkError> {
        self.queue(Command::Disconnect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_are_queued_in_order() {
        let (handle, mut rx) = ClientHandle::channel();
        handle.send_command("mod").unwrap();
        handle.join_tribe_house().unwrap();
        handle.disconnect().unwrap();

        assert_eq!(rx.try_recv().unwrap(), Command::Command("mod".into()));
        assert_eq!(rx.try_recv().unwrap(), Command::JoinTribeHouse);
        assert_eq!(rx.try_recv().unwrap(), Command::Disconnect);
    }

    #[test]
    fn test_closed_loop_is_reported() {
        let (handle, rx) = ClientHandle::channel();
        drop(rx);
        assert!(matches!(
            handle.send_room_message("hi"),
            Err(RoomlinkError::ClientClosed)
        ));
    }
}
