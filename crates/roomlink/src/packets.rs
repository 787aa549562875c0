//! Outbound payload builders.
//!
//! Each function returns the payload only (everything after the
//! identifier). Which connection it goes on, and under which cipher, is
//! decided by the caller in `client.rs`.

use roomlink_protocol::{platform_codes, ByteBuffer, ProtocolError};

use crate::config::SystemInfo;

/// Platform name sent in the handshake.
const PLATFORM: &str = "Desktop";
/// Opaque descriptor the server expects in the handshake.
const HANDSHAKE_DESCRIPTOR: &str =
    "74696720697320676f6e6e61206b696c6c206d7920626f742e20736f20736164";
/// Capability query string of the desktop player.
const CAPABILITIES: &str = "A=t&SA=t&SV=t&EV=t&MP3=t&AE=t&VE=t&ACC=t&PR=t&SP=f&SB=f&DEB=f&V=LNX 29,0,0,140&M=Adobe Linux&R=1920x1080&COL=color&AR=1.0&OS=Linux&ARCH=x86&L=en&IME=t&PR32=t&PR64=t&LS=en-US&PT=Desktop&AVD=f&LFD=f&WD=f&TLS=t&ML=5.1&DP=72";

pub(crate) fn handshake(
    version: i16,
    locale: &str,
    connection_key: &str,
) -> Result<Vec<u8>, ProtocolError> {
    let mut p = ByteBuffer::new();
    p.write_i16(version)
        .write_str(locale)?
        .write_str(connection_key)?
        .write_str(PLATFORM)?
        .write_str("-")?
        .write_i32(0x1FBD)
        .write_str("")?
        .write_str(HANDSHAKE_DESCRIPTOR)?
        .write_str(CAPABILITIES)?
        .write_i32(0)
        .write_i32(0x1234)
        .write_str("")?;
    Ok(p.into_vec())
}

pub(crate) fn system_info(info: &SystemInfo) -> Result<Vec<u8>, ProtocolError> {
    let mut p = ByteBuffer::new();
    p.write_str(&info.language)?
        .write_str(&info.os)?
        .write_str(&info.flash_version)?;
    Ok(p.into_vec())
}

/// Login credentials. Sent under XXTEA.
pub(crate) fn login(
    nickname: &str,
    digest: &str,
    descriptor: &str,
    room: &str,
    token: u32,
) -> Result<Vec<u8>, ProtocolError> {
    let mut p = ByteBuffer::new();
    p.write_str(nickname)?
        .write_str(digest)?
        .write_str(descriptor)?
        .write_str(room)?
        .write_u32(token);
    Ok(p.into_vec())
}

/// First packet on a fresh room-server connection.
pub(crate) fn room_server_auth(timestamp: u32, player_id: u32, pcode: u32) -> Vec<u8> {
    let mut p = ByteBuffer::new();
    p.write_u32(timestamp).write_u32(player_id).write_u32(pcode);
    p.into_vec()
}

/// Community platform envelope: `i16 code | u32 request id | data`.
pub(crate) fn tribulle(code: i16, request_id: u32, data: &[u8]) -> Vec<u8> {
    let mut p = ByteBuffer::new();
    p.write_i16(code).write_u32(request_id).write_bytes(data);
    p.into_vec()
}

/// Whisper body, to be wrapped by [`tribulle`] with
/// [`platform_codes::SEND_WHISPER`].
pub(crate) fn whisper(nickname: &str, message: &str) -> Result<Vec<u8>, ProtocolError> {
    let mut p = ByteBuffer::new();
    p.write_str(&nickname.to_lowercase())?.write_str(message)?;
    Ok(p.into_vec())
}

pub(crate) const WHISPER_CODE: i16 = platform_codes::SEND_WHISPER as i16;

/// A single string: room chat and server commands.
pub(crate) fn text(message: &str) -> Result<Vec<u8>, ProtocolError> {
    let mut p = ByteBuffer::new();
    p.write_str(message)?;
    Ok(p.into_vec())
}

pub(crate) fn community(id: u8) -> Vec<u8> {
    vec![id, 0]
}

/// Longest script the 24-bit length prefix can describe.
const MAX_SCRIPT_LEN: usize = 0xFF_FFFF;

/// Script upload: a 24-bit length split as `u16 (len >> 8) | u8 (len & 255)`,
/// then the raw UTF-8 bytes.
pub(crate) fn load_lua(script: &str) -> Result<Vec<u8>, ProtocolError> {
    let bytes = script.as_bytes();
    let len = bytes.len();
    if len > MAX_SCRIPT_LEN {
        return Err(ProtocolError::ScriptTooLong(len));
    }
    let mut p = ByteBuffer::new();
    p.write_u16((len >> 8) as u16)
        .write_u8((len & 0xFF) as u8)
        .write_bytes(bytes);
    Ok(p.into_vec())
}
