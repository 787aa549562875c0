//! The password digest sent with login.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::{Digest, Sha256};

const SALT: [u8; 32] = [
    0xf7, 0x1a, 0xa6, 0xde, 0x8f, 0x17, 0x76, 0xa8, 0x03, 0x9d, 0x32, 0xb8, 0xa1, 0x56, 0xb2, 0xa9,
    0x3e, 0xdd, 0x43, 0x9d, 0xc5, 0xdd, 0xce, 0x56, 0xd3, 0xb7, 0xa4, 0x05, 0x4a, 0x0d, 0x08, 0xb0,
];

/// Hashes a plaintext password into the form the login packet carries:
///
/// ```text
/// base64( sha256( hex(sha256(password)) ‖ SALT ) )
/// ```
///
/// The inner hex digest is lowercase ASCII.
pub fn password_digest(password: &str) -> String {
    let inner = Sha256::digest(password.as_bytes());
    let hex: String = inner.iter().map(|b| format!("{b:02x}")).collect();

    let mut hasher = Sha256::new();
    hasher.update(hex.as_bytes());
    hasher.update(SALT);
    STANDARD.encode(hasher.finalize())
}
