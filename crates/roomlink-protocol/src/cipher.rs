//! Keyed payload transforms.
//!
//! Two ciphers exist and each outbound call site picks one (or none):
//!
//! - [`CipherMethod::Xor`]: a keystream xor over the message keys,
//!   offset by the channel fingerprint. Used for chat, commands and the
//!   community platform.
//! - [`CipherMethod::Xxtea`]: XXTEA over big-endian 32-bit words, keyed by
//!   the identification keys. Used only for login credentials.
//!
//! Only the payload is transformed. The identifier and the stream framing
//! stay readable so the server can route before decrypting. There is no
//! checksum anywhere: a single wrong byte silently desynchronizes the
//! session, so these functions must match the server bit for bit.

use crate::ProtocolError;

/// XXTEA key schedule constant.
const DELTA: u32 = 0x9E37_79B9;

/// Smallest XXTEA plaintext, in bytes (two words).
const XXTEA_MIN_LEN: usize = 8;

/// Which transform an outbound packet goes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CipherMethod {
    /// Sent as-is.
    #[default]
    None,
    /// Fingerprint-offset xor over the message keys.
    Xor,
    /// XXTEA over the identification keys.
    Xxtea,
}

/// Key material handed out by the bootstrap step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CipherKeys {
    /// Identification keys; the first four form the XXTEA key.
    pub identification: Vec<u32>,
    /// Message keys; the low byte of each is one keystream byte.
    pub message: Vec<u32>,
}

impl CipherKeys {
    /// Applies `method` to an outbound payload.
    ///
    /// `fingerprint` is the channel fingerprint the packet will be framed
    /// with; only the xor transform uses it.
    pub fn encrypt(
        &self,
        method: CipherMethod,
        fingerprint: u8,
        payload: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        match method {
            CipherMethod::None => Ok(payload.to_vec()),
            CipherMethod::Xor => xor(payload, &self.message, fingerprint),
            CipherMethod::Xxtea => xxtea_encrypt(payload, &self.identification),
        }
    }

    /// Reverses [`encrypt`](Self::encrypt).
    ///
    /// XXTEA output keeps the zero padding added on the way in; the wire
    /// format does not record the plaintext length.
    pub fn decrypt(
        &self,
        method: CipherMethod,
        fingerprint: u8,
        payload: &[u8],
    ) -> Result<Vec<u8>, ProtocolError> {
        match method {
            CipherMethod::None => Ok(payload.to_vec()),
            CipherMethod::Xor => xor(payload, &self.message, fingerprint),
            CipherMethod::Xxtea => xxtea_decrypt(payload, &self.identification),
        }
    }
}

// ---------------------------------------------------------------------------
// xor
// ---------------------------------------------------------------------------

/// Xors `payload` against the message-key stream. Self-inverse.
///
/// Byte `i` uses key index `(fingerprint + 1 + i) % keys.len()`.
pub fn xor(payload: &[u8], keys: &[u32], fingerprint: u8) -> Result<Vec<u8>, ProtocolError> {
    if keys.is_empty() {
        return Err(ProtocolError::InvalidKey("message key list is empty".into()));
    }
    let mut index = fingerprint as usize;
    Ok(payload
        .iter()
        .map(|byte| {
            index = (index + 1) % keys.len();
            byte ^ keys[index] as u8
        })
        .collect())
}

// ---------------------------------------------------------------------------
// xxtea
// ---------------------------------------------------------------------------

fn xxtea_key(keys: &[u32]) -> Result<[u32; 4], ProtocolError> {
    match keys {
        [a, b, c, d, ..] => Ok([*a, *b, *c, *d]),
        _ => Err(ProtocolError::InvalidKey(format!(
            "xxtea needs 4 identification keys, got {}",
            keys.len()
        ))),
    }
}

/// Encrypts `payload`, returning `u16 word count | words (BE)`.
pub fn xxtea_encrypt(payload: &[u8], keys: &[u32]) -> Result<Vec<u8>, ProtocolError> {
    let key = xxtea_key(keys)?;

    let mut padded = payload.to_vec();
    while padded.len() < XXTEA_MIN_LEN || padded.len() % 4 != 0 {
        padded.push(0);
    }
    let mut words: Vec<u32> = padded
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let count = u16::try_from(words.len())
        .map_err(|_| ProtocolError::InvalidKey("payload too large for xxtea".into()))?;

    encrypt_words(&mut words, &key);

    let mut out = Vec::with_capacity(2 + words.len() * 4);
    out.extend_from_slice(&count.to_be_bytes());
    for w in words {
        out.extend_from_slice(&w.to_be_bytes());
    }
    Ok(out)
}

/// Decrypts output of [`xxtea_encrypt`]; padding is kept.
pub fn xxtea_decrypt(ciphertext: &[u8], keys: &[u32]) -> Result<Vec<u8>, ProtocolError> {
    let key = xxtea_key(keys)?;

    let [hi, lo, body @ ..] = ciphertext else {
        return Err(ProtocolError::BadCiphertext("missing word count".into()));
    };
    let count = u16::from_be_bytes([*hi, *lo]) as usize;
    if count < 2 || body.len() != count * 4 {
        return Err(ProtocolError::BadCiphertext(format!(
            "word count {count} does not match {} body bytes",
            body.len()
        )));
    }

    let mut words: Vec<u32> = body
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    decrypt_words(&mut words, &key);
    Ok(words.iter().flat_map(|w| w.to_be_bytes()).collect())
}

#[inline]
fn mx(sum: u32, y: u32, z: u32, p: usize, e: u32, key: &[u32; 4]) -> u32 {
    (((z >> 5) ^ (y << 2)).wrapping_add((y >> 3) ^ (z << 4)))
        ^ ((sum ^ y).wrapping_add(key[(p & 3) ^ e as usize] ^ z))
}

fn encrypt_words(v: &mut [u32], key: &[u32; 4]) {
    let n = v.len();
    if n < 2 {
        return;
    }
    let mut rounds = 6 + 52 / n;
    let mut sum: u32 = 0;
    let mut z = v[n - 1];
    while rounds > 0 {
        sum = sum.wrapping_add(DELTA);
        let e = (sum >> 2) & 3;
        for p in 0..n {
            let y = v[(p + 1) % n];
            v[p] = v[p].wrapping_add(mx(sum, y, z, p, e, key));
            z = v[p];
        }
        rounds -= 1;
    }
}

fn decrypt_words(v: &mut [u32], key: &[u32; 4]) {
    let n = v.len();
    if n < 2 {
        return;
    }
    let rounds = 6 + 52 / n;
    let mut sum = (rounds as u32).wrapping_mul(DELTA);
    let mut y = v[0];
    for _ in 0..rounds {
        let e = (sum >> 2) & 3;
        for p in (0..n).rev() {
            let z = v[(p + n - 1) % n];
            v[p] = v[p].wrapping_sub(mx(sum, y, z, p, e, key));
            y = v[p];
        }
        sum = sum.wrapping_sub(DELTA);
    }
}
