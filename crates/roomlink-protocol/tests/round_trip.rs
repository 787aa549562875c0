//! Randomised round-trip checks for the codec and both ciphers.
//!
//! Fixed-seed RNG so a failure is reproducible.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use roomlink_protocol::{ByteBuffer, CipherKeys, CipherMethod, FrameDecoder};

fn rng() -> StdRng {
    StdRng::seed_from_u64(0x5EED)
}

fn random_keys(rng: &mut StdRng) -> CipherKeys {
    CipherKeys {
        identification: (0..4).map(|_| rng.random()).collect(),
        message: (0..rng.random_range(1..32)).map(|_| rng.random()).collect(),
    }
}

#[test]
fn test_xor_round_trips_random_payloads() {
    let mut rng = rng();
    for _ in 0..200 {
        let keys = random_keys(&mut rng);
        let len = rng.random_range(0..512);
        let payload: Vec<u8> = (0..len).map(|_| rng.random()).collect();
        let fingerprint = rng.random_range(0..100);

        let enc = keys.encrypt(CipherMethod::Xor, fingerprint, &payload).unwrap();
        assert_eq!(enc.len(), payload.len());
        let dec = keys.decrypt(CipherMethod::Xor, fingerprint, &enc).unwrap();
        assert_eq!(dec, payload);
    }
}

#[test]
fn test_xxtea_round_trips_random_payloads() {
    let mut rng = rng();
    for _ in 0..200 {
        let keys = random_keys(&mut rng);
        let len = rng.random_range(0..512);
        let payload: Vec<u8> = (0..len).map(|_| rng.random()).collect();

        let enc = keys.encrypt(CipherMethod::Xxtea, 0, &payload).unwrap();
        let dec = keys.decrypt(CipherMethod::Xxtea, 0, &enc).unwrap();

        // Decryption returns the zero-padded plaintext.
        assert!(dec.len() >= 8 && dec.len() % 4 == 0);
        assert_eq!(&dec[..payload.len()], &payload[..]);
        assert!(dec[payload.len()..].iter().all(|b| *b == 0));
    }
}

#[test]
fn test_codec_round_trips_mixed_fields() {
    let mut rng = rng();
    for _ in 0..100 {
        let a: u32 = rng.random();
        let b: i16 = rng.random();
        let c: bool = rng.random();
        let text: String = (0..rng.random_range(0..40))
            .map(|_| ['a', 'é', '語', '🐭', ' '][rng.random_range(0..5)])
            .collect();

        let mut out = ByteBuffer::new();
        out.write_u32(a).write_i16(b).write_bool(c);
        out.write_str(&text).unwrap();

        let mut r = ByteBuffer::from_vec(out.into_vec());
        assert_eq!(r.read_u32().unwrap(), a);
        assert_eq!(r.read_i16().unwrap(), b);
        assert_eq!(r.read_bool().unwrap(), c);
        assert_eq!(r.read_str().unwrap(), text);
        assert_eq!(r.remaining(), 0);
    }
}

#[test]
fn test_decoder_handles_random_chunking() {
    let mut rng = rng();
    let frames: Vec<Vec<u8>> = (0..30)
        .map(|i| {
            let len = rng.random_range(0..400);
            let payload: Vec<u8> = (0..len).map(|_| rng.random()).collect();
            roomlink_protocol::encode_server_frame(
                roomlink_protocol::Identifier(i),
                &payload,
            )
        })
        .collect();
    let wire: Vec<u8> = frames.concat();

    let mut dec = FrameDecoder::default();
    let mut got = Vec::new();
    let mut pos = 0;
    while pos < wire.len() {
        let step = rng.random_range(1..64).min(wire.len() - pos);
        dec.extend(&wire[pos..pos + step]);
        pos += step;
        while let Some(f) = dec.next_frame().unwrap() {
            got.push(f);
        }
    }

    assert_eq!(got.len(), frames.len());
    for (i, f) in got.iter().enumerate() {
        assert_eq!(u16::from_be_bytes([f[0], f[1]]), i as u16);
    }
}
