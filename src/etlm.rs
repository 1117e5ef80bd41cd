//! ETLM telemetry decryption and truncated-tag verification (§4.4.3).
//!
//! The wire protocol's EAX nonce is 6 bytes (4-byte counter ∥ 2-byte salt) and
//! its tag is truncated to 2 bytes. RustCrypto's `eax` crate fixes both the
//! nonce size (to the cipher's block size, 16 bytes for AES-128) and the tag
//! size at the type level, so neither fits through its `AeadInPlace`
//! interface. EAX is reproduced here directly over its two primitives —
//! CMAC/OMAC1 and CTR — the same way PyCryptodome builds it internally, which
//! lets both sizes be whatever the wire format needs.

use aes::Aes128;
use cmac::{Cmac, Mac};

use crate::key::aes_ecb_block_encrypt;
use crate::IdentityKey;

/// Decoded ETLM telemetry plaintext (§4.4.3 layout).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Telemetry {
    pub battery_mv: u16,
    pub temperature_c: f32,
    pub advertising_count: u32,
    pub uptime_s: u32,
}

/// Build the 6-byte EAX nonce: 4-byte big-endian counter ∥ 2-byte salt.
fn build_nonce(counter: u32, salt: &[u8; 2]) -> [u8; 6] {
    let mut nonce = [0u8; 6];
    nonce[0..4].copy_from_slice(&counter.to_be_bytes());
    nonce[4..6].copy_from_slice(salt);
    nonce
}

/// OMAC1 (CMAC) of `0x00..0x00 ++ tag_byte ++ message`, EAX's per-purpose MAC.
/// `tag_byte` is EAX's domain separator: 0 for the nonce, 1 for associated
/// data, 2 for the ciphertext.
fn omac(identity_key: &IdentityKey, tag_byte: u8, message: &[u8]) -> [u8; 16] {
    let mut mac =
        Cmac::<Aes128>::new_from_slice(identity_key).expect("identity key is always 16 bytes");
    let mut prefix = [0u8; 16];
    prefix[15] = tag_byte;
    mac.update(&prefix);
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// CTR-mode keystream for a single block, i.e. `AES_encrypt(counter_block)`.
/// The ETLM plaintext is always 12 bytes, well under one AES block, so EAX's
/// CTR stream never needs to advance past its first block here.
fn ctr_keystream(identity_key: &IdentityKey, counter_block: [u8; 16]) -> [u8; 16] {
    let mut block = counter_block;
    aes_ecb_block_encrypt(identity_key, &mut block);
    block
}

/// Attempt to decrypt and verify an ETLM payload.
///
/// Returns `None` if the truncated-tag comparison fails; the caller drops the
/// packet either way. EAX's tag depends only on the nonce, the (empty)
/// associated data, and the ciphertext, so it can be recomputed and checked
/// before ever touching the plaintext.
pub fn decrypt_and_verify(
    identity_key: &IdentityKey,
    counter: u32,
    ciphertext: &[u8; 12],
    salt: &[u8; 2],
    transmitted_tag: &[u8; 2],
) -> Option<Telemetry> {
    let nonce = build_nonce(counter, salt);
    let nonce_mac = omac(identity_key, 0, &nonce);
    let header_mac = omac(identity_key, 1, &[]);
    let ciphertext_mac = omac(identity_key, 2, ciphertext);

    let mut full_tag = [0u8; 16];
    for i in 0..16 {
        full_tag[i] = nonce_mac[i] ^ header_mac[i] ^ ciphertext_mac[i];
    }

    if full_tag[0..2] != *transmitted_tag {
        return None;
    }

    let keystream = ctr_keystream(identity_key, nonce_mac);
    let mut plaintext = [0u8; 12];
    for i in 0..12 {
        plaintext[i] = ciphertext[i] ^ keystream[i];
    }

    Some(parse_plaintext(&plaintext))
}

fn parse_plaintext(plaintext: &[u8; 12]) -> Telemetry {
    let battery_mv = u16::from_be_bytes([plaintext[0], plaintext[1]]);
    let temperature_q8_8 = i16::from_be_bytes([plaintext[2], plaintext[3]]);
    let advertising_count = u32::from_be_bytes([plaintext[4], plaintext[5], plaintext[6], plaintext[7]]);
    let uptime_s = u32::from_be_bytes([plaintext[8], plaintext[9], plaintext[10], plaintext[11]]);
    Telemetry {
        battery_mv,
        temperature_c: temperature_q8_8 as f32 / 256.0,
        advertising_count,
        uptime_s,
    }
}

/// Encrypt a telemetry plaintext into a transmittable ETLM payload (ciphertext,
/// salt, truncated tag). Only ever needed to build fixtures — the real
/// receiver surface and `inspect_tracker` both only ever decrypt — so this is
/// compiled for this crate's own tests and for `tests/scenarios.rs` (enabled
/// via the `test-support` feature) and nowhere else.
#[cfg(any(test, feature = "test-support"))]
pub fn encrypt(
    identity_key: &IdentityKey,
    counter: u32,
    salt: [u8; 2],
    telemetry: &Telemetry,
) -> ([u8; 12], [u8; 2], [u8; 2]) {
    let nonce = build_nonce(counter, &salt);
    let nonce_mac = omac(identity_key, 0, &nonce);
    let header_mac = omac(identity_key, 1, &[]);

    let fixed_temp = (telemetry.temperature_c * 256.0).round() as i16;
    let mut plaintext = [0u8; 12];
    plaintext[0..2].copy_from_slice(&telemetry.battery_mv.to_be_bytes());
    plaintext[2..4].copy_from_slice(&fixed_temp.to_be_bytes());
    plaintext[4..8].copy_from_slice(&telemetry.advertising_count.to_be_bytes());
    plaintext[8..12].copy_from_slice(&telemetry.uptime_s.to_be_bytes());

    let keystream = ctr_keystream(identity_key, nonce_mac);
    let mut ciphertext = [0u8; 12];
    for i in 0..12 {
        ciphertext[i] = plaintext[i] ^ keystream[i];
    }

    let ciphertext_mac = omac(identity_key, 2, &ciphertext);
    let mut full_tag = [0u8; 16];
    for i in 0..16 {
        full_tag[i] = nonce_mac[i] ^ header_mac[i] ^ ciphertext_mac[i];
    }
    let mut tag = [0u8; 2];
    tag.copy_from_slice(&full_tag[0..2]);

    (ciphertext, salt, tag)
}
