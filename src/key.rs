//! Temporary-key derivation (KeyDeriver).
//!
//! Eddystone-EID rotates a 16-byte "temporary key" once per 2^16 seconds. The
//! temporary key is derived from the device's identity key and the upper 16
//! bits of the counter via a single AES-128-ECB block.

use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockEncrypt, KeyInit};
use aes::Aes128;

use crate::IdentityKey;

/// Encrypt a single 16-byte block in place using AES-128-ECB (no padding, no IV).
pub(crate) fn aes_ecb_block_encrypt(key: &IdentityKey, block: &mut [u8; 16]) {
    let cipher = Aes128::new(GenericArray::from_slice(key));
    let mut ba = GenericArray::clone_from_slice(block);
    cipher.encrypt_block(&mut ba);
    block.copy_from_slice(&ba);
}

/// Derive the temporary key for the given upper 16 bits of the counter.
///
/// Plaintext layout: 11 zero bytes, `0xFF`, 2 zero bytes, `upper_count` (big-endian).
pub fn derive_temporary_key(identity_key: &IdentityKey, upper_count: u16) -> [u8; 16] {
    let mut plaintext = [0u8; 16];
    plaintext[11] = 0xFF;
    plaintext[14..16].copy_from_slice(&upper_count.to_be_bytes());
    aes_ecb_block_encrypt(identity_key, &mut plaintext);
    plaintext
}

/// The upper 16 bits of a counter select which temporary-key epoch it falls in.
pub fn upper_count(counter: u32) -> u16 {
    (counter >> 16) as u16
}
