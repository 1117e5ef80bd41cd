//! EID derivation (EidDeriver).
//!
//! Given a temporary key, the rotation exponent `K` and a counter with its
//! low `K` bits cleared, derive the 8-byte rotating identifier via a single
//! AES-128-ECB block, truncated to its first 8 bytes.

use crate::key::aes_ecb_block_encrypt;
use crate::Eid;

/// Derive the EID at `counter` (low `exponent` bits must already be zero) using
/// the temporary key for that counter's epoch.
///
/// Plaintext layout: 11 zero bytes, `exponent`, `counter` (big-endian, 4 bytes).
pub fn derive_eid(temporary_key: &[u8; 16], exponent: u8, counter: u32) -> Eid {
    let mut plaintext = [0u8; 16];
    plaintext[11] = exponent;
    plaintext[12..16].copy_from_slice(&counter.to_be_bytes());
    aes_ecb_block_encrypt(temporary_key, &mut plaintext);
    let mut eid = [0u8; 8];
    eid.copy_from_slice(&plaintext[0..8]);
    eid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::derive_temporary_key;
    use crate::IdentityKey;

    const IDENTITY_KEY_1: IdentityKey = [
        0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90, 0x12, 0x34, 0x56, 0x78, 0x90,
        0x12,
    ];
    const K: u8 = 15;

    #[test]
    fn eid_at_count_zero() {
        let tk = derive_temporary_key(&IDENTITY_KEY_1, 0);
        let eid = derive_eid(&tk, K, 0);
        assert_eq!(eid, [0xB1, 0xDC, 0x36, 0x0A, 0x2D, 0xD3, 0xDF, 0x22]);
    }

    #[test]
    fn eid_at_count_0xfffe8000() {
        let tk = derive_temporary_key(&IDENTITY_KEY_1, (0xFFFE_8000u32 >> 16) as u16);
        let eid = derive_eid(&tk, K, 0xFFFE_8000);
        assert_eq!(eid, [0x6C, 0x37, 0x71, 0x3D, 0x94, 0xE9, 0x63, 0x69]);
    }

    #[test]
    fn eid_at_count_0x00018000() {
        let tk = derive_temporary_key(&IDENTITY_KEY_1, (0x0001_8000u32 >> 16) as u16);
        let eid = derive_eid(&tk, K, 0x0001_8000);
        assert_eq!(eid, [0x04, 0xE0, 0x40, 0x3C, 0xC6, 0x1F, 0xB6, 0xC9]);
    }

    #[test]
    fn eid_depends_only_on_key_exponent_and_counter() {
        let tk = derive_temporary_key(&IDENTITY_KEY_1, 0);
        let a = derive_eid(&tk, K, 0x8000);
        let b = derive_eid(&tk, K, 0x8000);
        assert_eq!(a, b);
    }
}
