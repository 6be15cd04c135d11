//! # Keystore Cipher
//!
//! Password-based encryption for private key material at rest.
//!
//! ## Legacy format (read and write)
//!
//! ```text
//! key  = MD5( SHA3-256( salt ‖ password ‖ keyword ) )          16 bytes
//! blob = AES-128-ECB_key( magic(4) ‖ len_be(4) ‖ plaintext ‖ zero padding )
//! ```
//!
//! Every block is encrypted independently: no IV, no chaining, no
//! authentication, and a 256-bit digest squeezed through MD5 into a 128-bit
//! key. This is what every keystore file on disk today looks like, so it
//! stays readable, byte for byte. New code should not write it.
//!
//! ## v2 format (what [`seal`] writes)
//!
//! ```text
//! key  = SHA3-256( salt ‖ "KSv2" ‖ password ‖ keyword )        32 bytes
//! blob = "KSv2" ‖ nonce(12) ‖ AES-256-GCM_key( magic(4) ‖ len_be(4) ‖ plaintext, aad = "KSv2" )
//! ```
//!
//! Both formats frame the plaintext the same way; v2 needs no padding.
//!
//! [`decrypt`] accepts both. A blob is read as v2 when it starts with the
//! tag; if that fails and the blob is block-aligned it is retried as legacy,
//! since a legacy ciphertext can start with any four bytes.

use aes::cipher::{generic_array::GenericArray, BlockDecrypt, BlockEncrypt, KeyInit};
use aes::Aes128;
use aes_gcm::aead::{Aead, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;
use thiserror::Error;

use crate::config::{
    AES_NONCE_LENGTH, AES_TAG_LENGTH, CIPHER_BLOCK_SIZE, KEYSTORE_MAGIC, KEYSTORE_SALT,
    KEYSTORE_V2_TAG,
};
use crate::crypto::hash::{md5, sha3_256_multi};

/// Legacy header: 4 magic bytes plus a 4-byte big-endian length.
const HEADER_LENGTH: usize = 8;

/// Errors from keystore encryption and decryption.
///
/// `MagicMismatch` is what a wrong password looks like on a legacy blob,
/// `AuthenticationFailed` on a v2 blob. Neither says which byte was wrong.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("keystore blob is empty")]
    EmptyInput,

    #[error("keystore blob is {len} bytes, not a multiple of the 16-byte block size")]
    NotBlockAligned { len: usize },

    #[error("keystore magic mismatch: wrong password or corrupted blob")]
    MagicMismatch,

    #[error("keystore blob is too short for its declared length")]
    TooShort,

    #[error("keystore authentication failed: wrong password or corrupted blob")]
    AuthenticationFailed,

    #[error("keystore encryption failed")]
    EncryptFailed,

    #[error("plaintext of {len} bytes does not fit the 32-bit length prefix")]
    PlaintextTooLarge { len: usize },
}

/// `magic ‖ len_be ‖ plaintext`, the framing shared by both formats.
fn frame(plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
    let len = u32::try_from(plaintext.len())
        .map_err(|_| CipherError::PlaintextTooLarge { len: plaintext.len() })?;

    let mut buf = Vec::with_capacity(HEADER_LENGTH + plaintext.len() + CIPHER_BLOCK_SIZE);
    buf.extend_from_slice(&KEYSTORE_MAGIC);
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(plaintext);
    Ok(buf)
}

/// Check the magic and return exactly the declared number of bytes.
fn unframe(buf: &[u8]) -> Result<Vec<u8>, CipherError> {
    if buf.len() < KEYSTORE_MAGIC.len() || buf[..KEYSTORE_MAGIC.len()] != KEYSTORE_MAGIC {
        return Err(CipherError::MagicMismatch);
    }
    if buf.len() < HEADER_LENGTH {
        return Err(CipherError::TooShort);
    }

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&buf[KEYSTORE_MAGIC.len()..HEADER_LENGTH]);
    let len = u32::from_be_bytes(len_bytes) as usize;
    let body = &buf[HEADER_LENGTH..];
    if body.len() < len {
        return Err(CipherError::TooShort);
    }
    Ok(body[..len].to_vec())
}

/// Derive the legacy 128-bit key.
pub fn derive_key(password: &str, keyword: Option<&str>) -> [u8; 16] {
    let digest = sha3_256_multi(&[
        KEYSTORE_SALT,
        password.as_bytes(),
        keyword.unwrap_or_default().as_bytes(),
    ]);
    md5(&digest)
}

fn derive_key_v2(password: &str, keyword: Option<&str>) -> [u8; 32] {
    sha3_256_multi(&[
        KEYSTORE_SALT,
        &KEYSTORE_V2_TAG,
        password.as_bytes(),
        keyword.unwrap_or_default().as_bytes(),
    ])
}

/// Encrypt `plaintext` in the legacy format.
pub fn encrypt(
    plaintext: &[u8],
    password: &str,
    keyword: Option<&str>,
) -> Result<Vec<u8>, CipherError> {
    let mut buf = frame(plaintext)?;
    let padded = buf.len().div_ceil(CIPHER_BLOCK_SIZE) * CIPHER_BLOCK_SIZE;
    buf.resize(padded, 0);

    let key = derive_key(password, keyword);
    let cipher = Aes128::new(GenericArray::from_slice(&key));
    for block in buf.chunks_exact_mut(CIPHER_BLOCK_SIZE) {
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
    }
    Ok(buf)
}

/// Encrypt `plaintext` in the authenticated v2 format.
pub fn seal(
    plaintext: &[u8],
    password: &str,
    keyword: Option<&str>,
) -> Result<Vec<u8>, CipherError> {
    let key = derive_key_v2(password, keyword);
    let cipher =
        Aes256Gcm::new_from_slice(&key).map_err(|_| CipherError::EncryptFailed)?;

    let framed = frame(plaintext)?;
    let mut nonce_bytes = [0u8; AES_NONCE_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: &framed,
                aad: &KEYSTORE_V2_TAG,
            },
        )
        .map_err(|_| CipherError::EncryptFailed)?;

    let mut out = Vec::with_capacity(KEYSTORE_V2_TAG.len() + AES_NONCE_LENGTH + ciphertext.len());
    out.extend_from_slice(&KEYSTORE_V2_TAG);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

/// Decrypt a keystore blob in either format.
pub fn decrypt(blob: &[u8], password: &str, keyword: Option<&str>) -> Result<Vec<u8>, CipherError> {
    if blob.is_empty() {
        return Err(CipherError::EmptyInput);
    }
    if is_v2(blob) {
        match open_v2(blob, password, keyword) {
            Ok(plaintext) => return Ok(plaintext),
            Err(err) if blob.len() % CIPHER_BLOCK_SIZE != 0 => return Err(err),
            Err(_) => {}
        }
    }
    decrypt_legacy(blob, password, keyword)
}

/// `true` if the blob carries the v2 tag and is long enough to be one.
pub fn is_v2(blob: &[u8]) -> bool {
    blob.len() >= KEYSTORE_V2_TAG.len() + AES_NONCE_LENGTH + AES_TAG_LENGTH
        && blob.starts_with(&KEYSTORE_V2_TAG)
}

fn open_v2(blob: &[u8], password: &str, keyword: Option<&str>) -> Result<Vec<u8>, CipherError> {
    let body = &blob[KEYSTORE_V2_TAG.len()..];
    let (nonce_bytes, ciphertext) = body.split_at(AES_NONCE_LENGTH);
    let key = derive_key_v2(password, keyword);
    let cipher =
        Aes256Gcm::new_from_slice(&key).map_err(|_| CipherError::AuthenticationFailed)?;
    let framed = cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad: &KEYSTORE_V2_TAG,
            },
        )
        .map_err(|_| CipherError::AuthenticationFailed)?;
    unframe(&framed)
}

/// Decrypt a legacy blob. Exposed so callers can refuse v2 detection.
pub fn decrypt_legacy(
    blob: &[u8],
    password: &str,
    keyword: Option<&str>,
) -> Result<Vec<u8>, CipherError> {
    if blob.is_empty() {
        return Err(CipherError::EmptyInput);
    }
    if blob.len() % CIPHER_BLOCK_SIZE != 0 {
        return Err(CipherError::NotBlockAligned { len: blob.len() });
    }

    let key = derive_key(password, keyword);
    let cipher = Aes128::new(GenericArray::from_slice(&key));
    let mut buf = blob.to_vec();
    for block in buf.chunks_exact_mut(CIPHER_BLOCK_SIZE) {
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
    }

    unframe(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_roundtrip_at_block_boundaries() {
        for len in [0usize, 1, 7, 8, 15, 16, 17, 1000] {
            let plaintext: Vec<u8> = (0..len).map(|i| i as u8).collect();
            let blob = encrypt(&plaintext, "hunter2", Some("wallet")).unwrap();
            assert_eq!(blob.len() % CIPHER_BLOCK_SIZE, 0);
            assert_eq!(decrypt(&blob, "hunter2", Some("wallet")).unwrap(), plaintext);
        }
    }

    #[test]
    fn legacy_blob_has_minimal_padding() {
        // 8 header bytes + 8 plaintext bytes = exactly one block.
        assert_eq!(encrypt(&[0u8; 8], "pw", None).unwrap().len(), 16);
        assert_eq!(encrypt(&[0u8; 9], "pw", None).unwrap().len(), 32);
    }

    #[test]
    fn legacy_is_deterministic_and_unchained() {
        // ECB: identical plaintext blocks produce identical ciphertext blocks.
        let a = encrypt(&[0x41; 40], "pw", None).unwrap();
        let b = encrypt(&[0x41; 40], "pw", None).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[16..32], a[32..48]);
    }

    #[test]
    fn wrong_password_is_magic_mismatch() {
        let blob = encrypt(b"secret seed", "right", None).unwrap();
        assert_eq!(
            decrypt(&blob, "wrong", None),
            Err(CipherError::MagicMismatch)
        );
        assert_eq!(
            decrypt(&blob, "right", Some("kw")),
            Err(CipherError::MagicMismatch)
        );
    }

    #[test]
    fn framing_errors() {
        assert_eq!(decrypt(&[], "pw", None), Err(CipherError::EmptyInput));
        assert_eq!(
            decrypt(&[0u8; 15], "pw", None),
            Err(CipherError::NotBlockAligned { len: 15 })
        );
    }

    #[test]
    fn declared_length_beyond_blob_is_too_short() {
        let key = derive_key("pw", None);
        let cipher = Aes128::new(GenericArray::from_slice(&key));
        let mut block = [0u8; 16];
        block[..4].copy_from_slice(&KEYSTORE_MAGIC);
        block[4..8].copy_from_slice(&100u32.to_be_bytes());
        cipher.encrypt_block(GenericArray::from_mut_slice(&mut block));
        assert_eq!(decrypt(&block, "pw", None), Err(CipherError::TooShort));
    }

    #[test]
    fn derived_key_is_md5_of_sha3() {
        let expected = md5(&crate::crypto::hash::sha3_256(b"bcb-wallet-keystorepwkw"));
        assert_eq!(derive_key("pw", Some("kw")), expected);
    }

    #[test]
    fn v2_roundtrip_and_detection() {
        let blob = seal(b"ed25519 seed bytes", "pw", Some("kw")).unwrap();
        assert!(is_v2(&blob));
        assert_eq!(decrypt(&blob, "pw", Some("kw")).unwrap(), b"ed25519 seed bytes");
    }

    #[test]
    fn v2_encrypts_the_framed_plaintext() {
        let blob = seal(b"seed", "pw", Some("kw")).unwrap();
        assert_eq!(
            blob.len(),
            KEYSTORE_V2_TAG.len() + AES_NONCE_LENGTH + HEADER_LENGTH + 4 + AES_TAG_LENGTH
        );

        let key = derive_key_v2("pw", Some("kw"));
        let cipher = Aes256Gcm::new_from_slice(&key).unwrap();
        let (nonce, ciphertext) = blob[KEYSTORE_V2_TAG.len()..].split_at(AES_NONCE_LENGTH);
        let framed = cipher
            .decrypt(
                Nonce::from_slice(nonce),
                Payload {
                    msg: ciphertext,
                    aad: &KEYSTORE_V2_TAG,
                },
            )
            .unwrap();
        assert_eq!(&framed[..4], &KEYSTORE_MAGIC);
        assert_eq!(&framed[4..8], &4u32.to_be_bytes());
        assert_eq!(&framed[8..], b"seed");
    }

    #[test]
    fn v2_wrong_password_fails_authentication() {
        let blob = seal(b"seed", "pw", None).unwrap();
        let err = decrypt(&blob, "nope", None).unwrap_err();
        assert!(matches!(
            err,
            CipherError::AuthenticationFailed | CipherError::MagicMismatch
        ));
    }

    #[test]
    fn v2_tamper_is_detected() {
        let mut blob = seal(b"seed material", "pw", None).unwrap();
        let last = blob.len() - 1;
        blob[last] ^= 0x01;
        assert!(decrypt(&blob, "pw", None).is_err());
    }

    #[test]
    fn v2_uses_fresh_nonces() {
        let a = seal(b"same", "pw", None).unwrap();
        let b = seal(b"same", "pw", None).unwrap();
        assert_ne!(a, b);
    }
}
