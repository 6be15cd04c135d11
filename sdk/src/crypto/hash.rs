//! # Hashing Utilities
//!
//! The three hash functions the ledger's wire format is built on. We don't
//! get to choose them; they were chosen for us when the chain launched.
//!
//! - **SHA3-256**: method selectors, address derivation, keystore keys.
//! - **RIPEMD-160**: the 20-byte address body and its checksum.
//! - **MD5**: narrows the keystore digest to an AES-128 key. Yes, really.
//!   It stays for compatibility with keystore files already on disk and
//!   nowhere else.

use md5::Md5;
use ripemd::Ripemd160;
use sha3::{Digest, Sha3_256};

use crate::config::SELECTOR_LENGTH;

/// Compute the SHA3-256 hash of the input data.
///
/// # Example
///
/// ```
/// use bcb_sdk::crypto::hash::sha3_256;
///
/// let hash = sha3_256(b"bcb");
/// assert_eq!(hash.len(), 32);
/// ```
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA3-256 over several slices fed in sequence, without concatenating them
/// into a temporary buffer first.
pub fn sha3_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Compute the RIPEMD-160 hash of the input data.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the MD5 digest of the input data.
///
/// Only the legacy keystore key derivation calls this. Do not reach for it
/// anywhere else.
pub fn md5(data: &[u8]) -> [u8; 16] {
    let mut hasher = Md5::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute a 4-byte method selector from a textual prototype.
///
/// The selector is the first four bytes of `SHA3-256(prototype)`. Senders use
/// it to tag a call and contracts use it to dispatch, so the prototype text
/// must match byte for byte, spacing included.
///
/// ```
/// use bcb_sdk::crypto::hash::{method_selector, sha3_256};
///
/// let proto = "Transfer(smc.Address,big.Int)smc.Error";
/// assert_eq!(method_selector(proto), sha3_256(proto.as_bytes())[..4]);
/// ```
pub fn method_selector(prototype: &str) -> [u8; SELECTOR_LENGTH] {
    let digest = sha3_256(prototype.as_bytes());
    let mut selector = [0u8; SELECTOR_LENGTH];
    selector.copy_from_slice(&digest[..SELECTOR_LENGTH]);
    selector
}

/// The selector as the big-endian `u32` carried in a `MethodCall`.
pub fn method_id(prototype: &str) -> u32 {
    u32::from_be_bytes(method_selector(prototype))
}
