//! Fixed 8-byte big-endian integer codec.
//!
//! The ledger stores counters and balances as 8-byte big-endian words. The
//! decoder has one quirk that must not be "fixed": a buffer longer than eight
//! bytes is not an error. Only its eight most significant bytes are read,
//! exactly like a fixed-size read over the front of the slice. Live state may
//! depend on it.

/// Encode a `u64` as 8 big-endian bytes.
pub fn encode_u64_be(value: u64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Encode an `i64` as 8 big-endian bytes (two's complement).
pub fn encode_i64_be(value: i64) -> [u8; 8] {
    value.to_be_bytes()
}

/// Decode a big-endian `u64`.
///
/// Inputs shorter than 8 bytes are left-padded with zeros. Inputs longer
/// than 8 bytes contribute only their first 8 bytes.
pub fn decode_u64_be(bytes: &[u8]) -> u64 {
    let mut word = [0u8; 8];
    if bytes.len() >= 8 {
        word.copy_from_slice(&bytes[..8]);
    } else {
        word[8 - bytes.len()..].copy_from_slice(bytes);
    }
    u64::from_be_bytes(word)
}

/// Decode a big-endian `i64` with the same padding and truncation rules as
/// [`decode_u64_be`].
pub fn decode_i64_be(bytes: &[u8]) -> i64 {
    decode_u64_be(bytes) as i64
}
