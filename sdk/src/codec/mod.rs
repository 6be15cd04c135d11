//! # Binary Codecs
//!
//! The ledger's binary list encoding is RLP: parameter lists, method calls,
//! transaction records and signature records all use it.
//!
//! ```text
//! int.rs     fixed 8-byte big-endian integers (with the legacy long-input quirk)
//! params.rs  text call arguments <-> RLP byte-string list
//! ```

pub mod int;
pub mod params;

pub use int::{decode_i64_be, decode_u64_be, encode_i64_be, encode_u64_be};
pub use params::{decode_items, encode_items, DecodeError, EncodeError, ParamItems};

use rlp::{DecoderError, Rlp};

/// Reject trailing bytes after the top-level RLP item.
///
/// `rlp` happily decodes a prefix of the buffer. For signed payloads a
/// prefix match is not good enough, so every top-level decode goes through
/// this first.
pub(crate) fn check_exact(rlp: &Rlp<'_>, data: &[u8]) -> Result<(), DecoderError> {
    let info = rlp.payload_info()?;
    if info.header_len + info.value_len != data.len() {
        return Err(DecoderError::Custom("trailing bytes after rlp item"));
    }
    Ok(())
}

/// Decode a top-level RLP item, rejecting trailing bytes.
pub(crate) fn decode_exact<T: rlp::Decodable>(data: &[u8]) -> Result<T, DecoderError> {
    let rlp = Rlp::new(data);
    check_exact(&rlp, data)?;
    T::decode(&rlp)
}
