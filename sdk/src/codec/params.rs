//! # Call Parameter Codec
//!
//! Contract call arguments travel as an ordered list of byte strings, RLP
//! encoded. Callers hand us text; each item is turned into bytes by a simple
//! rule:
//!
//! | Item shape            | Bytes                                          |
//! |-----------------------|------------------------------------------------|
//! | `0x<hex>`             | hex-decoded value                              |
//! | `0x<hex>,0x<hex>,...` | concatenation of every hex-decoded piece       |
//! | anything else         | raw UTF-8                                      |
//!
//! The comma form packs address lists: each piece is the 24-byte decoded
//! body of one address, and the contract slices them back apart.
//!
//! Decoding is the easy half structurally and the fiddly half semantically:
//! the list itself is generic, but each field has its own interpretation.
//! [`ParamItems`] carries the accessors, and every one of them bounds-checks
//! before indexing.

use primitive_types::U256;
use rlp::{Rlp, RlpStream};
use thiserror::Error;

use super::int::decode_u64_be;
use super::check_exact;
use crate::config::{ADDRESS_CHECKSUM_LENGTH, ADDRESS_HASH_LENGTH, HEX_PREFIX};
use crate::crypto::address::Address;

/// Width of a packed address body inside an address list.
pub const PACKED_ADDRESS_LENGTH: usize = ADDRESS_HASH_LENGTH + ADDRESS_CHECKSUM_LENGTH;

/// Errors while turning text items into bytes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("item {index} is not valid hex: {reason}")]
    InvalidHex { index: usize, reason: String },
}

/// Errors while decoding a parameter list or interpreting one of its fields.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed parameter list: {0}")]
    MalformedList(String),

    #[error("too few parameters: expected at least {expected}, got {got}")]
    TooFewItems { expected: usize, got: usize },

    #[error("field {index} is {len} bytes, wider than {max}")]
    FieldTooLong { index: usize, len: usize, max: usize },

    #[error("field {index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },

    #[error("field {index} is {len} bytes, not a multiple of {width}")]
    Misaligned { index: usize, len: usize, width: usize },
}

impl From<rlp::DecoderError> for DecodeError {
    fn from(err: rlp::DecoderError) -> Self {
        DecodeError::MalformedList(err.to_string())
    }
}

/// Turn one text item into its wire bytes.
pub fn encode_item(index: usize, item: &str) -> Result<Vec<u8>, EncodeError> {
    let hex_err = |e: hex::FromHexError| EncodeError::InvalidHex {
        index,
        reason: e.to_string(),
    };

    let Some(body) = item.strip_prefix(HEX_PREFIX) else {
        return Ok(item.as_bytes().to_vec());
    };

    if !item.contains(',') {
        return hex::decode(body).map_err(hex_err);
    }

    let mut packed = Vec::new();
    for piece in item.split(',') {
        let piece = piece.strip_prefix(HEX_PREFIX).unwrap_or(piece);
        packed.extend(hex::decode(piece).map_err(hex_err)?);
    }
    Ok(packed)
}

/// RLP-encode an already-converted list of byte strings.
pub fn encode_byte_list<B: AsRef<[u8]>>(items: &[B]) -> Vec<u8> {
    let mut stream = RlpStream::new_list(items.len());
    for item in items {
        stream.append(&item.as_ref().to_vec());
    }
    stream.out().to_vec()
}

/// Encode an ordered list of text items into the binary parameter list.
pub fn encode_items<S: AsRef<str>>(items: &[S]) -> Result<Vec<u8>, EncodeError> {
    let converted = items
        .iter()
        .enumerate()
        .map(|(i, item)| encode_item(i, item.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(encode_byte_list(&converted))
}

/// Decode a binary parameter list.
pub fn decode_items(data: &[u8]) -> Result<ParamItems, DecodeError> {
    let rlp = Rlp::new(data);
    if !rlp.is_list() {
        return Err(DecodeError::MalformedList("not a list".to_string()));
    }
    check_exact(&rlp, data)?;
    let items = rlp.as_list::<Vec<u8>>()?;
    Ok(ParamItems { items })
}

// ---------------------------------------------------------------------------
// ParamItems
// ---------------------------------------------------------------------------

/// A decoded parameter list with field-specific accessors.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamItems {
    items: Vec<Vec<u8>>,
}

impl ParamItems {
    pub fn new(items: Vec<Vec<u8>>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_inner(self) -> Vec<Vec<u8>> {
        self.items
    }

    /// Fail unless at least `n` items are present. Call this once up front
    /// and the per-field accessors can't fail on bounds.
    pub fn require(&self, n: usize) -> Result<(), DecodeError> {
        if self.items.len() < n {
            return Err(DecodeError::TooFewItems {
                expected: n,
                got: self.items.len(),
            });
        }
        Ok(())
    }

    /// Raw bytes of field `index`.
    pub fn bytes(&self, index: usize) -> Result<&[u8], DecodeError> {
        self.items
            .get(index)
            .map(Vec::as_slice)
            .ok_or(DecodeError::TooFewItems {
                expected: index + 1,
                got: self.items.len(),
            })
    }

    /// Field `index` as a UTF-8 string.
    pub fn string(&self, index: usize) -> Result<String, DecodeError> {
        let raw = self.bytes(index)?;
        String::from_utf8(raw.to_vec()).map_err(|_| DecodeError::InvalidUtf8 { index })
    }

    /// Field `index` as an unsigned big integer (big-endian), rendered as
    /// decimal text. Values above 256 bits are rejected.
    pub fn big_uint(&self, index: usize) -> Result<String, DecodeError> {
        let raw = self.bytes(index)?;
        if raw.len() > 32 {
            return Err(DecodeError::FieldTooLong {
                index,
                len: raw.len(),
                max: 32,
            });
        }
        Ok(U256::from_big_endian(raw).to_string())
    }

    /// Field `index` as a fixed-width unsigned integer of `width` bytes
    /// (at most 8). The source may be shorter than the word, never longer.
    pub fn uint(&self, index: usize, width: usize) -> Result<u64, DecodeError> {
        let raw = self.bytes(index)?;
        let max = width.min(8);
        if raw.len() > max {
            return Err(DecodeError::FieldTooLong {
                index,
                len: raw.len(),
                max,
            });
        }
        Ok(decode_u64_be(raw))
    }

    pub fn u64(&self, index: usize) -> Result<u64, DecodeError> {
        self.uint(index, 8)
    }

    pub fn u32(&self, index: usize) -> Result<u32, DecodeError> {
        self.uint(index, 4).map(|v| v as u32)
    }

    pub fn u16(&self, index: usize) -> Result<u16, DecodeError> {
        self.uint(index, 2).map(|v| v as u16)
    }

    pub fn u8(&self, index: usize) -> Result<u8, DecodeError> {
        self.uint(index, 1).map(|v| v as u8)
    }

    /// Field `index` as a one-byte boolean. Any non-zero byte is `true`.
    pub fn bool(&self, index: usize) -> Result<bool, DecodeError> {
        self.uint(index, 1).map(|v| v != 0)
    }

    /// Field `index` as a packed address list: consecutive 24-byte address
    /// bodies, each re-prefixed with `chain_id`.
    pub fn address_list(&self, index: usize, chain_id: &str) -> Result<Vec<Address>, DecodeError> {
        let raw = self.bytes(index)?;
        if raw.len() % PACKED_ADDRESS_LENGTH != 0 {
            return Err(DecodeError::Misaligned {
                index,
                len: raw.len(),
                width: PACKED_ADDRESS_LENGTH,
            });
        }
        Ok(raw
            .chunks(PACKED_ADDRESS_LENGTH)
            .map(|body| {
                Address::new_unchecked(format!("{}{}", chain_id, bs58::encode(body).into_string()))
            })
            .collect())
    }
}
