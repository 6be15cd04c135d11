//! # Checksum Addresses
//!
//! Every account and contract on the ledger is named by a textual address:
//!
//! ```text
//! address = chain_id ‖ base58( h ‖ checksum )
//! h        = RIPEMD160( SHA3-256( preimage ) )          (20 bytes)
//! checksum = RIPEMD160( h )[0..4]
//! ```
//!
//! The preimage is the Ed25519 public key for an account, or
//! `chain_id ‖ name ‖ version ‖ owner` for a contract. The checksum lets a
//! client reject a mistyped address locally, before it ever hits the chain.
//!
//! Nodes treat a body that is not valid base58 the same as an empty one, so
//! garbage and empty bodies both surface as [`AddressError::DecodeEmpty`].

use std::fmt;

use thiserror::Error;

use super::hash::{ripemd160, sha3_256, sha3_256_multi};
use super::keys::PublicKey;
use crate::config::{ChainContext, ADDRESS_CHECKSUM_LENGTH};

/// Why an address failed validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("address {address} does not start with chain id {chain_id}")]
    PrefixMismatch { chain_id: String, address: String },

    #[error("address body decodes to zero bytes")]
    DecodeEmpty,

    #[error("address checksum mismatch")]
    ChecksumMismatch,
}

/// A validated chain address.
///
/// Holding an `Address` means the prefix and checksum were verified against
/// some chain context, either because we derived it or because it passed
/// [`validate_address`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(String);

impl Address {
    /// Validate `text` against the active chain and wrap it.
    pub fn parse(ctx: &ChainContext, text: &str) -> Result<Self, AddressError> {
        validate_address(ctx.chain_id(), text)?;
        Ok(Self(text.to_string()))
    }

    /// Wrap text that is already known to be valid (e.g. decoded from a
    /// signature-verified payload). No checks are performed.
    pub fn new_unchecked(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// The decoded body (hash plus checksum) after validating against
    /// `chain_id`. This is what packed address lists carry.
    pub fn body(&self, chain_id: &str) -> Result<Vec<u8>, AddressError> {
        validate_address(chain_id, &self.0)?;
        let encoded = self.0.strip_prefix(chain_id).unwrap_or_default();
        bs58::decode(encoded)
            .into_vec()
            .map_err(|_| AddressError::DecodeEmpty)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// `chain_id ‖ base58(h2 ‖ RIPEMD160(h2)[0..4])` for a 20-byte body.
fn encode_with_checksum(chain_id: &str, h2: &[u8; 20]) -> Address {
    let checksum = ripemd160(h2);
    let mut body = Vec::with_capacity(h2.len() + ADDRESS_CHECKSUM_LENGTH);
    body.extend_from_slice(h2);
    body.extend_from_slice(&checksum[..ADDRESS_CHECKSUM_LENGTH]);
    Address(format!("{}{}", chain_id, bs58::encode(body).into_string()))
}

/// Derive the address of a contract deployed by `owner`.
///
/// `h1 = SHA3-256(chain_id ‖ name ‖ version ‖ owner)`. Same inputs, same
/// address, on every platform.
pub fn derive_contract_address(
    chain_id: &str,
    owner: &Address,
    contract_name: &str,
    version: &str,
) -> Address {
    let h1 = sha3_256_multi(&[
        chain_id.as_bytes(),
        contract_name.as_bytes(),
        version.as_bytes(),
        owner.as_str().as_bytes(),
    ]);
    encode_with_checksum(chain_id, &ripemd160(&h1))
}

/// Derive the account address controlled by an Ed25519 public key.
pub fn address_from_public_key(chain_id: &str, public_key: &PublicKey) -> Address {
    let h1 = sha3_256(public_key.as_bytes());
    encode_with_checksum(chain_id, &ripemd160(&h1))
}

/// Check an address's chain prefix and checksum.
///
/// The checksum is recomputed over every decoded byte except the last four,
/// so bodies of any length are accepted as long as they are self-consistent.
pub fn validate_address(chain_id: &str, address: &str) -> Result<(), AddressError> {
    let Some(encoded) = address.strip_prefix(chain_id) else {
        return Err(AddressError::PrefixMismatch {
            chain_id: chain_id.to_string(),
            address: address.to_string(),
        });
    };

    let decoded = bs58::decode(encoded).into_vec().unwrap_or_default();
    if decoded.is_empty() {
        return Err(AddressError::DecodeEmpty);
    }
    if decoded.len() < ADDRESS_CHECKSUM_LENGTH {
        return Err(AddressError::ChecksumMismatch);
    }

    let (body, checksum) = decoded.split_at(decoded.len() - ADDRESS_CHECKSUM_LENGTH);
    let expected = ripemd160(body);
    if checksum != &expected[..ADDRESS_CHECKSUM_LENGTH] {
        return Err(AddressError::ChecksumMismatch);
    }
    Ok(())
}
