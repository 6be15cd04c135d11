//! Envelope framing and verification.
//!
//! ```text
//! {chain_id}<tx>.v1.{base58(payload)}.<1>.{base58(sig_info)}
//! {chain_id}<qy>.v1.{base58(payload)}.<1>.{base58(sig_info)}
//! ```
//!
//! Opening an envelope runs strictly in this order:
//!
//! 1. split on `.` into exactly five fields;
//! 2. compare the three literal fields;
//! 3. base58-decode payload and signature segments;
//! 4. decode the signature record;
//! 5. verify the signature over the raw payload bytes;
//! 6. only then decode the payload.
//!
//! Step 6 never runs on unauthenticated bytes. A tampered payload fails at
//! step 5, not inside the RLP decoder.

use rlp::{Decodable, Encodable};
use thiserror::Error;

use super::types::Ed25519SigInfo;
use crate::codec::{decode_exact, EncodeError};
use crate::config::{
    ChainContext, ENVELOPE_FIELD_COUNT, ENVELOPE_SEPARATOR, ENVELOPE_VERSION, QUERY_TAG,
    SIGNER_COUNT, TX_TAG,
};
use crate::crypto::address::{address_from_public_key, Address, AddressError};
use crate::crypto::signatures::verify_raw;
use crate::keystore::manager::{KeyManager, KeyManagerError, SigningKeyRef};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Caller-supplied input that failed validation before anything was built.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    #[error("invalid nonce {0:?}: expected a hex-encoded unsigned integer")]
    BadNonce(String),

    #[error("invalid gas limit {0:?}: expected a hex-encoded unsigned integer")]
    BadGasLimit(String),

    #[error("invalid method selector {0:?}: expected 4 hex-encoded bytes")]
    BadSelector(String),

    #[error("note is {len} characters, the limit is {max}")]
    NoteTooLong { len: usize, max: usize },

    #[error("invalid destination address: {0}")]
    BadDestination(#[from] AddressError),

    #[error("invalid call parameter: {0}")]
    BadParameter(#[from] EncodeError),

    #[error("query key must not be empty")]
    EmptyQueryKey,
}

/// Everything that can go wrong building or opening an envelope.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("envelope frame error: {0}")]
    FrameFormat(String),

    #[error("envelope signature is invalid")]
    SignatureInvalid,

    #[error("binary decode error: {0}")]
    BinaryDecode(String),

    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("signing failed: {0}")]
    Signing(#[from] KeyManagerError),
}

impl From<rlp::DecoderError> for EnvelopeError {
    fn from(err: rlp::DecoderError) -> Self {
        EnvelopeError::BinaryDecode(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Envelope kinds
// ---------------------------------------------------------------------------

/// Which record an envelope carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    Transaction,
    Query,
}

impl EnvelopeKind {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Transaction => TX_TAG,
            Self::Query => QUERY_TAG,
        }
    }

    /// The MAC literal for this kind on the given chain.
    pub fn mac(self, ctx: &ChainContext) -> String {
        match self {
            Self::Transaction => ctx.tx_mac(),
            Self::Query => ctx.query_mac(),
        }
    }
}

// ---------------------------------------------------------------------------
// Build side
// ---------------------------------------------------------------------------

/// Serialize `record`, sign it through the key manager and frame the result.
pub fn seal<T: Encodable>(
    ctx: &ChainContext,
    kind: EnvelopeKind,
    record: &T,
    keys: &dyn KeyManager,
    key: &SigningKeyRef,
) -> Result<String, EnvelopeError> {
    let payload = rlp::encode(record).to_vec();
    let sig_info = keys.sign(key.name(), key.passphrase(), &payload)?;
    Ok(frame(ctx, kind, &payload, &sig_info))
}

/// Join already-signed parts into envelope text.
pub fn frame(
    ctx: &ChainContext,
    kind: EnvelopeKind,
    payload: &[u8],
    sig_info: &Ed25519SigInfo,
) -> String {
    let sig_bytes = rlp::encode(sig_info);
    [
        kind.mac(ctx),
        ENVELOPE_VERSION.to_string(),
        bs58::encode(payload).into_string(),
        SIGNER_COUNT.to_string(),
        bs58::encode(&sig_bytes[..]).into_string(),
    ]
    .join(&ENVELOPE_SEPARATOR.to_string())
}

// ---------------------------------------------------------------------------
// Parse side
// ---------------------------------------------------------------------------

/// An envelope whose signature has been verified but whose payload has not
/// been decoded yet.
#[derive(Debug, Clone)]
pub struct VerifiedEnvelope {
    /// Raw, authenticated payload bytes.
    pub payload: Vec<u8>,
    /// The signer's key and signature.
    pub sig_info: Ed25519SigInfo,
}

impl VerifiedEnvelope {
    /// Address of the verified signer on the given chain.
    pub fn signer(&self, ctx: &ChainContext) -> Address {
        address_from_public_key(ctx.chain_id(), &self.sig_info.public_key)
    }

    /// Decode the authenticated payload.
    pub fn decode<T: Decodable>(&self) -> Result<T, EnvelopeError> {
        Ok(decode_exact(&self.payload)?)
    }
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>, EnvelopeError> {
    bs58::decode(segment)
        .into_vec()
        .map_err(|e| EnvelopeError::BinaryDecode(format!("{} segment: {}", name, e)))
}

/// Split, check literals and verify the signature. Does not decode the payload.
pub fn open(
    ctx: &ChainContext,
    kind: EnvelopeKind,
    text: &str,
) -> Result<VerifiedEnvelope, EnvelopeError> {
    let fields: Vec<&str> = text.split(ENVELOPE_SEPARATOR).collect();
    if fields.len() != ENVELOPE_FIELD_COUNT {
        return Err(EnvelopeError::FrameFormat(format!(
            "expected {} fields, got {}",
            ENVELOPE_FIELD_COUNT,
            fields.len()
        )));
    }

    let mac = kind.mac(ctx);
    if fields[0] != mac {
        return Err(EnvelopeError::FrameFormat(format!(
            "mac {:?} does not match {:?}",
            fields[0], mac
        )));
    }
    if fields[1] != ENVELOPE_VERSION {
        return Err(EnvelopeError::FrameFormat(format!(
            "unsupported version {:?}",
            fields[1]
        )));
    }
    if fields[3] != SIGNER_COUNT {
        return Err(EnvelopeError::FrameFormat(format!(
            "unsupported signer count {:?}",
            fields[3]
        )));
    }

    let payload = decode_segment("payload", fields[2])?;
    let sig_bytes = decode_segment("signature", fields[4])?;
    let sig_info: Ed25519SigInfo = decode_exact(&sig_bytes)?;

    verify_raw(
        sig_info.public_key.as_bytes(),
        &payload,
        sig_info.signature.as_bytes(),
    )
    .map_err(|_| EnvelopeError::SignatureInvalid)?;

    Ok(VerifiedEnvelope { payload, sig_info })
}

/// Open an envelope and decode its payload as `T`, returning the signer.
pub fn open_as<T: Decodable>(
    ctx: &ChainContext,
    kind: EnvelopeKind,
    text: &str,
) -> Result<(Address, T), EnvelopeError> {
    let envelope = open(ctx, kind, text)?;
    let record = envelope.decode()?;
    Ok((envelope.signer(ctx), record))
}
