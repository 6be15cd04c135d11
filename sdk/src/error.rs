//! Crate-level error type.
//!
//! Each module returns its own error enum. [`SdkError`] is the one to use
//! when a caller wants a single type across modules, and [`SdkError::kind`]
//! folds every variant onto a small, stable taxonomy for matching.

use thiserror::Error;

use crate::codec::{DecodeError, EncodeError};
use crate::config::ConfigError;
use crate::crypto::{AddressError, KeyError, SignatureError};
use crate::keystore::{CipherError, KeyManagerError};
use crate::network::{ClientError, FailoverError};
use crate::transaction::{EnvelopeError, InputError};

/// Coarse error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Envelope shape or literal field mismatch.
    FrameFormat,
    /// Address prefix, encoding or checksum failure.
    AddressChecksum,
    SignatureInvalid,
    /// Malformed or truncated binary payload.
    BinaryDecode,
    /// Too few call arguments, or a field wider than its type.
    ParameterBounds,
    /// Keystore blob could not be decrypted.
    Cipher,
    /// Every configured node failed.
    NetworkExhausted,
    /// Caller-supplied field rejected before anything was built.
    InvalidInput,
    /// The key manager could not find, unlock or use a key.
    KeyManagement,
    Config,
}

#[derive(Debug, Error)]
pub enum SdkError {
    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    KeyManager(#[from] KeyManagerError),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<FailoverError> for SdkError {
    fn from(err: FailoverError) -> Self {
        SdkError::Client(ClientError::Exhausted(err))
    }
}

impl From<InputError> for SdkError {
    fn from(err: InputError) -> Self {
        SdkError::Envelope(EnvelopeError::InvalidInput(err))
    }
}

fn decode_kind(err: &DecodeError) -> ErrorKind {
    match err {
        DecodeError::TooFewItems { .. } | DecodeError::FieldTooLong { .. } => {
            ErrorKind::ParameterBounds
        }
        _ => ErrorKind::BinaryDecode,
    }
}

fn key_manager_kind(err: &KeyManagerError) -> ErrorKind {
    match err {
        KeyManagerError::Cipher(_) => ErrorKind::Cipher,
        _ => ErrorKind::KeyManagement,
    }
}

impl SdkError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SdkError::Address(_) => ErrorKind::AddressChecksum,
            SdkError::Encode(_) => ErrorKind::InvalidInput,
            SdkError::Decode(err) => decode_kind(err),
            SdkError::Envelope(err) => match err {
                EnvelopeError::FrameFormat(_) => ErrorKind::FrameFormat,
                EnvelopeError::SignatureInvalid => ErrorKind::SignatureInvalid,
                EnvelopeError::BinaryDecode(_) => ErrorKind::BinaryDecode,
                EnvelopeError::InvalidInput(_) => ErrorKind::InvalidInput,
                EnvelopeError::Signing(err) => key_manager_kind(err),
            },
            SdkError::Cipher(_) => ErrorKind::Cipher,
            SdkError::Key(_) => ErrorKind::KeyManagement,
            SdkError::Signature(_) => ErrorKind::SignatureInvalid,
            SdkError::KeyManager(err) => key_manager_kind(err),
            SdkError::Client(err) => match err {
                ClientError::Exhausted(_) => ErrorKind::NetworkExhausted,
                ClientError::Decode { .. } | ClientError::IncompleteCommit(_) => {
                    ErrorKind::BinaryDecode
                }
                ClientError::Envelope(EnvelopeError::InvalidInput(_)) => ErrorKind::InvalidInput,
                ClientError::Envelope(_) => ErrorKind::KeyManagement,
                ClientError::Config(_) | ClientError::Io(_) | ClientError::Http(_) => {
                    ErrorKind::Config
                }
            },
            SdkError::Config(_) => ErrorKind::Config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_mapping() {
        let cases: Vec<(SdkError, ErrorKind)> = vec![
            (
                EnvelopeError::FrameFormat("x".into()).into(),
                ErrorKind::FrameFormat,
            ),
            (EnvelopeError::SignatureInvalid.into(), ErrorKind::SignatureInvalid),
            (AddressError::ChecksumMismatch.into(), ErrorKind::AddressChecksum),
            (
                DecodeError::TooFewItems {
                    expected: 2,
                    got: 1,
                }
                .into(),
                ErrorKind::ParameterBounds,
            ),
            (
                DecodeError::MalformedList("x".into()).into(),
                ErrorKind::BinaryDecode,
            ),
            (CipherError::MagicMismatch.into(), ErrorKind::Cipher),
            (
                InputError::BadNonce("zz".into()).into(),
                ErrorKind::InvalidInput,
            ),
            (
                KeyManagerError::NotFound("k".into()).into(),
                ErrorKind::KeyManagement,
            ),
        ];
        for (err, kind) in cases {
            assert_eq!(err.kind(), kind, "{}", err);
        }
    }
}
