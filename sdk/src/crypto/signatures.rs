//! # Signature Verification
//!
//! Verification entry points for bytes that came off the wire. Envelope
//! parsing goes through [`verify_raw`]; the key-management collaborator's
//! file-signature check goes through [`verify_file_signature`].
//!
//! ed25519-dalek's `verify` is used rather than `verify_strict`: signatures
//! produced by the ledger's existing signers must keep verifying.

use ed25519_dalek::{Signature as DalekSignature, Verifier, VerifyingKey};
use thiserror::Error;

use super::hash::sha3_256;
use super::keys::{PublicKey, Signature};

/// Errors during signature operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature verification failed")]
    VerificationFailed,

    #[error("invalid public key")]
    InvalidPublicKey,
}

/// Verify a signature from raw byte components.
pub fn verify_raw(
    public_key_bytes: &[u8; 32],
    message: &[u8],
    signature_bytes: &[u8; 64],
) -> Result<(), SignatureError> {
    let verifying_key =
        VerifyingKey::from_bytes(public_key_bytes).map_err(|_| SignatureError::InvalidPublicKey)?;
    let signature = DalekSignature::from_bytes(signature_bytes);

    verifying_key
        .verify(message, &signature)
        .map_err(|_| SignatureError::VerificationFailed)
}

/// Verify a detached signature over a file's contents.
///
/// Release artifacts are signed over `SHA3-256(file)` rather than the raw
/// bytes, so large files don't have to be held twice.
pub fn verify_file_signature(
    public_key: &PublicKey,
    file_bytes: &[u8],
    signature: &Signature,
) -> Result<(), SignatureError> {
    let digest = sha3_256(file_bytes);
    verify_raw(public_key.as_bytes(), &digest, signature.as_bytes())
}
