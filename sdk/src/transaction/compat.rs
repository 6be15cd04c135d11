//! Legacy in-band error strings.
//!
//! Older wallet callers get input validation failures back as a JSON
//! object in the same string slot a built envelope would occupy:
//!
//! ```text
//! {"code":-32602,"message":"invalid nonce \"zz\": expected a hex-encoded unsigned integer"}
//! ```
//!
//! Everything inside the SDK uses [`EnvelopeError`]. This module is the only
//! place that folds an error back into that text shape, and it only does so
//! for [`EnvelopeError::InvalidInput`]. Signing and encoding failures still
//! come back as typed errors.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::builder::{build_transaction, TxParams};
use super::envelope::EnvelopeError;
use crate::config::ChainContext;
use crate::keystore::manager::{KeyManager, SigningKeyRef};

/// JSON-RPC "invalid params", the code legacy callers match on.
pub const INVALID_PARAMS_CODE: i64 = -32602;

/// The JSON-shaped error legacy callers receive in place of an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyError {
    pub code: i64,
    pub message: String,
}

impl LegacyError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_PARAMS_CODE,
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({ "code": self.code, "message": self.message }).to_string()
    }
}

impl std::fmt::Display for LegacyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

/// Build a transaction, returning input errors in-band as JSON text.
pub fn build_transaction_legacy(
    ctx: &ChainContext,
    params: &TxParams,
    keys: &dyn KeyManager,
    key: &SigningKeyRef,
) -> Result<String, EnvelopeError> {
    match build_transaction(ctx, params, keys, key) {
        Ok(text) => Ok(text),
        Err(EnvelopeError::InvalidInput(err)) => {
            warn!(error = %err, "transaction input rejected");
            Ok(LegacyError::invalid_params(err.to_string()).to_json())
        }
        Err(other) => Err(other),
    }
}

/// Split a legacy result string back into envelope text or error.
///
/// Envelope text never starts with `{`, so anything that parses as a
/// [`LegacyError`] object is one.
pub fn parse_legacy_result(text: &str) -> Result<&str, LegacyError> {
    if text.trim_start().starts_with('{') {
        if let Ok(err) = serde_json::from_str::<LegacyError>(text) {
            return Err(err);
        }
    }
    Ok(text)
}
