//! Signed read-only queries.
//!
//! Same frame as a transaction with the `<qy>` tag and a one-field
//! [`Query`] payload.

use tracing::debug;

use super::envelope::{open_as, seal, EnvelopeError, EnvelopeKind, InputError};
use super::types::Query;
use crate::config::ChainContext;
use crate::crypto::address::Address;
use crate::keystore::manager::{KeyManager, SigningKeyRef};

/// Build a signed `<qy>` envelope for `query_key`.
pub fn build_query(
    ctx: &ChainContext,
    query_key: &str,
    keys: &dyn KeyManager,
    key: &SigningKeyRef,
) -> Result<String, EnvelopeError> {
    if query_key.is_empty() {
        return Err(InputError::EmptyQueryKey.into());
    }
    let query = Query {
        query_key: query_key.to_string(),
    };
    let text = seal(ctx, EnvelopeKind::Query, &query, keys, key)?;
    debug!(chain_id = ctx.chain_id(), query_key, "query built");
    Ok(text)
}

/// Parse and verify a `<qy>` envelope.
pub fn parse_query(ctx: &ChainContext, text: &str) -> Result<(Address, Query), EnvelopeError> {
    open_as(ctx, EnvelopeKind::Query, text)
}
