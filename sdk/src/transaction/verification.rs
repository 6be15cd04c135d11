//! Transaction envelope parsing.
//!
//! [`parse_transaction`] is the inverse of
//! [`super::builder::build_transaction`]: it checks the frame, verifies the
//! signature over the raw payload, and only then decodes the record. The
//! signer address comes from the verified public key, never from anything
//! the payload claims.

use tracing::debug;

use super::envelope::{open_as, EnvelopeError, EnvelopeKind};
use super::types::{MethodCall, Transaction};
use crate::codec::{decode_items, ParamItems};
use crate::config::ChainContext;
use crate::crypto::address::Address;

/// Parse and verify a `<tx>` envelope.
pub fn parse_transaction(
    ctx: &ChainContext,
    text: &str,
) -> Result<(Address, Transaction), EnvelopeError> {
    let (signer, tx): (Address, Transaction) = open_as(ctx, EnvelopeKind::Transaction, text)?;
    debug!(signer = %signer, nonce = tx.nonce, to = %tx.to, "transaction parsed");
    Ok((signer, tx))
}

/// Decode the method call and its parameter list from a verified transaction.
pub fn decode_call(tx: &Transaction) -> Result<(MethodCall, ParamItems), EnvelopeError> {
    let call = tx.method_call()?;
    let items =
        decode_items(&call.param_data).map_err(|e| EnvelopeError::BinaryDecode(e.to_string()))?;
    Ok((call, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::address::{address_from_public_key, derive_contract_address};
    use crate::crypto::keys::Keypair;
    use crate::keystore::manager::{InMemoryKeyManager, SigningKeyRef};
    use crate::transaction::builder::{build_transaction, TxParams};

    fn signed() -> (ChainContext, String, Keypair) {
        let ctx = ChainContext::new("bcb");
        let kp = Keypair::from_seed(&[5u8; 32]);
        let mut keys = InMemoryKeyManager::new();
        keys.insert("k", "p", kp.clone());

        let owner = address_from_public_key("bcb", &kp.public_key());
        let params = TxParams {
            nonce: "2".into(),
            gas_limit: "ff".into(),
            note: "".into(),
            to: derive_contract_address("bcb", &owner, "c", "1").to_string(),
            method_selector: "01020304".into(),
            items: vec!["a".into(), "0x00ff".into()],
        };
        let text = build_transaction(&ctx, &params, &keys, &SigningKeyRef::new("k", "p")).unwrap();
        (ctx, text, kp)
    }

    #[test]
    fn parse_recovers_signer_and_call() {
        let (ctx, text, kp) = signed();
        let (signer, tx) = parse_transaction(&ctx, &text).unwrap();
        assert_eq!(signer, address_from_public_key("bcb", &kp.public_key()));
        assert_eq!(tx.nonce, 2);
        assert_eq!(tx.gas_limit, 255);

        let (call, items) = decode_call(&tx).unwrap();
        assert_eq!(call.selector(), [1, 2, 3, 4]);
        assert_eq!(items.len(), 2);
        assert_eq!(items.bytes(1).unwrap(), &[0x00, 0xff]);
    }

    #[test]
    fn wrong_chain_is_frame_error() {
        let (_, text, _) = signed();
        let other = ChainContext::new("tst");
        assert!(matches!(
            parse_transaction(&other, &text),
            Err(EnvelopeError::FrameFormat(_))
        ));
    }

    #[test]
    fn swapped_signature_segment_fails() {
        let (ctx, text, _) = signed();
        let mut keys = InMemoryKeyManager::new();
        keys.insert("k", "p", Keypair::from_seed(&[6u8; 32]));
        let other = crate::transaction::query::build_query(
            &ctx,
            "/x",
            &keys,
            &SigningKeyRef::new("k", "p"),
        )
        .unwrap();

        let mut fields: Vec<&str> = text.split('.').collect();
        fields[4] = other.split('.').nth(4).unwrap();
        let spliced = fields.join(".");
        assert!(matches!(
            parse_transaction(&ctx, &spliced),
            Err(EnvelopeError::SignatureInvalid)
        ));
    }
}
