//! Transaction construction.
//!
//! Callers from the legacy wallet surface hand every field over as text:
//! nonce and gas limit as hex, the method selector as hex, call arguments
//! as the item strings [`crate::codec::encode_items`] understands.
//! [`TxParams::validate`] turns that into a typed [`Transaction`] and
//! [`build_transaction`] seals it. [`TransactionBuilder`] is the typed
//! front door for Rust callers who already hold numbers.

use tracing::debug;

use super::envelope::{seal, EnvelopeError, EnvelopeKind, InputError};
use super::types::{MethodCall, Transaction};
use crate::codec::encode_items;
use crate::config::{ChainContext, HEX_PREFIX, MAX_NOTE_LENGTH, SELECTOR_LENGTH};
use crate::crypto::address::Address;
use crate::keystore::manager::{KeyManager, SigningKeyRef};

// ---------------------------------------------------------------------------
// Text parameters
// ---------------------------------------------------------------------------

/// Transaction fields as the wallet surface supplies them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxParams {
    /// Hex nonce, `0x` prefix optional.
    pub nonce: String,
    /// Hex gas limit, `0x` prefix optional.
    pub gas_limit: String,
    pub note: String,
    /// Destination contract address.
    pub to: String,
    /// Four hex-encoded bytes, `0x` prefix optional.
    pub method_selector: String,
    /// Call arguments in method order.
    pub items: Vec<String>,
}

fn parse_hex_u64(text: &str) -> Option<u64> {
    let digits = text.strip_prefix(HEX_PREFIX).unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}

fn parse_selector(text: &str) -> Result<[u8; SELECTOR_LENGTH], InputError> {
    let digits = text.strip_prefix(HEX_PREFIX).unwrap_or(text);
    let bytes = hex::decode(digits).map_err(|_| InputError::BadSelector(text.to_string()))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| InputError::BadSelector(text.to_string()))
}

fn check_note(note: &str) -> Result<(), InputError> {
    let len = note.chars().count();
    if len > MAX_NOTE_LENGTH {
        return Err(InputError::NoteTooLong {
            len,
            max: MAX_NOTE_LENGTH,
        });
    }
    Ok(())
}

impl TxParams {
    /// Check every field and assemble the transaction record.
    ///
    /// Field order of the checks is fixed: nonce, gas limit, selector, note,
    /// destination, then items. The first failure wins.
    pub fn validate(&self, ctx: &ChainContext) -> Result<Transaction, InputError> {
        let nonce =
            parse_hex_u64(&self.nonce).ok_or_else(|| InputError::BadNonce(self.nonce.clone()))?;
        let gas_limit = parse_hex_u64(&self.gas_limit)
            .ok_or_else(|| InputError::BadGasLimit(self.gas_limit.clone()))?;
        let selector = parse_selector(&self.method_selector)?;
        check_note(&self.note)?;
        let to = Address::parse(ctx, &self.to)?;
        let param_data = encode_items(&self.items)?;

        let call = MethodCall::new(selector, param_data);
        Ok(Transaction {
            nonce,
            gas_limit,
            note: self.note.clone(),
            to,
            data: rlp::encode(&call).to_vec(),
        })
    }
}

/// Validate, serialize, sign and frame a transaction.
pub fn build_transaction(
    ctx: &ChainContext,
    params: &TxParams,
    keys: &dyn KeyManager,
    key: &SigningKeyRef,
) -> Result<String, EnvelopeError> {
    let tx = params.validate(ctx)?;
    let text = seal(ctx, EnvelopeKind::Transaction, &tx, keys, key)?;
    debug!(
        chain_id = ctx.chain_id(),
        nonce = tx.nonce,
        to = %tx.to,
        key = key.name(),
        len = text.len(),
        "transaction built"
    );
    Ok(text)
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for typed callers.
///
/// ```rust,no_run
/// use bcb_sdk::config::ChainContext;
/// use bcb_sdk::crypto::{method_selector, Address};
/// use bcb_sdk::keystore::{InMemoryKeyManager, SigningKeyRef};
/// use bcb_sdk::transaction::TransactionBuilder;
///
/// # fn run(to: Address, keys: InMemoryKeyManager) -> Result<(), Box<dyn std::error::Error>> {
/// let ctx = ChainContext::new("bcb");
/// let text = TransactionBuilder::new(to)
///     .nonce(1)
///     .gas_limit(25_000)
///     .note("rent")
///     .selector(method_selector("Transfer(smc.Address,big.Int)smc.Error"))
///     .item("0xabcd")
///     .item("1000")
///     .sign(&ctx, &keys, &SigningKeyRef::new("alice", "pw"))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    nonce: u64,
    gas_limit: u64,
    note: String,
    to: Address,
    selector: [u8; SELECTOR_LENGTH],
    items: Vec<String>,
}

impl TransactionBuilder {
    pub fn new(to: Address) -> Self {
        Self {
            nonce: 0,
            gas_limit: 0,
            note: String::new(),
            to,
            selector: [0u8; SELECTOR_LENGTH],
            items: Vec::new(),
        }
    }

    pub fn nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    pub fn gas_limit(mut self, gas_limit: u64) -> Self {
        self.gas_limit = gas_limit;
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    pub fn selector(mut self, selector: [u8; SELECTOR_LENGTH]) -> Self {
        self.selector = selector;
        self
    }

    /// Append one call argument.
    pub fn item(mut self, item: impl Into<String>) -> Self {
        self.items.push(item.into());
        self
    }

    pub fn items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items.extend(items.into_iter().map(Into::into));
        self
    }

    /// Assemble the unsigned record.
    pub fn build(&self) -> Result<Transaction, InputError> {
        check_note(&self.note)?;
        let param_data = encode_items(&self.items)?;
        let call = MethodCall::new(self.selector, param_data);
        Ok(Transaction {
            nonce: self.nonce,
            gas_limit: self.gas_limit,
            note: self.note.clone(),
            to: self.to.clone(),
            data: rlp::encode(&call).to_vec(),
        })
    }

    /// Assemble, sign and frame.
    pub fn sign(
        &self,
        ctx: &ChainContext,
        keys: &dyn KeyManager,
        key: &SigningKeyRef,
    ) -> Result<String, EnvelopeError> {
        let tx = self.build()?;
        seal(ctx, EnvelopeKind::Transaction, &tx, keys, key)
    }

    /// The legacy text form of these fields.
    pub fn to_params(&self) -> TxParams {
        TxParams {
            nonce: format!("{:x}", self.nonce),
            gas_limit: format!("{:x}", self.gas_limit),
            note: self.note.clone(),
            to: self.to.to_string(),
            method_selector: hex::encode(self.selector),
            items: self.items.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::address::derive_contract_address;
    use crate::crypto::hash::method_selector;
    use crate::crypto::keys::Keypair;
    use crate::crypto::address::address_from_public_key;

    fn ctx() -> ChainContext {
        ChainContext::new("bcb")
    }

    fn contract() -> Address {
        let owner = address_from_public_key("bcb", &Keypair::from_seed(&[1u8; 32]).public_key());
        derive_contract_address("bcb", &owner, "token-basic", "2.0.1")
    }

    fn params() -> TxParams {
        TxParams {
            nonce: "1a".into(),
            gas_limit: "0x61a8".into(),
            note: "hello".into(),
            to: contract().to_string(),
            method_selector: "0xdeadbeef".into(),
            items: vec!["0x0102".into(), "plain".into()],
        }
    }

    #[test]
    fn validate_parses_hex_fields() {
        let tx = params().validate(&ctx()).unwrap();
        assert_eq!(tx.nonce, 0x1a);
        assert_eq!(tx.gas_limit, 25_000);
        let call = tx.method_call().unwrap();
        assert_eq!(call.method_id, 0xdead_beef);
        let items = crate::codec::decode_items(&call.param_data).unwrap();
        assert_eq!(items.bytes(0).unwrap(), &[1, 2]);
        assert_eq!(items.string(1).unwrap(), "plain");
    }

    #[test]
    fn bad_numbers_are_reported_per_field() {
        let mut p = params();
        p.nonce = "zz".into();
        assert_eq!(p.validate(&ctx()), Err(InputError::BadNonce("zz".into())));

        let mut p = params();
        p.gas_limit = "".into();
        assert_eq!(p.validate(&ctx()), Err(InputError::BadGasLimit("".into())));

        let mut p = params();
        p.nonce = "0x".into();
        assert!(matches!(p.validate(&ctx()), Err(InputError::BadNonce(_))));

        for signed in ["+1a", "0x+ff", "-1"] {
            let mut p = params();
            p.nonce = signed.into();
            assert_eq!(p.validate(&ctx()), Err(InputError::BadNonce(signed.into())));

            let mut p = params();
            p.gas_limit = signed.into();
            assert_eq!(p.validate(&ctx()), Err(InputError::BadGasLimit(signed.into())));
        }
    }

    #[test]
    fn selector_must_be_four_bytes() {
        for bad in ["0xdead", "0xdeadbeef00", "nothex!!"] {
            let mut p = params();
            p.method_selector = bad.into();
            assert!(matches!(p.validate(&ctx()), Err(InputError::BadSelector(_))));
        }
    }

    #[test]
    fn note_limit_counts_characters() {
        let mut p = params();
        p.note = "é".repeat(MAX_NOTE_LENGTH);
        assert!(p.validate(&ctx()).is_ok());
        p.note.push('x');
        assert!(matches!(
            p.validate(&ctx()),
            Err(InputError::NoteTooLong { len: 257, max: 256 })
        ));
    }

    #[test]
    fn destination_is_validated() {
        let mut p = params();
        p.to = "other1234".into();
        assert!(matches!(p.validate(&ctx()), Err(InputError::BadDestination(_))));
    }

    #[test]
    fn builder_matches_text_params() {
        let builder = TransactionBuilder::new(contract())
            .nonce(0x1a)
            .gas_limit(25_000)
            .note("hello")
            .selector(method_selector("Transfer(smc.Address,big.Int)smc.Error"))
            .items(["0x0102", "plain"]);
        let typed = builder.build().unwrap();
        let from_text = builder.to_params().validate(&ctx()).unwrap();
        assert_eq!(typed, from_text);
    }
}
