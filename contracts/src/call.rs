//! # Generic Method Calls
//!
//! One builder and one decoder for every contract, driven by a
//! [`MethodSpec`]. The builder turns typed arguments into the selector hex
//! and text items that [`bcb_sdk::transaction::TxParams`] carries; the
//! decoder goes the other way from `Transaction.data`.
//!
//! Every argument is emitted as `0x`-prefixed hex of its wire bytes. The
//! parameter codec treats unprefixed text as raw UTF-8, so a string that
//! happens to start with `0x` would otherwise be mangled.

use bcb_sdk::codec::{decode_items, encode_items, DecodeError, EncodeError, ParamItems};
use bcb_sdk::config::ChainContext;
use bcb_sdk::crypto::{Address, AddressError};
use bcb_sdk::transaction::{MethodCall, TxParams};
use primitive_types::U256;
use thiserror::Error;
use tracing::debug;

use crate::table::{ContractTable, MethodSpec, ParamKind};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CallError {
    #[error("{method} takes {expected} arguments, got {got}")]
    Arity {
        method: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("argument {index} of {method} must be {expected:?}, got {got:?}")]
    KindMismatch {
        method: &'static str,
        index: usize,
        expected: ParamKind,
        got: ParamKind,
    },

    #[error("argument {index} is not an unsigned decimal below 2^256: {value:?}")]
    BadBigUint { index: usize, value: String },

    #[error("unknown method id {0:#010x}")]
    UnknownMethod(u32),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

// ---------------------------------------------------------------------------
// Values
// ---------------------------------------------------------------------------

/// A typed call argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Str(String),
    Address(Address),
    AddressList(Vec<Address>),
    /// Decimal text.
    BigUint(String),
    Uint64(u64),
    Uint32(u32),
    Bool(bool),
    Bytes(Vec<u8>),
}

impl ParamValue {
    pub fn big_uint(decimal: impl Into<String>) -> Self {
        ParamValue::BigUint(decimal.into())
    }

    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Str(_) => ParamKind::Str,
            ParamValue::Address(_) => ParamKind::Address,
            ParamValue::AddressList(_) => ParamKind::AddressList,
            ParamValue::BigUint(_) => ParamKind::BigUint,
            ParamValue::Uint64(_) => ParamKind::Uint64,
            ParamValue::Uint32(_) => ParamKind::Uint32,
            ParamValue::Bool(_) => ParamKind::Bool,
            ParamValue::Bytes(_) => ParamKind::Bytes,
        }
    }

    fn to_item(&self, ctx: &ChainContext, index: usize) -> Result<String, CallError> {
        let item = match self {
            ParamValue::Str(s) => hex_item(s.as_bytes()),
            ParamValue::Address(addr) => {
                let addr = Address::parse(ctx, addr.as_str())?;
                hex_item(addr.as_str().as_bytes())
            }
            ParamValue::AddressList(list) if list.is_empty() => "0x".to_string(),
            ParamValue::AddressList(list) => list
                .iter()
                .map(|addr| -> Result<String, CallError> {
                    Ok(hex_item(&addr.body(ctx.chain_id())?))
                })
                .collect::<Result<Vec<_>, CallError>>()?
                .join(","),
            ParamValue::BigUint(decimal) => {
                let value = U256::from_dec_str(decimal).map_err(|_| CallError::BadBigUint {
                    index,
                    value: decimal.clone(),
                })?;
                let mut buf = [0u8; 32];
                value.to_big_endian(&mut buf);
                let first = buf.iter().position(|b| *b != 0).unwrap_or(buf.len());
                hex_item(&buf[first..])
            }
            ParamValue::Uint64(v) => hex_item(&v.to_be_bytes()),
            ParamValue::Uint32(v) => hex_item(&v.to_be_bytes()),
            ParamValue::Bool(v) => hex_item(&[u8::from(*v)]),
            ParamValue::Bytes(bytes) => hex_item(bytes),
        };
        Ok(item)
    }
}

fn hex_item(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Str(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Str(s)
    }
}

impl From<Address> for ParamValue {
    fn from(a: Address) -> Self {
        ParamValue::Address(a)
    }
}

impl From<Vec<Address>> for ParamValue {
    fn from(list: Vec<Address>) -> Self {
        ParamValue::AddressList(list)
    }
}

impl From<u64> for ParamValue {
    fn from(v: u64) -> Self {
        ParamValue::Uint64(v)
    }
}

impl From<u32> for ParamValue {
    fn from(v: u32) -> Self {
        ParamValue::Uint32(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<Vec<u8>> for ParamValue {
    fn from(v: Vec<u8>) -> Self {
        ParamValue::Bytes(v)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Text form of a method call, ready to drop into [`TxParams`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCall {
    pub selector_hex: String,
    pub items: Vec<String>,
}

impl PreparedCall {
    /// The binary [`MethodCall`] these items encode to.
    pub fn method_call(&self, spec: &MethodSpec) -> Result<MethodCall, CallError> {
        Ok(MethodCall::new(spec.selector(), encode_items(&self.items)?))
    }

    /// Legacy text parameters for sending this call to `contract`.
    pub fn into_tx_params(
        self,
        nonce: u64,
        gas_limit: u64,
        note: impl Into<String>,
        contract: &Address,
    ) -> TxParams {
        TxParams {
            nonce: format!("{:x}", nonce),
            gas_limit: format!("{:x}", gas_limit),
            note: note.into(),
            to: contract.to_string(),
            method_selector: self.selector_hex,
            items: self.items,
        }
    }
}

/// Collects typed arguments for one method and checks them against its spec.
#[derive(Debug, Clone)]
pub struct MethodCallBuilder<'a> {
    ctx: &'a ChainContext,
    spec: &'a MethodSpec,
    args: Vec<ParamValue>,
}

impl<'a> MethodCallBuilder<'a> {
    pub fn new(ctx: &'a ChainContext, spec: &'a MethodSpec) -> Self {
        Self {
            ctx,
            spec,
            args: Vec::with_capacity(spec.params.len()),
        }
    }

    pub fn arg(mut self, value: impl Into<ParamValue>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn build(&self) -> Result<PreparedCall, CallError> {
        let spec = self.spec;
        if self.args.len() != spec.params.len() {
            return Err(CallError::Arity {
                method: spec.name,
                expected: spec.params.len(),
                got: self.args.len(),
            });
        }

        let mut items = Vec::with_capacity(self.args.len());
        for (index, (value, expected)) in self.args.iter().zip(spec.params).enumerate() {
            if value.kind() != *expected {
                return Err(CallError::KindMismatch {
                    method: spec.name,
                    index,
                    expected: *expected,
                    got: value.kind(),
                });
            }
            items.push(value.to_item(self.ctx, index)?);
        }

        Ok(PreparedCall {
            selector_hex: spec.selector_hex(),
            items,
        })
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A recognized call with its typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCall {
    pub spec: &'static MethodSpec,
    pub args: Vec<ParamValue>,
}

fn decode_value(
    ctx: &ChainContext,
    items: &ParamItems,
    index: usize,
    kind: ParamKind,
) -> Result<ParamValue, CallError> {
    let value = match kind {
        ParamKind::Str => ParamValue::Str(items.string(index)?),
        ParamKind::Address => ParamValue::Address(Address::parse(ctx, &items.string(index)?)?),
        ParamKind::AddressList => {
            ParamValue::AddressList(items.address_list(index, ctx.chain_id())?)
        }
        ParamKind::BigUint => ParamValue::BigUint(items.big_uint(index)?),
        ParamKind::Uint64 => ParamValue::Uint64(items.u64(index)?),
        ParamKind::Uint32 => ParamValue::Uint32(items.u32(index)?),
        ParamKind::Bool => ParamValue::Bool(items.bool(index)?),
        ParamKind::Bytes => ParamValue::Bytes(items.bytes(index)?.to_vec()),
    };
    Ok(value)
}

/// Recognize a `Transaction.data` payload against `table` and decode its
/// arguments.
pub fn decode_call(
    ctx: &ChainContext,
    table: &ContractTable,
    data: &[u8],
) -> Result<DecodedCall, CallError> {
    let call = MethodCall::from_bytes(data)?;
    let spec = table
        .by_method_id(call.method_id)
        .ok_or(CallError::UnknownMethod(call.method_id))?;

    let items = decode_items(&call.param_data)?;
    items.require(spec.params.len())?;

    let args = spec
        .params
        .iter()
        .enumerate()
        .map(|(index, kind)| decode_value(ctx, &items, index, *kind))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(contract = table.name, method = spec.name, "call decoded");
    Ok(DecodedCall { spec, args })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{BURN, SET_GAS_PRICE, TRANSFER};

    #[test]
    fn arity_and_kind_are_checked() {
        let ctx = ChainContext::new("bcb");
        assert!(matches!(
            MethodCallBuilder::new(&ctx, &BURN).build(),
            Err(CallError::Arity {
                expected: 1,
                got: 0,
                ..
            })
        ));
        assert!(matches!(
            MethodCallBuilder::new(&ctx, &BURN).arg(5u64).build(),
            Err(CallError::KindMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn big_uint_is_minimal_big_endian() {
        let ctx = ChainContext::new("bcb");
        let call = MethodCallBuilder::new(&ctx, &BURN)
            .arg(ParamValue::big_uint("256"))
            .build()
            .unwrap();
        assert_eq!(call.items, vec!["0x0100".to_string()]);

        let zero = MethodCallBuilder::new(&ctx, &BURN)
            .arg(ParamValue::big_uint("0"))
            .build()
            .unwrap();
        assert_eq!(zero.items, vec!["0x".to_string()]);
    }

    #[test]
    fn bad_decimal_is_rejected() {
        let ctx = ChainContext::new("bcb");
        assert!(matches!(
            MethodCallBuilder::new(&ctx, &BURN)
                .arg(ParamValue::big_uint("12abc"))
                .build(),
            Err(CallError::BadBigUint { index: 0, .. })
        ));
    }

    #[test]
    fn uint64_roundtrips_through_decoder() {
        let ctx = ChainContext::new("bcb");
        let prepared = MethodCallBuilder::new(&ctx, &SET_GAS_PRICE)
            .arg(2_500u64)
            .build()
            .unwrap();
        let data = prepared.method_call(&SET_GAS_PRICE).unwrap().to_bytes();
        let decoded = decode_call(&ctx, &crate::table::TOKEN, &data).unwrap();
        assert_eq!(decoded.spec.name, "SetGasPrice");
        assert_eq!(decoded.args, vec![ParamValue::Uint64(2_500)]);
    }

    #[test]
    fn unknown_selector_is_reported() {
        let ctx = ChainContext::new("bcb");
        let data = MethodCall::new([0, 0, 0, 1], bcb_sdk::codec::encode_items::<&str>(&[]).unwrap())
            .to_bytes();
        assert!(matches!(
            decode_call(&ctx, &crate::table::TOKEN, &data),
            Err(CallError::UnknownMethod(1))
        ));
    }

    #[test]
    fn too_few_items_is_bounds_error() {
        let ctx = ChainContext::new("bcb");
        let data = MethodCall::new(TRANSFER.selector(), encode_items(&["0x01"]).unwrap()).to_bytes();
        assert!(matches!(
            decode_call(&ctx, &crate::table::TOKEN, &data),
            Err(CallError::Decode(DecodeError::TooFewItems {
                expected: 2,
                got: 1
            }))
        ));
    }
}
