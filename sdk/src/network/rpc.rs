//! # JSON-RPC Wire Types
//!
//! Request/response envelopes for the ledger node's JSON-RPC endpoint, the
//! method enumeration, and the typed results the client helpers decode.
//!
//! Requests are POSTed to the node root with a flat key/value `params`
//! object. Responses carry exactly one of `result` or `error`.
//!
//! ## Method Index
//!
//! | Method                | Description                                     |
//! |-----------------------|-------------------------------------------------|
//! | `health`              | Liveness probe                                  |
//! | `status`              | Node info: chain, version, latest block         |
//! | `abci_info`           | Application info                                |
//! | `abci_query`          | Generic keyed state query                       |
//! | `broadcast_tx_commit` | Submit an envelope, wait for check + deliver    |
//! | `bcb_blockHeight`     | Current chain height                            |
//! | `bcb_block`           | Block at a height                               |
//! | `bcb_transaction`     | Transaction by hash                             |
//! | `bcb_balance`         | Native balance of an address                    |
//! | `bcb_balanceOfToken`  | Token balance of an address                     |
//! | `bcb_allBalance`      | Every token balance of an address               |
//! | `bcb_nonce`           | Next nonce of an address                        |

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::config::JSONRPC_VERSION;

// ---------------------------------------------------------------------------
// RPC Method Enumeration
// ---------------------------------------------------------------------------

/// Methods the SDK calls. The wire name is the serde rename.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcMethod {
    #[serde(rename = "health")]
    Health,
    #[serde(rename = "status")]
    Status,
    #[serde(rename = "abci_info")]
    AbciInfo,
    /// Parameters: `path`, `data`.
    #[serde(rename = "abci_query")]
    AbciQuery,
    /// Parameters: `tx`.
    #[serde(rename = "broadcast_tx_commit")]
    BroadcastTxCommit,
    #[serde(rename = "bcb_blockHeight")]
    BlockHeight,
    /// Parameters: `height`.
    #[serde(rename = "bcb_block")]
    Block,
    /// Parameters: `txHash`.
    #[serde(rename = "bcb_transaction")]
    Transaction,
    /// Parameters: `address`.
    #[serde(rename = "bcb_balance")]
    Balance,
    /// Parameters: `address`, `tokenAddress`.
    #[serde(rename = "bcb_balanceOfToken")]
    BalanceOfToken,
    /// Parameters: `address`.
    #[serde(rename = "bcb_allBalance")]
    AllBalance,
    /// Parameters: `address`.
    #[serde(rename = "bcb_nonce")]
    Nonce,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 12] = [
        Self::Health,
        Self::Status,
        Self::AbciInfo,
        Self::AbciQuery,
        Self::BroadcastTxCommit,
        Self::BlockHeight,
        Self::Block,
        Self::Transaction,
        Self::Balance,
        Self::BalanceOfToken,
        Self::AllBalance,
        Self::Nonce,
    ];

    /// The method name on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Health => "health",
            Self::Status => "status",
            Self::AbciInfo => "abci_info",
            Self::AbciQuery => "abci_query",
            Self::BroadcastTxCommit => "broadcast_tx_commit",
            Self::BlockHeight => "bcb_blockHeight",
            Self::Block => "bcb_block",
            Self::Transaction => "bcb_transaction",
            Self::Balance => "bcb_balance",
            Self::BalanceOfToken => "bcb_balanceOfToken",
            Self::AllBalance => "bcb_allBalance",
            Self::Nonce => "bcb_nonce",
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RPC Request / Response
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl RpcRequest {
    /// Build a request with a fresh random id.
    pub fn new(method: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Value::String(uuid::Uuid::new_v4().to_string()),
            method: method.into(),
            params,
        }
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Collapse into the result or the error. A response carrying neither
    /// is an internal error.
    pub fn into_result(self) -> Result<Value, RpcError> {
        match (self.result, self.error) {
            (_, Some(err)) => Err(err),
            (Some(result), None) => Ok(result),
            (None, None) => Err(RpcError::internal_error(
                "response carries neither result nor error",
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// RPC Errors
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        Self::new(-32603, msg)
    }
}

/// `RPC error {code} - {message}`, with `: {data}` appended when present.
/// Legacy callers keep only the text after the last `:`, so the most
/// specific part goes last.
impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RPC error {} - {}", self.code, self.message)?;
        match &self.data {
            None | Some(Value::Null) => Ok(()),
            Some(Value::String(s)) if s.is_empty() => Ok(()),
            Some(Value::String(s)) => write!(f, ": {}", s),
            Some(other) => write!(f, ": {}", other),
        }
    }
}

impl std::error::Error for RpcError {}

// ---------------------------------------------------------------------------
// Typed results
// ---------------------------------------------------------------------------

/// Nodes report integers as JSON numbers or as decimal strings, depending
/// on the endpoint.
pub(crate) fn lenient_u64<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Num(u64),
        Text(String),
    }
    match Repr::deserialize(de)? {
        Repr::Num(n) => Ok(n),
        Repr::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// `bcb_blockHeight` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeight {
    #[serde(deserialize_with = "lenient_u64")]
    pub height: u64,
}

/// `bcb_nonce` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nonce {
    #[serde(deserialize_with = "lenient_u64")]
    pub nonce: u64,
}

/// Outcome of one ABCI phase (admission or execution).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResult {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub data: String,
    #[serde(default, alias = "gasUsed")]
    pub gas_used: Option<Value>,
    #[serde(default)]
    pub fee: Option<Value>,
}

impl TxResult {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// `broadcast_tx_commit` exactly as it arrives. Either phase may be absent
/// when the node times out waiting for the block.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawCommitTx {
    #[serde(default)]
    pub check_tx: Option<TxResult>,
    #[serde(default)]
    pub deliver_tx: Option<TxResult>,
    #[serde(default)]
    pub hash: String,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub height: Option<u64>,
}

fn lenient_opt_u64<'de, D: Deserializer<'de>>(de: D) -> Result<Option<u64>, D::Error> {
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "lenient_u64")] u64);
    Option::<Wrap>::deserialize(de).map(|w| w.map(|Wrap(n)| n))
}

/// A submitted envelope with both admission and execution results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitTxResult {
    pub check_tx: TxResult,
    pub deliver_tx: TxResult,
    pub hash: String,
    pub height: u64,
}

impl CommitTxResult {
    /// Admitted and executed without error.
    pub fn is_ok(&self) -> bool {
        self.check_tx.is_ok() && self.deliver_tx.is_ok()
    }
}

/// `abci_query` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbciQueryResponse {
    #[serde(default)]
    pub code: u32,
    #[serde(default)]
    pub log: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    pub height: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct AbciQueryResult {
    pub response: AbciQueryResponse,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_flat_params() {
        let mut params = Map::new();
        params.insert("address".into(), json!("bcbXYZ"));
        let req = RpcRequest::new(RpcMethod::Nonce.as_str(), params);
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["jsonrpc"], "2.0");
        assert_eq!(v["method"], "bcb_nonce");
        assert_eq!(v["params"]["address"], "bcbXYZ");
        assert!(v["id"].is_string());
    }

    #[test]
    fn wire_names_match_serde() {
        for method in RpcMethod::ALL {
            let v = serde_json::to_value(method).unwrap();
            assert_eq!(v, json!(method.as_str()));
        }
    }

    #[test]
    fn response_into_result() {
        let ok: RpcResponse =
            serde_json::from_value(json!({"jsonrpc":"2.0","id":"1","result":{"height":42}}))
                .unwrap();
        assert_eq!(ok.into_result().unwrap(), json!({"height":42}));

        let err: RpcResponse = serde_json::from_value(
            json!({"jsonrpc":"2.0","id":"1","error":{"code":-32000,"message":"boom"}}),
        )
        .unwrap();
        assert_eq!(err.into_result().unwrap_err().message, "boom");

        let empty: RpcResponse = serde_json::from_value(json!({"id":"1"})).unwrap();
        assert_eq!(empty.into_result().unwrap_err().code, -32603);
    }

    #[test]
    fn error_display_puts_detail_last() {
        let mut err = RpcError::new(-32000, "tx rejected");
        assert_eq!(err.to_string(), "RPC error -32000 - tx rejected");
        err.data = Some(json!("nonce too low"));
        assert_eq!(err.to_string(), "RPC error -32000 - tx rejected: nonce too low");
    }

    #[test]
    fn heights_accept_strings_and_numbers() {
        let a: BlockHeight = serde_json::from_value(json!({"height": 42})).unwrap();
        let b: BlockHeight = serde_json::from_value(json!({"height": "42"})).unwrap();
        assert_eq!(a, b);
        assert!(serde_json::from_value::<BlockHeight>(json!({"height": "x"})).is_err());
    }

    #[test]
    fn raw_commit_tolerates_missing_phases() {
        let raw: RawCommitTx = serde_json::from_value(json!({
            "check_tx": {"code": 0, "log": "ok"},
            "hash": "AB12",
        }))
        .unwrap();
        assert!(raw.check_tx.is_some());
        assert!(raw.deliver_tx.is_none());
        assert_eq!(raw.height, None);
    }
}
