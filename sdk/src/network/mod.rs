//! # Network Module
//!
//! Talking to ledger nodes over HTTP(S) JSON-RPC.
//!
//! ```text
//! rpc.rs     method names, request/response envelopes, typed results
//! client.rs  FailoverClient: ordered nodes, first success, last failure
//! ```
//!
//! The client is async on tokio. Every node gets its own `reqwest::Client`
//! built from the configured [`crate::config::TlsPolicy`].

pub mod client;
pub mod rpc;

pub use client::{ClientError, FailoverClient, FailoverError, NodeError, NodeFailure};
pub use rpc::{
    AbciQueryResponse, BlockHeight, CommitTxResult, Nonce, RpcError, RpcMethod, RpcRequest,
    RpcResponse, TxResult,
};
