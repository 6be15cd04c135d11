//! Failover JSON-RPC client.
//!
//! Nodes are tried in configured order. The first node to answer with a
//! `result` wins. When every node fails, the caller gets a
//! [`FailoverError`] whose `Display` is the legacy message: the text after
//! the last `:` of the *last configured* node's error, trimmed. Everything
//! the legacy message throws away is kept in [`FailoverError::attempts`]
//! and logged per attempt at `warn`.
//!
//! [`FailoverMode::Race`] keeps that contract but puts up to `concurrency`
//! requests in flight at once.

use std::fmt;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::rpc::{
    AbciQueryResponse, AbciQueryResult, BlockHeight, CommitTxResult, Nonce, RawCommitTx,
    RpcError, RpcMethod, RpcRequest, RpcResponse,
};
use crate::config::{
    ChainContext, ClientConfig, ConfigError, FailoverMode, TlsPolicy, RPC_TIMEOUT,
};
use crate::crypto::address::Address;
use crate::keystore::manager::{KeyManager, SigningKeyRef};
use crate::transaction::builder::{build_transaction, TxParams};
use crate::transaction::envelope::EnvelopeError;

/// How many bytes of an unparseable HTTP body make it into an error.
const BODY_SNIPPET: usize = 128;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// One failed attempt against one node.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid JSON-RPC response: {0}")]
    BadResponse(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// What went wrong at one node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeFailure {
    /// Position of the node in the configured list.
    pub index: usize,
    pub node: String,
    pub message: String,
}

/// Every configured node failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverError {
    method: String,
    attempts: Vec<NodeFailure>,
}

impl FailoverError {
    fn new(method: &str, mut attempts: Vec<NodeFailure>) -> Self {
        attempts.sort_by_key(|a| a.index);
        Self {
            method: method.to_string(),
            attempts,
        }
    }

    /// Per-node diagnostics, in configured node order.
    pub fn attempts(&self) -> &[NodeFailure] {
        &self.attempts
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// The legacy message: last `:`-separated segment of the last node's
    /// error, trimmed.
    pub fn legacy_message(&self) -> String {
        match self.attempts.last() {
            Some(last) => last
                .message
                .rsplit(':')
                .next()
                .unwrap_or_default()
                .trim()
                .to_string(),
            None => "no nodes configured".to_string(),
        }
    }
}

impl fmt::Display for FailoverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.legacy_message())
    }
}

impl std::error::Error for FailoverError {}

/// Errors from the client and its typed helpers.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Exhausted(#[from] FailoverError),

    #[error("cannot decode {method} result: {reason}")]
    Decode { method: RpcMethod, reason: String },

    #[error("commit result is missing {0}")]
    IncompleteCommit(&'static str),

    #[error("invalid client configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("cannot read CA bundle: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Node {
    url: String,
    http: reqwest::Client,
}

fn http_client(tls: &TlsPolicy, timeout: Duration) -> Result<reqwest::Client, ClientError> {
    let mut builder = reqwest::Client::builder().timeout(timeout);
    match tls {
        TlsPolicy::Verify { ca_pem_path: None } => {}
        TlsPolicy::Verify {
            ca_pem_path: Some(path),
        } => {
            let pem = std::fs::read(path)?;
            builder = builder.add_root_certificate(reqwest::Certificate::from_pem(&pem)?);
        }
        TlsPolicy::InsecureSkipVerify => {
            builder = builder.danger_accept_invalid_certs(true);
        }
    }
    Ok(builder.build()?)
}

async fn exchange(node: &Node, request: &RpcRequest) -> Result<Value, NodeError> {
    let response = node.http.post(&node.url).json(request).send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    // Nodes answer JSON-RPC errors with non-2xx statuses too, so the body is
    // tried first and the status only reported if it fails.
    match serde_json::from_slice::<RpcResponse>(&body) {
        Ok(parsed) => Ok(parsed.into_result()?),
        Err(_) if !status.is_success() => Err(NodeError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body[..body.len().min(BODY_SNIPPET)]).into_owned(),
        }),
        Err(e) => Err(NodeError::BadResponse(e.to_string())),
    }
}

/// JSON-RPC client over an ordered list of ledger nodes.
#[derive(Debug, Clone)]
pub struct FailoverClient {
    nodes: Vec<Node>,
    timeout: Duration,
    mode: FailoverMode,
}

impl FailoverClient {
    /// Build a client from validated configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let client = Self::with_nodes(&config.nodes, &config.tls, config.request_timeout())?;
        Ok(client.with_mode(config.mode))
    }

    /// Build a client over `nodes` with the given TLS policy and timeout.
    pub fn with_nodes<S: AsRef<str>>(
        nodes: &[S],
        tls: &TlsPolicy,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        if nodes.is_empty() {
            return Err(ConfigError::NoNodes.into());
        }
        if timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout.into());
        }
        if matches!(tls, TlsPolicy::InsecureSkipVerify) {
            warn!("TLS certificate verification is disabled for all nodes");
        }

        // One independent HTTP client per node, no shared connection pool.
        let nodes = nodes
            .iter()
            .map(|url| {
                Ok(Node {
                    url: url.as_ref().to_string(),
                    http: http_client(tls, timeout)?,
                })
            })
            .collect::<Result<Vec<_>, ClientError>>()?;

        Ok(Self {
            nodes,
            timeout,
            mode: FailoverMode::Sequential,
        })
    }

    /// Same as [`Self::with_nodes`] with the default 60 second timeout.
    pub fn from_nodes<S: AsRef<str>>(nodes: &[S], tls: &TlsPolicy) -> Result<Self, ClientError> {
        Self::with_nodes(nodes, tls, RPC_TIMEOUT)
    }

    pub fn with_mode(mut self, mode: FailoverMode) -> Self {
        self.mode = match mode {
            FailoverMode::Race { concurrency: 0 } => FailoverMode::Race { concurrency: 1 },
            other => other,
        };
        self
    }

    pub fn mode(&self) -> FailoverMode {
        self.mode
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Node URLs in configured order.
    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|n| n.url.as_str())
    }

    /// Call `method` with a flat parameter map.
    pub async fn call(
        &self,
        method: RpcMethod,
        params: Map<String, Value>,
    ) -> Result<Value, FailoverError> {
        self.call_raw(method.as_str(), params, None).await
    }

    /// Call `method`, giving up at `deadline`. Each attempt is bounded by
    /// the smaller of the per-request timeout and the time remaining.
    pub async fn call_with_deadline(
        &self,
        method: RpcMethod,
        params: Map<String, Value>,
        deadline: Instant,
    ) -> Result<Value, FailoverError> {
        self.call_raw(method.as_str(), params, Some(deadline)).await
    }

    /// Call a method by wire name.
    pub async fn call_raw(
        &self,
        method: &str,
        params: Map<String, Value>,
        deadline: Option<Instant>,
    ) -> Result<Value, FailoverError> {
        match self.mode {
            FailoverMode::Sequential => self.call_sequential(method, &params, deadline).await,
            FailoverMode::Race { concurrency } => {
                self.call_race(method, &params, deadline, concurrency.max(1))
                    .await
            }
        }
    }

    fn attempt_timeout(&self, deadline: Option<Instant>) -> Option<Duration> {
        match deadline {
            None => Some(self.timeout),
            Some(deadline) => {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    None
                } else {
                    Some(remaining.min(self.timeout))
                }
            }
        }
    }

    async fn call_sequential(
        &self,
        method: &str,
        params: &Map<String, Value>,
        deadline: Option<Instant>,
    ) -> Result<Value, FailoverError> {
        let mut failures = Vec::with_capacity(self.nodes.len());

        for index in 0..self.nodes.len() {
            let result = match self.attempt_timeout(deadline) {
                Some(timeout) => self.attempt(index, method, params, timeout).await,
                None => Err(NodeError::DeadlineExceeded),
            };
            match result {
                Ok(value) => {
                    self.log_success(index, method);
                    return Ok(value);
                }
                Err(err) => {
                    let stop = matches!(err, NodeError::DeadlineExceeded);
                    failures.push(self.record_failure(index, method, &err));
                    if stop {
                        break;
                    }
                }
            }
        }

        Err(FailoverError::new(method, failures))
    }

    async fn call_race(
        &self,
        method: &str,
        params: &Map<String, Value>,
        deadline: Option<Instant>,
        concurrency: usize,
    ) -> Result<Value, FailoverError> {
        // Each attempt's budget is taken when it starts, not when the race
        // begins, so queued attempts cannot outlive the deadline.
        let mut in_flight = stream::iter(0..self.nodes.len())
            .map(|index| async move {
                let result = match self.attempt_timeout(deadline) {
                    Some(timeout) => self.attempt(index, method, params, timeout).await,
                    None => Err(NodeError::DeadlineExceeded),
                };
                (index, result)
            })
            .buffer_unordered(concurrency);

        let mut failures = Vec::with_capacity(self.nodes.len());
        while let Some((index, result)) = in_flight.next().await {
            match result {
                Ok(value) => {
                    self.log_success(index, method);
                    return Ok(value);
                }
                Err(err) => failures.push(self.record_failure(index, method, &err)),
            }
        }

        Err(FailoverError::new(method, failures))
    }

    async fn attempt(
        &self,
        index: usize,
        method: &str,
        params: &Map<String, Value>,
        timeout: Duration,
    ) -> Result<Value, NodeError> {
        let node = &self.nodes[index];
        let request = RpcRequest::new(method, params.clone());

        match tokio::time::timeout(timeout, exchange(node, &request)).await {
            Ok(result) => result,
            Err(_) => Err(NodeError::Timeout(timeout)),
        }
    }

    fn record_failure(&self, index: usize, method: &str, err: &NodeError) -> NodeFailure {
        let node = self.nodes[index].url.clone();
        warn!(
            node = %node,
            attempt = index + 1,
            of = self.nodes.len(),
            method,
            error = %err,
            "rpc attempt failed"
        );
        NodeFailure {
            index,
            node,
            message: err.to_string(),
        }
    }

    fn log_success(&self, index: usize, method: &str) {
        if index > 0 {
            info!(node = %self.nodes[index].url, attempt = index + 1, method, "failover node answered");
        } else {
            debug!(node = %self.nodes[index].url, method, "rpc call succeeded");
        }
    }

    // -----------------------------------------------------------------------
    // Typed helpers
    // -----------------------------------------------------------------------

    async fn call_typed<T: DeserializeOwned>(
        &self,
        method: RpcMethod,
        params: Map<String, Value>,
    ) -> Result<T, ClientError> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value).map_err(|e| ClientError::Decode {
            method,
            reason: e.to_string(),
        })
    }

    /// Liveness probe. Succeeds if any node answers.
    pub async fn health(&self) -> Result<(), ClientError> {
        self.call(RpcMethod::Health, Map::new()).await?;
        Ok(())
    }

    /// Node status: chain, version, latest block.
    pub async fn node_info(&self) -> Result<Value, ClientError> {
        Ok(self.call(RpcMethod::Status, Map::new()).await?)
    }

    pub async fn block_height(&self) -> Result<u64, ClientError> {
        let height: BlockHeight = self.call_typed(RpcMethod::BlockHeight, Map::new()).await?;
        Ok(height.height)
    }

    pub async fn block(&self, height: u64) -> Result<Value, ClientError> {
        Ok(self
            .call(RpcMethod::Block, params([("height", json!(height))]))
            .await?)
    }

    pub async fn transaction(&self, tx_hash: &str) -> Result<Value, ClientError> {
        Ok(self
            .call(RpcMethod::Transaction, params([("txHash", json!(tx_hash))]))
            .await?)
    }

    pub async fn balance(&self, address: &Address) -> Result<Value, ClientError> {
        Ok(self
            .call(RpcMethod::Balance, params([("address", json!(address.as_str()))]))
            .await?)
    }

    pub async fn balance_of_token(
        &self,
        address: &Address,
        token: &Address,
    ) -> Result<Value, ClientError> {
        Ok(self
            .call(
                RpcMethod::BalanceOfToken,
                params([
                    ("address", json!(address.as_str())),
                    ("tokenAddress", json!(token.as_str())),
                ]),
            )
            .await?)
    }

    pub async fn all_balances(&self, address: &Address) -> Result<Value, ClientError> {
        Ok(self
            .call(RpcMethod::AllBalance, params([("address", json!(address.as_str()))]))
            .await?)
    }

    pub async fn nonce(&self, address: &Address) -> Result<u64, ClientError> {
        let nonce: Nonce = self
            .call_typed(RpcMethod::Nonce, params([("address", json!(address.as_str()))]))
            .await?;
        Ok(nonce.nonce)
    }

    /// Generic keyed state query.
    pub async fn query(&self, path: &str) -> Result<AbciQueryResponse, ClientError> {
        let result: AbciQueryResult = self
            .call_typed(RpcMethod::AbciQuery, params([("path", json!(path))]))
            .await?;
        Ok(result.response)
    }

    /// Submit an envelope and wait for both admission and execution.
    pub async fn commit_tx(&self, envelope: &str) -> Result<CommitTxResult, ClientError> {
        let raw: RawCommitTx = self
            .call_typed(RpcMethod::BroadcastTxCommit, params([("tx", json!(envelope))]))
            .await?;
        let check_tx = raw.check_tx.ok_or(ClientError::IncompleteCommit("check_tx"))?;
        let deliver_tx = raw
            .deliver_tx
            .ok_or(ClientError::IncompleteCommit("deliver_tx"))?;
        let height = raw.height.ok_or(ClientError::IncompleteCommit("height"))?;
        Ok(CommitTxResult {
            check_tx,
            deliver_tx,
            hash: raw.hash,
            height,
        })
    }

    /// Build, sign and commit a transaction in one call.
    pub async fn commit_envelope(
        &self,
        ctx: &ChainContext,
        tx: &TxParams,
        keys: &dyn KeyManager,
        key: &SigningKeyRef,
    ) -> Result<CommitTxResult, ClientError> {
        let envelope = build_transaction(ctx, tx, keys, key)?;
        self.commit_tx(&envelope).await
    }
}

fn params<const N: usize>(pairs: [(&str, Value); N]) -> Map<String, Value> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(index: usize, message: &str) -> NodeFailure {
        NodeFailure {
            index,
            node: format!("http://n{}", index),
            message: message.to_string(),
        }
    }

    #[test]
    fn legacy_message_is_last_segment_of_last_node() {
        let err = FailoverError::new(
            "bcb_blockHeight",
            vec![failure(0, "a: x"), failure(1, "b: y"), failure(2, "c: z")],
        );
        assert_eq!(err.to_string(), "z");
        assert_eq!(err.attempts().len(), 3);
        assert_eq!(err.attempts()[0].message, "a: x");
    }

    #[test]
    fn attempts_are_reported_in_node_order() {
        let err = FailoverError::new(
            "m",
            vec![failure(2, "c: z"), failure(0, "a: x"), failure(1, "b: y")],
        );
        let order: Vec<usize> = err.attempts().iter().map(|a| a.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
        assert_eq!(err.to_string(), "z");
    }

    #[test]
    fn message_without_colon_is_kept_whole() {
        let err = FailoverError::new("m", vec![failure(0, "  boom  ")]);
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn empty_node_list_is_rejected() {
        let nodes: [&str; 0] = [];
        assert!(matches!(
            FailoverClient::from_nodes(&nodes, &TlsPolicy::InsecureSkipVerify),
            Err(ClientError::Config(ConfigError::NoNodes))
        ));
    }

    #[test]
    fn race_concurrency_is_at_least_one() {
        let client =
            FailoverClient::from_nodes(&["http://127.0.0.1:1"], &TlsPolicy::InsecureSkipVerify)
                .unwrap()
                .with_mode(FailoverMode::Race { concurrency: 0 });
        assert_eq!(client.mode(), FailoverMode::Race { concurrency: 1 });
    }

    #[tokio::test]
    async fn expired_deadline_fails_without_calling() {
        let client =
            FailoverClient::from_nodes(&["http://127.0.0.1:1"], &TlsPolicy::InsecureSkipVerify)
                .unwrap();
        let err = client
            .call_with_deadline(RpcMethod::Health, Map::new(), Instant::now())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "deadline exceeded");
    }

    #[tokio::test]
    async fn expired_deadline_fails_every_raced_attempt() {
        let client = FailoverClient::from_nodes(
            &["http://127.0.0.1:1", "http://127.0.0.1:2"],
            &TlsPolicy::InsecureSkipVerify,
        )
        .unwrap()
        .with_mode(FailoverMode::Race { concurrency: 1 });
        let err = client
            .call_with_deadline(RpcMethod::Health, Map::new(), Instant::now())
            .await
            .unwrap_err();
        assert_eq!(err.attempts().len(), 2);
        assert!(err
            .attempts()
            .iter()
            .all(|a| a.message == "deadline exceeded"));
    }
}
