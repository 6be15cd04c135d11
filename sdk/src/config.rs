//! # SDK Configuration & Constants
//!
//! Every wire literal the ledger expects lives here. If you're hardcoding
//! `"<tx>"` somewhere else, you're doing it wrong.
//!
//! These values are part of the interoperable byte format. Existing nodes
//! reject anything that deviates, so none of them are tunable at runtime.
//! The only runtime knobs are in [`ClientConfig`]: which nodes to talk to,
//! which chain we're on, and how TLS is handled.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Envelope Literals
// ---------------------------------------------------------------------------

/// Tag appended to the chain identifier in a transaction envelope's MAC field.
pub const TX_TAG: &str = "<tx>";

/// Tag appended to the chain identifier in a query envelope's MAC field.
pub const QUERY_TAG: &str = "<qy>";

/// Envelope format version. There has only ever been one.
pub const ENVELOPE_VERSION: &str = "v1";

/// Signer-count literal. Multi-signer envelopes were never shipped.
pub const SIGNER_COUNT: &str = "<1>";

/// Field separator inside an envelope.
pub const ENVELOPE_SEPARATOR: char = '.';

/// Number of dot-separated fields in every envelope.
pub const ENVELOPE_FIELD_COUNT: usize = 5;

// ---------------------------------------------------------------------------
// Transaction Limits
// ---------------------------------------------------------------------------

/// Maximum note length, in characters.
pub const MAX_NOTE_LENGTH: usize = 256;

/// Method selector length in bytes.
pub const SELECTOR_LENGTH: usize = 4;

/// Hex prefix that switches the parameter codec from UTF-8 to hex decoding.
pub const HEX_PREFIX: &str = "0x";

/// Length of the trailing address checksum, in bytes.
pub const ADDRESS_CHECKSUM_LENGTH: usize = 4;

/// Length of the RIPEMD-160 address body, in bytes.
pub const ADDRESS_HASH_LENGTH: usize = 20;

// ---------------------------------------------------------------------------
// Keystore Parameters
// ---------------------------------------------------------------------------

/// Magic prefix of a decrypted legacy keystore blob.
pub const KEYSTORE_MAGIC: [u8; 4] = *b"BCBK";

/// Application salt mixed into every password-derived key. Changing this
/// makes every keystore on disk unreadable.
pub const KEYSTORE_SALT: &[u8] = b"bcb-wallet-keystore";

/// Version tag prefixed to authenticated (v2) keystore blobs.
pub const KEYSTORE_V2_TAG: [u8; 4] = *b"KSv2";

/// AES block size in bytes.
pub const CIPHER_BLOCK_SIZE: usize = 16;

/// AES-GCM nonce length for v2 blobs. Twelve bytes, as always.
pub const AES_NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length for v2 blobs.
pub const AES_TAG_LENGTH: usize = 16;

/// File extension of keystore files managed by the key manager.
pub const KEYSTORE_FILE_EXTENSION: &str = "wal";

// ---------------------------------------------------------------------------
// RPC Parameters
// ---------------------------------------------------------------------------

/// Per-attempt timeout for a single node. Under total failure the caller
/// waits up to `nodes.len()` times this.
pub const RPC_TIMEOUT: Duration = Duration::from_secs(60);

/// Same timeout in seconds, for serde defaults.
pub const RPC_TIMEOUT_SECS: u64 = 60;

/// JSON-RPC protocol version string.
pub const JSONRPC_VERSION: &str = "2.0";

/// Default concurrency when racing nodes.
pub const DEFAULT_RACE_CONCURRENCY: usize = 3;

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Errors produced while validating a [`ClientConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("chain identifier must not be empty")]
    EmptyChainId,

    #[error("at least one node address is required")]
    NoNodes,

    #[error("node address {0} must use http:// or https://")]
    BadNodeScheme(String),

    #[error("request timeout must be positive")]
    ZeroTimeout,

    #[error("race concurrency must be at least 1")]
    ZeroConcurrency,
}

/// How the RPC client handles TLS certificates.
///
/// There is deliberately no `Default` impl. Skipping verification has to be
/// written down in the config file, not inherited.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TlsPolicy {
    /// Verify server certificates against the system roots, plus the PEM
    /// bundle at `ca_pem_path` when given.
    Verify {
        #[serde(default)]
        ca_pem_path: Option<PathBuf>,
    },
    /// Accept any server certificate. This is what legacy deployments with
    /// self-signed node certificates run with.
    InsecureSkipVerify,
}

/// Node selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FailoverMode {
    /// Try nodes one at a time, in order.
    #[default]
    Sequential,
    /// Query up to `concurrency` nodes at once; first success wins.
    Race {
        #[serde(default = "default_race_concurrency")]
        concurrency: usize,
    },
}

fn default_race_concurrency() -> usize {
    DEFAULT_RACE_CONCURRENCY
}

/// Runtime configuration for an SDK client.
///
/// Loading it from YAML is the application's business; this type only
/// derives `Deserialize` so whatever loader you use can fill it in.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Chain identifier, the address prefix (e.g. `"bcb"`).
    pub chain_id: String,

    /// Node URLs in priority order.
    pub nodes: Vec<String>,

    /// Directory holding keystore files.
    #[serde(default)]
    pub keystore_path: Option<PathBuf>,

    /// TLS handling. Required.
    pub tls: TlsPolicy,

    /// Per-attempt timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Node selection strategy.
    #[serde(default)]
    pub mode: FailoverMode,
}

fn default_timeout_secs() -> u64 {
    RPC_TIMEOUT_SECS
}

impl ClientConfig {
    /// Parse and validate a JSON config document.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the rest of the SDK relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id.is_empty() {
            return Err(ConfigError::EmptyChainId);
        }
        if self.nodes.is_empty() {
            return Err(ConfigError::NoNodes);
        }
        if let Some(bad) = self
            .nodes
            .iter()
            .find(|n| !n.starts_with("http://") && !n.starts_with("https://"))
        {
            return Err(ConfigError::BadNodeScheme(bad.clone()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if let FailoverMode::Race { concurrency: 0 } = self.mode {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    /// Per-attempt timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The immutable chain context derived from this config.
    pub fn chain_context(&self) -> ChainContext {
        ChainContext::new(self.chain_id.clone())
    }
}

/// The active chain, resolved once at startup and passed by reference to
/// every codec and envelope call. Nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChainContext {
    chain_id: String,
}

impl ChainContext {
    pub fn new(chain_id: impl Into<String>) -> Self {
        Self {
            chain_id: chain_id.into(),
        }
    }

    /// The chain identifier, which doubles as the address prefix.
    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    /// MAC field of a transaction envelope: `{chain_id}<tx>`.
    pub fn tx_mac(&self) -> String {
        format!("{}{}", self.chain_id, TX_TAG)
    }

    /// MAC field of a query envelope: `{chain_id}<qy>`.
    pub fn query_mac(&self) -> String {
        format!("{}{}", self.chain_id, QUERY_TAG)
    }
}
