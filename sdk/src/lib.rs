// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # BCB SDK
//!
//! Client-side toolkit for the BCB proof-of-stake ledger. It builds and
//! signs transactions and queries, frames them in the ledger's text
//! envelope, verifies envelopes it receives, derives and validates
//! addresses, keeps private keys encrypted at rest, and talks to a set of
//! ledger nodes with failover.
//!
//! ## Architecture
//!
//! - **config**: Protocol constants, `ClientConfig`, `ChainContext`.
//! - **crypto**: Ed25519 keys, SHA3/RIPEMD-160 hashing, addresses, selectors.
//! - **codec**: RLP parameter lists and fixed-width integers.
//! - **transaction**: Records, envelope framing, build and verify-then-parse.
//! - **keystore**: Password-based key encryption and the `KeyManager` seam.
//! - **network**: JSON-RPC types and the failover client.
//! - **error**: `SdkError` and the coarse `ErrorKind` taxonomy.
//! - **logging**: Optional `tracing` subscriber setup.
//!
//! ## Ground Rules
//!
//! 1. The chain identifier is passed in, never stored globally.
//! 2. A payload is never decoded before its signature verifies.
//! 3. Malformed external input returns an error. It does not panic.
//! 4. Key material is never logged and never `Debug`-printed.

pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod keystore;
pub mod logging;
pub mod network;
pub mod transaction;

pub use config::{ChainContext, ClientConfig};
pub use error::{ErrorKind, SdkError};
