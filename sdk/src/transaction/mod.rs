//! # Transaction Module
//!
//! Building, signing, framing and verifying ledger transactions and signed
//! queries.
//!
//! ## Architecture
//!
//! ```text
//! types.rs         RLP wire records (Transaction, Query, MethodCall, Ed25519SigInfo)
//! envelope.rs      the five-field text frame, seal and verify-then-decode open
//! builder.rs       TxParams validation, TransactionBuilder, build_transaction
//! verification.rs  parse_transaction and method call decoding
//! query.rs         build_query / parse_query
//! compat.rs        legacy JSON-shaped in-band error strings
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Validate** text inputs into a typed [`Transaction`].
//! 2. **Encode** call parameters and wrap them in a [`MethodCall`].
//! 3. **Seal**: RLP-serialize, sign through a [`crate::keystore::KeyManager`], frame.
//! 4. **Open** on the far side: literals, signature, then and only then decode.

pub mod builder;
pub mod compat;
pub mod envelope;
pub mod query;
pub mod types;
pub mod verification;

pub use builder::{build_transaction, TransactionBuilder, TxParams};
pub use compat::{build_transaction_legacy, parse_legacy_result, LegacyError};
pub use envelope::{open, seal, EnvelopeError, EnvelopeKind, InputError, VerifiedEnvelope};
pub use query::{build_query, parse_query};
pub use types::{Ed25519SigInfo, MethodCall, Query, Transaction};
pub use verification::{decode_call, parse_transaction};
