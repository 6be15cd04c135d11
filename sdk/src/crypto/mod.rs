//! # Cryptographic Primitives
//!
//! The identity layer of the SDK. Every signature, every address and every
//! method selector flows through here.
//!
//! - **Ed25519** for signatures (`keys`, `signatures`).
//! - **SHA3-256 / RIPEMD-160** for addresses and selectors (`hash`, `address`).
//!
//! Everything is a thin, typed wrapper over audited RustCrypto and dalek
//! implementations. Nothing here is hand-rolled.

pub mod address;
pub mod hash;
pub mod keys;
pub mod signatures;

pub use address::{
    address_from_public_key, derive_contract_address, validate_address, Address, AddressError,
};
pub use hash::{method_id, method_selector, ripemd160, sha3_256};
pub use keys::{KeyError, Keypair, PublicKey, Signature};
pub use signatures::{verify_file_signature, verify_raw, SignatureError};
