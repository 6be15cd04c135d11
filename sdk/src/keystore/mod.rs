//! # Keystore
//!
//! Private keys at rest, and the key-management seam the envelope layer
//! signs through.
//!
//! ```text
//! cipher.rs   password-based blob encryption (legacy ECB read/write, v2 AES-GCM)
//! manager.rs  KeyManager trait, on-disk and in-memory implementations
//! ```

pub mod cipher;
pub mod manager;

pub use cipher::{decrypt, derive_key, encrypt, seal, CipherError};
pub use manager::{
    InMemoryKeyManager, KeyManager, KeyManagerError, KeystoreKeyManager, SigningKeyRef,
};
