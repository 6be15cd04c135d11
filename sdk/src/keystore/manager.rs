//! Key managers: where signing keys live and how a signature is obtained.
//!
//! The envelope layer only ever sees [`KeyManager`]. Private key bytes stay
//! behind it: a caller names a key and supplies its passphrase, and gets a
//! public key or a signature record back.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use super::cipher::{self, CipherError};
use crate::config::KEYSTORE_FILE_EXTENSION;
use crate::crypto::address::{address_from_public_key, Address};
use crate::crypto::keys::{KeyError, Keypair, PublicKey};
use crate::transaction::types::Ed25519SigInfo;

/// Keystore files hold a bare 32-byte ed25519 seed.
const SEED_LENGTH: usize = 32;

#[derive(Debug, Error)]
pub enum KeyManagerError {
    #[error("no key named {0:?}")]
    NotFound(String),

    #[error("a key named {0:?} already exists")]
    AlreadyExists(String),

    #[error("invalid key name {0:?}")]
    InvalidName(String),

    #[error("wrong passphrase for key {0:?}")]
    WrongPassphrase(String),

    #[error("keystore decryption failed: {0}")]
    Cipher(#[from] CipherError),

    #[error("stored key is malformed: {0}")]
    Key(#[from] KeyError),

    #[error("keystore I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A named key plus the passphrase that unlocks it.
#[derive(Clone)]
pub struct SigningKeyRef {
    name: String,
    passphrase: String,
}

impl SigningKeyRef {
    pub fn new(name: impl Into<String>, passphrase: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passphrase: passphrase.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

impl fmt::Debug for SigningKeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKeyRef")
            .field("name", &self.name)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// Anything that can produce signatures for named keys.
pub trait KeyManager: Send + Sync {
    /// Public key of the named key.
    fn public_key(&self, name: &str, passphrase: &str) -> Result<PublicKey, KeyManagerError>;

    /// Sign `message` with the named key.
    fn sign(
        &self,
        name: &str,
        passphrase: &str,
        message: &[u8],
    ) -> Result<Ed25519SigInfo, KeyManagerError>;

    /// Address of the named key on `chain_id`.
    fn address(
        &self,
        chain_id: &str,
        name: &str,
        passphrase: &str,
    ) -> Result<Address, KeyManagerError> {
        let public_key = self.public_key(name, passphrase)?;
        Ok(address_from_public_key(chain_id, &public_key))
    }
}

fn sign_with(keypair: &Keypair, message: &[u8]) -> Ed25519SigInfo {
    Ed25519SigInfo {
        public_key: keypair.public_key(),
        signature: keypair.sign(message),
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Keys held in process memory. For tests and short-lived tools.
#[derive(Default)]
pub struct InMemoryKeyManager {
    keys: HashMap<String, (String, Keypair)>,
}

impl InMemoryKeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key, replacing any previous key with the same name.
    pub fn insert(&mut self, name: impl Into<String>, passphrase: impl Into<String>, keypair: Keypair) {
        self.keys.insert(name.into(), (passphrase.into(), keypair));
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn unlock(&self, name: &str, passphrase: &str) -> Result<&Keypair, KeyManagerError> {
        let (stored, keypair) = self
            .keys
            .get(name)
            .ok_or_else(|| KeyManagerError::NotFound(name.to_string()))?;
        if stored != passphrase {
            return Err(KeyManagerError::WrongPassphrase(name.to_string()));
        }
        Ok(keypair)
    }
}

impl KeyManager for InMemoryKeyManager {
    fn public_key(&self, name: &str, passphrase: &str) -> Result<PublicKey, KeyManagerError> {
        Ok(self.unlock(name, passphrase)?.public_key())
    }

    fn sign(
        &self,
        name: &str,
        passphrase: &str,
        message: &[u8],
    ) -> Result<Ed25519SigInfo, KeyManagerError> {
        Ok(sign_with(self.unlock(name, passphrase)?, message))
    }
}

impl fmt::Debug for InMemoryKeyManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.keys.keys().collect();
        names.sort();
        f.debug_struct("InMemoryKeyManager")
            .field("keys", &names)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// On-disk keystore
// ---------------------------------------------------------------------------

/// A directory of encrypted key files, one `<name>.wal` per key.
///
/// New files are written with [`cipher::seal`]. Files written by older
/// wallets in the legacy format are still read. A key is decrypted for each
/// operation and dropped straight after; nothing is cached.
#[derive(Debug, Clone)]
pub struct KeystoreKeyManager {
    dir: PathBuf,
}

impl KeystoreKeyManager {
    /// Open a keystore directory, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, KeyManagerError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "keystore opened");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Generate a fresh key and store it under `name`.
    pub fn create_key(&self, name: &str, passphrase: &str) -> Result<PublicKey, KeyManagerError> {
        let keypair = Keypair::generate();
        self.import_key(name, passphrase, &keypair)?;
        Ok(keypair.public_key())
    }

    /// Store an existing key under `name`. Refuses to overwrite.
    pub fn import_key(
        &self,
        name: &str,
        passphrase: &str,
        keypair: &Keypair,
    ) -> Result<(), KeyManagerError> {
        let path = self.path_for(name)?;
        let blob = cipher::seal(&keypair.secret_key_bytes(), passphrase, None)?;

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    KeyManagerError::AlreadyExists(name.to_string())
                }
                _ => KeyManagerError::Io(e),
            })?;
        file.write_all(&blob)?;
        file.sync_all()?;

        info!(key = name, "key stored");
        Ok(())
    }

    /// Store a key in the legacy format, for interop with older wallets.
    pub fn import_key_legacy(
        &self,
        name: &str,
        passphrase: &str,
        keypair: &Keypair,
    ) -> Result<(), KeyManagerError> {
        let path = self.path_for(name)?;
        if path.exists() {
            return Err(KeyManagerError::AlreadyExists(name.to_string()));
        }
        let blob = cipher::encrypt(&keypair.secret_key_bytes(), passphrase, None)?;
        fs::write(&path, blob)?;
        Ok(())
    }

    /// Names of all keys in the directory, sorted.
    pub fn list(&self) -> Result<Vec<String>, KeyManagerError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(KEYSTORE_FILE_EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Decrypt and load the named key.
    pub fn load(&self, name: &str, passphrase: &str) -> Result<Keypair, KeyManagerError> {
        let path = self.path_for(name)?;
        let blob = fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => KeyManagerError::NotFound(name.to_string()),
            _ => KeyManagerError::Io(e),
        })?;

        let seed = cipher::decrypt(&blob, passphrase, None).map_err(|e| match e {
            CipherError::MagicMismatch | CipherError::AuthenticationFailed => {
                KeyManagerError::WrongPassphrase(name.to_string())
            }
            other => KeyManagerError::Cipher(other),
        })?;
        if seed.len() != SEED_LENGTH {
            return Err(KeyManagerError::Key(KeyError::InvalidSecretKey));
        }
        Ok(Keypair::from_slice(&seed)?)
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, KeyManagerError> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(KeyManagerError::InvalidName(name.to_string()));
        }
        Ok(self
            .dir
            .join(format!("{}.{}", name, KEYSTORE_FILE_EXTENSION)))
    }
}

impl KeyManager for KeystoreKeyManager {
    fn public_key(&self, name: &str, passphrase: &str) -> Result<PublicKey, KeyManagerError> {
        Ok(self.load(name, passphrase)?.public_key())
    }

    fn sign(
        &self,
        name: &str,
        passphrase: &str,
        message: &[u8],
    ) -> Result<Ed25519SigInfo, KeyManagerError> {
        let keypair = self.load(name, passphrase)?;
        Ok(sign_with(&keypair, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::signatures::verify_raw;

    #[test]
    fn in_memory_signs_and_checks_passphrase() {
        let mut keys = InMemoryKeyManager::new();
        keys.insert("alice", "pw", Keypair::from_seed(&[1u8; 32]));

        let info = keys.sign("alice", "pw", b"msg").unwrap();
        verify_raw(info.public_key.as_bytes(), b"msg", info.signature.as_bytes()).unwrap();

        assert!(matches!(
            keys.sign("alice", "nope", b"msg"),
            Err(KeyManagerError::WrongPassphrase(_))
        ));
        assert!(matches!(
            keys.public_key("bob", "pw"),
            Err(KeyManagerError::NotFound(_))
        ));
    }

    #[test]
    fn signing_key_ref_debug_hides_passphrase() {
        let key = SigningKeyRef::new("alice", "super-secret");
        let shown = format!("{:?}", key);
        assert!(shown.contains("alice"));
        assert!(!shown.contains("super-secret"));
    }

    #[test]
    fn keystore_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeystoreKeyManager::open(dir.path()).unwrap();

        let pk = store.create_key("main", "pw").unwrap();
        assert_eq!(store.public_key("main", "pw").unwrap(), pk);
        assert_eq!(store.list().unwrap(), vec!["main".to_string()]);
        assert!(dir.path().join("main.wal").exists());
    }

    #[test]
    fn keystore_rejects_overwrite_and_bad_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeystoreKeyManager::open(dir.path()).unwrap();
        store.create_key("main", "pw").unwrap();

        assert!(matches!(
            store.create_key("main", "pw"),
            Err(KeyManagerError::AlreadyExists(_))
        ));
        for bad in ["", "../escape", "a/b", "dot.name"] {
            assert!(matches!(
                store.create_key(bad, "pw"),
                Err(KeyManagerError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn keystore_wrong_passphrase() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeystoreKeyManager::open(dir.path()).unwrap();
        store.create_key("main", "pw").unwrap();
        assert!(matches!(
            store.sign("main", "nope", b"m"),
            Err(KeyManagerError::WrongPassphrase(_))
        ));
        assert!(matches!(
            store.sign("missing", "pw", b"m"),
            Err(KeyManagerError::NotFound(_))
        ));
    }

    #[test]
    fn keystore_reads_legacy_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeystoreKeyManager::open(dir.path()).unwrap();
        let kp = Keypair::from_seed(&[3u8; 32]);
        store.import_key_legacy("old", "pw", &kp).unwrap();

        assert!(!cipher::is_v2(&fs::read(dir.path().join("old.wal")).unwrap()));
        assert_eq!(store.public_key("old", "pw").unwrap(), kp.public_key());
        assert!(matches!(
            store.public_key("old", "nope"),
            Err(KeyManagerError::WrongPassphrase(_))
        ));
    }
}
