// Pre-shared keys, the key store and the identity-resolution capability.

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{KnightTrustError, Result};
use crate::identity::Identity;
use crate::KEY_LEN;

/// A 128-bit symmetric secret shared by one (local, remote) identity pair.
///
/// Never serialized onto the wire; wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SharedKey([u8; KEY_LEN]);

impl SharedKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let array: [u8; KEY_LEN] = bytes.try_into().map_err(|_| {
            KnightTrustError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    /// Parse a 32-digit hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let mut bytes = [0u8; KEY_LEN];
        hex::decode_to_slice(s.trim(), &mut bytes)
            .map_err(|e| KnightTrustError::InvalidKey(format!("hex: {e}")))?;
        let key = Self(bytes);
        bytes.zeroize();
        Ok(key)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Short non-reversible label for logs: first 4 bytes of SHA-256(key), hex.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..4])
    }
}

impl fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedKey({})", self.fingerprint())
    }
}

/// Supplies the shared key for a claimed remote identity, or declines.
///
/// Called synchronously while a message is being processed.
pub trait KeyResolver: Send {
    fn resolve(&mut self, claimed: &Identity) -> Option<SharedKey>;
}

impl<F> KeyResolver for F
where
    F: FnMut(&Identity) -> Option<SharedKey> + Send,
{
    fn resolve(&mut self, claimed: &Identity) -> Option<SharedKey> {
        self(claimed)
    }
}

/// Explicit map of remote identity to shared key.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    keys: HashMap<Identity, SharedKey>,
}

#[derive(Deserialize)]
struct KeyStoreFile {
    peers: Vec<PeerEntry>,
}

#[derive(Deserialize)]
struct PeerEntry {
    identity: String,
    key: String,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `{"peers": [{"identity": "B", "key": "<32 hex digits>"}, ...]}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: KeyStoreFile = serde_json::from_str(json)?;
        let mut store = Self::new();
        for entry in file.peers {
            let identity = Identity::try_from(entry.identity.as_str())?;
            let key = SharedKey::from_hex(&entry.key)?;
            store.insert(identity, key);
        }
        Ok(store)
    }

    /// Add or replace the key for `identity`, returning the previous one.
    pub fn insert(&mut self, identity: Identity, key: SharedKey) -> Option<SharedKey> {
        self.keys.insert(identity, key)
    }

    pub fn remove(&mut self, identity: &Identity) -> Option<SharedKey> {
        self.keys.remove(identity)
    }

    pub fn get(&self, identity: &Identity) -> Option<&SharedKey> {
        self.keys.get(identity)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl KeyResolver for KeyStore {
    fn resolve(&mut self, claimed: &Identity) -> Option<SharedKey> {
        self.keys.get(claimed).cloned()
    }
}
