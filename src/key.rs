// model = "claude-opus-4-5"
// created = "2026-10-19"
// modified = "2026-10-19"
// driver = "Isaac Clayton"

//! Replica identity.
//!
//! A replica is named by a 32-byte actor id. In a peer-to-peer deployment
//! that id is the replica's ed25519 public key, so `KeyPair::generate` is the
//! usual way to mint one. Tests and fixed, human-named replicas can use
//! `ActorId::derive`, which hashes a label with `hash` instead.

use blake3::Hasher;
use ed25519_dalek::SigningKey;
use rand_core::OsRng;

use crate::crdt::id::ActorId;

/// A public key, 32 bytes on the ed25519 curve.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPub(pub [u8; 32]);

/// A secret key, 32 bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct KeySec(pub [u8; 32]);

/// A keypair bundles a public and secret key together.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub key_pub: KeyPub,
    pub key_sec: KeySec,
}

/// A blake3 hash, 32 bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Hash(pub [u8; 32]);

/// Hash a message using blake3.
pub fn hash(message: &[u8]) -> Hash {
    let mut hasher = Hasher::new();
    hasher.update(message);
    let result = hasher.finalize();
    return Hash(*result.as_bytes());
}

impl KeyPair {
    /// Generate a random keypair.
    pub fn generate() -> KeyPair {
        let signing = SigningKey::generate(&mut OsRng);
        let verifying = signing.verifying_key();
        return KeyPair {
            key_pub: KeyPub(verifying.to_bytes()),
            key_sec: KeySec(signing.to_bytes()),
        };
    }

    /// Rebuild a keypair from a stored secret key.
    pub fn from_secret(key_sec: KeySec) -> KeyPair {
        let signing = SigningKey::from_bytes(&key_sec.0);
        return KeyPair {
            key_pub: KeyPub(signing.verifying_key().to_bytes()),
            key_sec,
        };
    }

    /// The actor id this keypair edits as.
    pub fn actor_id(&self) -> ActorId {
        return self.key_pub.actor_id();
    }
}

impl KeyPub {
    pub fn actor_id(&self) -> ActorId {
        return ActorId::from_bytes(self.0);
    }
}

impl From<&KeyPair> for ActorId {
    fn from(pair: &KeyPair) -> ActorId {
        return pair.actor_id();
    }
}

fn hex(bytes: &[u8]) -> String {
    return bytes.iter().map(|b| format!("{:02x}", b)).collect();
}

impl std::fmt::Debug for KeyPub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "KeyPub({})", hex(&self.0));
    }
}

impl std::fmt::Debug for KeySec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print secret material
        return write!(f, "KeySec(..)");
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "KeyPair {{ pub: {} }}", hex(&self.key_pub.0));
    }
}

impl std::fmt::Debug for Hash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return write!(f, "Hash({})", hex(&self.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_differ() {
        let a = KeyPair::generate();
        let b = KeyPair::generate();
        assert_ne!(a.key_pub, b.key_pub);
        assert_ne!(a.actor_id(), b.actor_id());
    }

    #[test]
    fn actor_id_is_public_key() {
        let pair = KeyPair::generate();
        assert_eq!(pair.actor_id().as_bytes(), &pair.key_pub.0);
        assert_eq!(ActorId::from(&pair), pair.actor_id());
    }

    #[test]
    fn from_secret_restores_public_key() {
        let pair = KeyPair::generate();
        let restored = KeyPair::from_secret(pair.key_sec.clone());
        assert_eq!(restored, pair);
    }

    #[test]
    fn debug_hides_secret() {
        let pair = KeyPair::generate();
        let debug = format!("{:?}", pair.key_sec);
        assert_eq!(debug, "KeySec(..)");
    }

    #[test]
    fn hash_is_deterministic() {
        let a = hash(b"hello world");
        let b = hash(b"hello world");
        assert_eq!(a, b);
    }

    #[test]
    fn hash_differs_for_different_input() {
        let a = hash(b"hello world");
        let b = hash(b"hello world!");
        assert_ne!(a, b);
    }
}
