//! Key storage for DID document verification methods.
//!
//! Private keys are generated inside [`JwkMemStore`] and never leave it;
//! callers ask the store to sign. [`KeyIdMemStore`] maps a verification
//! method (by [`MethodDigest`]) to the id of its key.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tessera_crypto::{JwsAlgorithm, Jwk, KeyPair, PublicKey, Signature};
use uuid::Uuid;

use crate::error::IdentityError;

/// Key types the key store can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyType {
    Ed25519,
}

impl std::fmt::Display for KeyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ed25519 => write!(f, "Ed25519"),
        }
    }
}

/// Opaque identifier of a key inside a key store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId(String);

impl KeyId {
    fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for KeyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies a verification method independently of its DID.
///
/// blake3(fragment ‖ public key), so the digest survives the switch from
/// the placeholder DID to the published one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MethodDigest([u8; 32]);

impl MethodDigest {
    pub fn new(fragment: &str, public_key: &PublicKey) -> Self {
        Self(tessera_crypto::hash_parts(&[
            fragment.as_bytes(),
            public_key.as_bytes().as_slice(),
        ]))
    }
}

/// In-memory store of private keys.
#[derive(Default)]
pub struct JwkMemStore {
    keys: DashMap<KeyId, KeyPair>,
}

impl JwkMemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a key and return its id and public JWK.
    pub fn generate(
        &self,
        key_type: KeyType,
        alg: JwsAlgorithm,
    ) -> Result<(KeyId, Jwk), IdentityError> {
        let keypair = match (key_type, alg) {
            (KeyType::Ed25519, JwsAlgorithm::EdDSA) => KeyPair::generate(),
        };
        let key_id = KeyId::generate();
        let mut jwk = Jwk::from_public_key(&keypair.public_key());
        jwk.alg = Some(alg.to_string());
        self.keys.insert(key_id.clone(), keypair);
        tracing::debug!(key_id = %key_id, key_type = %key_type, "Generated key");
        Ok((key_id, jwk))
    }

    /// Sign `data` with the key `key_id`. The JWK must describe that key.
    pub fn sign(
        &self,
        key_id: &KeyId,
        data: &[u8],
        public_key: &Jwk,
    ) -> Result<Signature, IdentityError> {
        let keypair = self
            .keys
            .get(key_id)
            .ok_or_else(|| IdentityError::KeyNotFound(key_id.to_string()))?;
        if keypair.public_key() != public_key.to_public_key()? {
            return Err(IdentityError::KeyNotFound(format!(
                "{} does not match the given public key",
                key_id
            )));
        }
        Ok(keypair.sign(data))
    }

    pub fn exists(&self, key_id: &KeyId) -> bool {
        self.keys.contains_key(key_id)
    }

    pub fn delete(&self, key_id: &KeyId) -> Result<(), IdentityError> {
        self.keys
            .remove(key_id)
            .map(|_| ())
            .ok_or_else(|| IdentityError::KeyNotFound(key_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// In-memory mapping from verification methods to key ids.
#[derive(Default)]
pub struct KeyIdMemStore {
    ids: DashMap<MethodDigest, KeyId>,
}

impl KeyIdMemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_key_id(&self, digest: MethodDigest, key_id: KeyId) -> Result<(), IdentityError> {
        if self.ids.contains_key(&digest) {
            return Err(IdentityError::DuplicateFragment(
                "a key id is already stored for this method".into(),
            ));
        }
        self.ids.insert(digest, key_id);
        Ok(())
    }

    pub fn get_key_id(&self, digest: &MethodDigest) -> Result<KeyId, IdentityError> {
        self.ids
            .get(digest)
            .map(|id| id.clone())
            .ok_or_else(|| IdentityError::KeyNotFound("no key id for method".into()))
    }

    pub fn delete_key_id(&self, digest: &MethodDigest) -> Result<(), IdentityError> {
        self.ids
            .remove(digest)
            .map(|_| ())
            .ok_or_else(|| IdentityError::KeyNotFound("no key id for method".into()))
    }
}

/// Key store and key id store used together by a DID document.
#[derive(Default)]
pub struct Storage {
    key_storage: JwkMemStore,
    key_id_storage: KeyIdMemStore,
}

impl Storage {
    pub fn new(key_storage: JwkMemStore, key_id_storage: KeyIdMemStore) -> Self {
        Self {
            key_storage,
            key_id_storage,
        }
    }

    pub fn key_storage(&self) -> &JwkMemStore {
        &self.key_storage
    }

    pub fn key_id_storage(&self) -> &KeyIdMemStore {
        &self.key_id_storage
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_sign() {
        let store = JwkMemStore::new();
        let (key_id, jwk) = store.generate(KeyType::Ed25519, JwsAlgorithm::EdDSA).unwrap();
        assert!(store.exists(&key_id));
        assert_eq!(jwk.alg.as_deref(), Some("EdDSA"));

        let signature = store.sign(&key_id, b"payload", &jwk).unwrap();
        let public_key = jwk.to_public_key().unwrap();
        assert!(public_key.verify(b"payload", &signature).is_ok());
    }

    #[test]
    fn test_sign_with_mismatched_jwk() {
        let store = JwkMemStore::new();
        let (key_id, _) = store.generate(KeyType::Ed25519, JwsAlgorithm::EdDSA).unwrap();
        let (_, other) = store.generate(KeyType::Ed25519, JwsAlgorithm::EdDSA).unwrap();
        assert!(matches!(
            store.sign(&key_id, b"x", &other),
            Err(IdentityError::KeyNotFound(_))
        ));
    }

    #[test]
    fn test_delete_key() {
        let store = JwkMemStore::new();
        let (key_id, jwk) = store.generate(KeyType::Ed25519, JwsAlgorithm::EdDSA).unwrap();
        store.delete(&key_id).unwrap();
        assert!(store.is_empty());
        assert!(store.sign(&key_id, b"x", &jwk).is_err());
        assert!(store.delete(&key_id).is_err());
    }

    #[test]
    fn test_key_id_store() {
        let store = KeyIdMemStore::new();
        let kp = KeyPair::generate();
        let digest = MethodDigest::new("verify", &kp.public_key());
        let key_id = KeyId::generate();

        store.insert_key_id(digest, key_id.clone()).unwrap();
        assert!(store.insert_key_id(digest, KeyId::generate()).is_err());
        assert_eq!(store.get_key_id(&digest).unwrap(), key_id);

        store.delete_key_id(&digest).unwrap();
        assert!(store.get_key_id(&digest).is_err());
    }

    #[test]
    fn test_method_digest_depends_on_fragment() {
        let kp = KeyPair::generate();
        assert_ne!(
            MethodDigest::new("a", &kp.public_key()),
            MethodDigest::new("b", &kp.public_key())
        );
    }
}
