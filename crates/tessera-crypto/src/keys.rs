use std::fmt;
use std::str::FromStr;

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CryptoError;
use crate::signing::Signature;

/// Length of an Ed25519 public key or seed.
pub const KEY_LENGTH: usize = 32;

/// Ed25519 signing key controlling an address or a DID document method.
///
/// `ed25519-dalek` wipes the secret scalar on drop.
pub struct KeyPair {
    secret: SigningKey,
}

impl KeyPair {
    pub fn generate() -> Self {
        Self {
            secret: SigningKey::generate(&mut OsRng),
        }
    }

    /// Deterministic key pair, used for mnemonic derivation.
    pub fn from_seed(seed: &[u8; KEY_LENGTH]) -> Self {
        Self {
            secret: SigningKey::from_bytes(seed),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.secret.verifying_key())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.secret.sign(message))
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair({})", self.public_key())
    }
}

/// Ed25519 verifying key. Displays and serializes as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PublicKey {
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        self.0.as_bytes()
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        self.0
            .verify(message, &signature.0)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = CryptoError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let raw: [u8; KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|_| CryptoError::InvalidKeyLength {
                    expected: KEY_LENGTH,
                    actual: bytes.len(),
                })?;
        VerifyingKey::from_bytes(&raw)
            .map(PublicKey)
            .map_err(|e| CryptoError::InvalidInput(format!("not an Ed25519 point: {}", e)))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.as_bytes()))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self)
    }
}

impl FromStr for PublicKey {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s)
            .map_err(|e| CryptoError::InvalidInput(format!("public key hex: {}", e)))?;
        Self::try_from(bytes.as_slice())
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_is_deterministic() {
        let a = KeyPair::from_seed(&[42u8; 32]);
        let b = KeyPair::from_seed(&[42u8; 32]);
        assert_eq!(a.public_key(), b.public_key());
        assert_ne!(a.public_key(), KeyPair::generate().public_key());
    }

    #[test]
    fn test_public_key_wrong_length() {
        assert!(matches!(
            PublicKey::try_from([0u8; 31].as_slice()),
            Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 31
            })
        ));
    }

    #[test]
    fn test_public_key_text_forms() {
        let pk = KeyPair::from_seed(&[1u8; 32]).public_key();
        let text = pk.to_string();
        assert_eq!(text.len(), 64);
        assert_eq!(text.parse::<PublicKey>().unwrap(), pk);

        let json = serde_json::to_string(&pk).unwrap();
        assert_eq!(json, format!("\"{}\"", text));
        assert!("zz".parse::<PublicKey>().is_err());
    }

    #[test]
    fn test_debug_shows_only_public_half() {
        let kp = KeyPair::from_seed(&[3u8; 32]);
        let rendered = format!("{:?}", kp);
        assert!(rendered.contains(&kp.public_key().to_string()));
        assert!(!rendered.contains(&hex::encode([3u8; 32])));
    }
}
