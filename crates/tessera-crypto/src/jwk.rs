use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::keys::PublicKey;

/// Public JSON Web Key for an Ed25519 key (RFC 8037 `OKP`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    /// Base64url-encoded public key.
    pub x: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
}

impl Jwk {
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        Self {
            kty: "OKP".into(),
            crv: "Ed25519".into(),
            x: URL_SAFE_NO_PAD.encode(public_key.as_bytes()),
            alg: Some("EdDSA".into()),
            kid: None,
        }
    }

    pub fn to_public_key(&self) -> Result<PublicKey, CryptoError> {
        if self.kty != "OKP" || self.crv != "Ed25519" {
            return Err(CryptoError::InvalidJwk(format!(
                "unsupported key type {}/{}",
                self.kty, self.crv
            )));
        }
        let bytes = URL_SAFE_NO_PAD
            .decode(&self.x)
            .map_err(|e| CryptoError::InvalidJwk(format!("invalid x coordinate: {}", e)))?;
        PublicKey::try_from(bytes.as_slice())
    }
}
