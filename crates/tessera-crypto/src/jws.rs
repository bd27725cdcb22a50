//! Compact JWS serialization (RFC 7515) restricted to EdDSA over Ed25519.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};
use crate::signing::Signature;

/// Signature algorithms understood by the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JwsAlgorithm {
    EdDSA,
}

impl std::fmt::Display for JwsAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EdDSA => write!(f, "EdDSA"),
        }
    }
}

/// JWS protected header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwsHeader {
    pub alg: JwsAlgorithm,
    /// Key identifier; a DID URL of a verification method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
    /// Challenge binding a presentation to a request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

impl JwsHeader {
    pub fn new(alg: JwsAlgorithm) -> Self {
        Self {
            alg,
            kid: None,
            typ: None,
            nonce: None,
        }
    }
}

/// A parsed, not yet verified, compact JWS.
#[derive(Debug, Clone)]
pub struct DecodedJws {
    pub header: JwsHeader,
    pub payload: Vec<u8>,
    signing_input: String,
    signature: Signature,
}

impl DecodedJws {
    /// Verify the signature against a public key.
    pub fn verify(&self, public_key: &PublicKey) -> Result<(), CryptoError> {
        match self.header.alg {
            JwsAlgorithm::EdDSA => {
                public_key.verify(self.signing_input.as_bytes(), &self.signature)
            }
        }
    }

    /// Deserialize the payload as JSON.
    pub fn claims<T: serde::de::DeserializeOwned>(&self) -> Result<T, CryptoError> {
        serde_json::from_slice(&self.payload)
            .map_err(|e| CryptoError::MalformedJws(format!("invalid payload: {}", e)))
    }
}

/// Build the `<header>.<payload>` string that gets signed.
pub fn signing_input(header: &JwsHeader, payload: &[u8]) -> Result<String, CryptoError> {
    let header_raw = serde_json::to_vec(header)
        .map_err(|e| CryptoError::InvalidInput(format!("header serialization: {}", e)))?;
    Ok(format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(header_raw),
        URL_SAFE_NO_PAD.encode(payload)
    ))
}

/// Attach a signature to a signing input.
pub fn assemble(signing_input: &str, signature: &Signature) -> String {
    format!(
        "{}.{}",
        signing_input,
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    )
}

/// Sign a payload with a key pair and return the compact serialization.
pub fn encode(header: &JwsHeader, payload: &[u8], keypair: &KeyPair) -> Result<String, CryptoError> {
    let input = signing_input(header, payload)?;
    let signature = keypair.sign(input.as_bytes());
    Ok(assemble(&input, &signature))
}

/// Split and decode a compact JWS without checking its signature.
pub fn decode(token: &str) -> Result<DecodedJws, CryptoError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(CryptoError::MalformedJws(format!(
            "expected 3 segments, got {}",
            parts.len()
        )));
    }

    let header_raw = URL_SAFE_NO_PAD
        .decode(parts[0])
        .map_err(|e| CryptoError::MalformedJws(format!("header encoding: {}", e)))?;
    let header: JwsHeader = serde_json::from_slice(&header_raw)
        .map_err(|e| CryptoError::MalformedJws(format!("header: {}", e)))?;
    let payload = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|e| CryptoError::MalformedJws(format!("payload encoding: {}", e)))?;
    let sig_raw = URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|e| CryptoError::MalformedJws(format!("signature encoding: {}", e)))?;
    let signature = Signature::try_from(sig_raw.as_slice())?;

    Ok(DecodedJws {
        header,
        payload,
        signing_input: format!("{}.{}", parts[0], parts[1]),
        signature,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> JwsHeader {
        JwsHeader {
            kid: Some("did:tessera:tst:0x01#verify".into()),
            typ: Some("JWT".into()),
            ..JwsHeader::new(JwsAlgorithm::EdDSA)
        }
    }

    #[test]
    fn test_encode_decode_verify() {
        let kp = KeyPair::generate();
        let token = encode(&header(), br#"{"iss":"me"}"#, &kp).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = decode(&token).unwrap();
        assert_eq!(decoded.header, header());
        assert_eq!(decoded.payload, br#"{"iss":"me"}"#.to_vec());
        assert!(decoded.verify(&kp.public_key()).is_ok());
    }

    #[test]
    fn test_verify_with_other_key_fails() {
        let kp = KeyPair::generate();
        let other = KeyPair::generate();
        let token = encode(&header(), b"{}", &kp).unwrap();
        let decoded = decode(&token).unwrap();
        assert!(matches!(
            decoded.verify(&other.public_key()),
            Err(CryptoError::SignatureVerificationFailed)
        ));
    }

    #[test]
    fn test_tampered_payload_fails() {
        let kp = KeyPair::generate();
        let token = encode(&header(), br#"{"a":1}"#, &kp).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = format!(
            "{}.{}.{}",
            parts[0],
            URL_SAFE_NO_PAD.encode(br#"{"a":2}"#),
            parts[2]
        );
        let decoded = decode(&forged).unwrap();
        assert!(decoded.verify(&kp.public_key()).is_err());
    }

    #[test]
    fn test_nonce_in_header() {
        let kp = KeyPair::generate();
        let mut h = header();
        h.nonce = Some("12345".into());
        let token = encode(&h, b"{}", &kp).unwrap();
        assert_eq!(decode(&token).unwrap().header.nonce.as_deref(), Some("12345"));
    }

    #[test]
    fn test_decode_wrong_segments() {
        assert!(matches!(decode("a.b"), Err(CryptoError::MalformedJws(_))));
        assert!(matches!(decode("a.b.c.d"), Err(CryptoError::MalformedJws(_))));
    }

    #[test]
    fn test_decode_bad_header() {
        let bogus = format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(b"not json"),
            URL_SAFE_NO_PAD.encode(b"{}"),
            URL_SAFE_NO_PAD.encode([0u8; 64])
        );
        assert!(matches!(decode(&bogus), Err(CryptoError::MalformedJws(_))));
    }

    #[test]
    fn test_decode_unknown_algorithm() {
        let bogus = format!(
            "{}.{}.{}",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256"}"#),
            URL_SAFE_NO_PAD.encode(b"{}"),
            URL_SAFE_NO_PAD.encode([0u8; 64])
        );
        assert!(decode(&bogus).is_err());
    }

    #[test]
    fn test_claims() {
        let kp = KeyPair::generate();
        let token = encode(&header(), br#"{"iss":"me"}"#, &kp).unwrap();
        let claims: serde_json::Value = decode(&token).unwrap().claims().unwrap();
        assert_eq!(claims["iss"], "me");
    }
}
