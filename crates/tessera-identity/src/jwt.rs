//! JWT encodings of credentials and presentations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_core::Did;

use crate::credential::Status;
use crate::error::IdentityError;

/// A compact JWS carrying credential or presentation claims.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Jwt(String);

impl Jwt {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for Jwt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Jwt {
    fn from(token: String) -> Self {
        Self(token)
    }
}

/// Options for the JWS protected header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JwsSignatureOptions {
    /// Challenge from the party that requested the token.
    pub nonce: Option<String>,
    /// Overrides the default `typ` of `JWT`.
    pub typ: Option<String>,
}

impl JwsSignatureOptions {
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }
}

/// Claims a holder adds around a presentation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JwtPresentationOptions {
    /// Defaults to the time of signing.
    pub issuance_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub audience: Option<String>,
}

/// The `vc` claim: credential fields not mapped to registered claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VcClaim {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// Subject properties without the subject id, which travels as `sub`.
    pub credential_subject: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_transferable: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialJwtClaims {
    pub iss: Did,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<Did>,
    /// Issuance date, unix seconds.
    pub nbf: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    pub vc: VcClaim,
}

/// The `vp` claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VpClaim {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub verifiable_credential: Vec<Jwt>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationJwtClaims {
    /// The holder.
    pub iss: Did,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    pub vp: VpClaim,
}

pub(crate) fn to_timestamp(date: &DateTime<Utc>) -> i64 {
    date.timestamp()
}

pub(crate) fn from_timestamp(seconds: i64) -> Result<DateTime<Utc>, IdentityError> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| IdentityError::InvalidCredential(format!("timestamp out of range: {}", seconds)))
}
