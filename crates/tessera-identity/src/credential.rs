use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use tessera_core::{Did, DidUrl};

use crate::error::IdentityError;
use crate::jwt::{from_timestamp, to_timestamp, CredentialJwtClaims, VcClaim};
use crate::revocation::RevocationBitmap;

pub const BASE_CONTEXT: &str = "https://www.w3.org/2018/credentials/v1";
pub const BASE_TYPE: &str = "VerifiableCredential";

/// The entity a credential makes claims about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Did>,
    #[serde(flatten)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl Subject {
    pub fn new(id: Did) -> Self {
        Self {
            id: Some(id),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }
}

/// Where to look up whether a credential was revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    /// DID URL of the issuer's revocation service.
    pub id: DidUrl,
    #[serde(rename = "type")]
    pub status_type: String,
    pub revocation_bitmap_index: u32,
}

impl Status {
    /// A revocation bitmap status entry.
    pub fn revocation_bitmap(service: DidUrl, index: u32) -> Self {
        Self {
            id: service,
            status_type: RevocationBitmap::TYPE.to_string(),
            revocation_bitmap_index: index,
        }
    }
}

/// A verifiable credential, before or after JWT encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub credential_subject: Subject,
    pub issuer: Did,
    pub issuance_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub non_transferable: Option<bool>,
}

impl Credential {
    pub fn builder() -> CredentialBuilder {
        CredentialBuilder::new()
    }

    pub fn property(&self, key: &str) -> Option<&serde_json::Value> {
        self.credential_subject.properties.get(key)
    }

    pub fn is_non_transferable(&self) -> bool {
        self.non_transferable.unwrap_or(false)
    }

    pub(crate) fn to_jwt_claims(&self) -> CredentialJwtClaims {
        CredentialJwtClaims {
            iss: self.issuer.clone(),
            sub: self.credential_subject.id.clone(),
            nbf: to_timestamp(&self.issuance_date),
            exp: self.expiration_date.as_ref().map(to_timestamp),
            jti: self.id.clone(),
            vc: VcClaim {
                context: self.context.clone(),
                types: self.types.clone(),
                credential_subject: self.credential_subject.properties.clone(),
                credential_status: self.credential_status.clone(),
                non_transferable: self.non_transferable,
            },
        }
    }

    pub(crate) fn from_jwt_claims(claims: CredentialJwtClaims) -> Result<Self, IdentityError> {
        Ok(Self {
            context: claims.vc.context,
            id: claims.jti,
            types: claims.vc.types,
            credential_subject: Subject {
                id: claims.sub,
                properties: claims.vc.credential_subject,
            },
            issuer: claims.iss,
            issuance_date: from_timestamp(claims.nbf)?,
            expiration_date: claims.exp.map(from_timestamp).transpose()?,
            credential_status: claims.vc.credential_status,
            non_transferable: claims.vc.non_transferable,
        })
    }
}

/// Assembles a [`Credential`].
#[derive(Debug, Clone, Default)]
pub struct CredentialBuilder {
    id: Option<String>,
    types: Vec<String>,
    subject: Option<Subject>,
    issuer: Option<Did>,
    issuance_date: Option<DateTime<Utc>>,
    expiration_date: Option<DateTime<Utc>>,
    status: Option<Status>,
    non_transferable: Option<bool>,
}

impl CredentialBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a type besides `VerifiableCredential`.
    pub fn type_(mut self, value: impl Into<String>) -> Self {
        self.types.push(value.into());
        self
    }

    pub fn subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    pub fn issuer(mut self, issuer: Did) -> Self {
        self.issuer = Some(issuer);
        self
    }

    pub fn issuance_date(mut self, date: DateTime<Utc>) -> Self {
        self.issuance_date = Some(date);
        self
    }

    pub fn expiration_date(mut self, date: DateTime<Utc>) -> Self {
        self.expiration_date = Some(date);
        self
    }

    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn non_transferable(mut self, value: bool) -> Self {
        self.non_transferable = Some(value);
        self
    }

    /// Dates are truncated to whole seconds, the granularity of JWT claims.
    pub fn build(self) -> Result<Credential, IdentityError> {
        let issuer = self
            .issuer
            .ok_or_else(|| IdentityError::InvalidCredential("missing issuer".into()))?;
        let subject = self
            .subject
            .ok_or_else(|| IdentityError::InvalidCredential("missing subject".into()))?;
        let issuance_date = self.issuance_date.unwrap_or_else(Utc::now).trunc_subsecs(0);
        let expiration_date = self.expiration_date.map(|d| d.trunc_subsecs(0));
        if expiration_date.is_some_and(|exp| exp < issuance_date) {
            return Err(IdentityError::InvalidCredential(
                "expiration date precedes issuance date".into(),
            ));
        }

        let mut types = vec![BASE_TYPE.to_string()];
        types.extend(self.types.into_iter().filter(|t| t != BASE_TYPE));

        Ok(Credential {
            context: vec![BASE_CONTEXT.to_string()],
            id: self.id,
            types,
            credential_subject: subject,
            issuer,
            issuance_date,
            expiration_date,
            credential_status: self.status,
            non_transferable: self.non_transferable,
        })
    }
}
