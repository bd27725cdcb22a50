use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tessera_core::Did;
use tessera_identity::{Credential, JwsSignatureOptions, Jwt, Status, Subject};

use crate::error::CredentialError;
use crate::wallet::Identity;

/// Builds a credential signed by an issuing identity.
pub struct CredentialIssuance<'a> {
    issuer: &'a Identity,
    subject: Option<Did>,
    properties: BTreeMap<String, serde_json::Value>,
    types: Vec<String>,
    fragment: Option<String>,
    revocation: Option<(String, u32)>,
    expiration_date: Option<DateTime<Utc>>,
}

impl<'a> CredentialIssuance<'a> {
    pub(crate) fn new(issuer: &'a Identity) -> Self {
        Self {
            issuer,
            subject: None,
            properties: BTreeMap::new(),
            types: Vec::new(),
            fragment: None,
            revocation: None,
            expiration_date: None,
        }
    }

    pub fn with_subject(self, subject: &Identity) -> Self {
        self.with_subject_did(subject.did().clone())
    }

    pub fn with_subject_did(mut self, did: Did) -> Self {
        self.subject = Some(did);
        self
    }

    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_type(mut self, credential_type: impl Into<String>) -> Self {
        self.types.push(credential_type.into());
        self
    }

    /// The issuer's method that signs the credential.
    pub fn with_verification_method(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    /// Point the credential at index `index` of the issuer's revocation
    /// bitmap service `fragment`.
    pub fn with_revocation_status(mut self, fragment: impl Into<String>, index: u32) -> Self {
        self.revocation = Some((fragment.into(), index));
        self
    }

    pub fn with_expiration_date(mut self, date: DateTime<Utc>) -> Self {
        self.expiration_date = Some(date);
        self
    }

    pub fn create(self) -> Result<Jwt, CredentialError> {
        let subject_did = self.subject.ok_or(CredentialError::MissingSubject)?;
        let fragment = self
            .fragment
            .ok_or(CredentialError::MissingVerificationMethod)?;
        let issuer_did = self.issuer.did().clone();

        let mut subject = Subject::new(subject_did);
        subject.properties = self.properties;

        let mut builder = Credential::builder()
            .id(format!("urn:uuid:{}", uuid::Uuid::now_v7()))
            .issuer(issuer_did.clone())
            .subject(subject);
        for credential_type in self.types {
            builder = builder.type_(credential_type);
        }
        if let Some((service, index)) = self.revocation {
            builder = builder.status(Status::revocation_bitmap(
                issuer_did.join(&service)?,
                index,
            ));
        }
        if let Some(date) = self.expiration_date {
            builder = builder.expiration_date(date);
        }
        let credential = builder.build()?;

        let jwt = self.issuer.document().create_credential_jwt(
            self.issuer.storage(),
            &fragment,
            &credential,
            &JwsSignatureOptions::default(),
        )?;
        tracing::info!(
            issuer = %issuer_did,
            credential_id = credential.id.as_deref().unwrap_or_default(),
            "Issued credential"
        );
        Ok(jwt)
    }
}
