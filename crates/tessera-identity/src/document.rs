use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tessera_core::{Did, DidUrl};
use tessera_crypto::jws::{self, JwsAlgorithm, JwsHeader};
use tessera_crypto::Jwk;

use crate::credential::Credential;
use crate::error::IdentityError;
use crate::jwt::{JwsSignatureOptions, Jwt, JwtPresentationOptions};
use crate::presentation::Presentation;
use crate::revocation::RevocationBitmap;
use crate::storage::{KeyType, MethodDigest, Storage};

/// Magic bytes prefixed to packed documents.
const PACK_MAGIC: &[u8; 3] = b"DID";
/// Version byte following the magic.
const PACK_VERSION: u8 = 1;

/// A public key a DID controller can prove possession of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    pub id: DidUrl,
    pub controller: Did,
    #[serde(rename = "type")]
    pub method_type: String,
    pub public_key_jwk: Jwk,
}

impl VerificationMethod {
    pub const JSON_WEB_KEY: &'static str = "JsonWebKey";

    pub fn fragment(&self) -> Option<&str> {
        self.id.fragment()
    }
}

/// Relationship a verification method is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MethodScope {
    /// Embedded in `verificationMethod` with no relationship.
    VerificationMethod,
    Authentication,
    AssertionMethod,
}

/// A service endpoint in a DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: DidUrl,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deactivated: bool,
}

/// DID document of the Tessera method.
///
/// Created under a placeholder DID; the ledger assigns the real one when
/// the document is first published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    id: Did,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    verification_method: Vec<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    authentication: Vec<DidUrl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    assertion_method: Vec<DidUrl>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    service: Vec<Service>,
    #[serde(default)]
    metadata: DocumentMetadata,
}

impl DidDocument {
    /// A fresh document with a placeholder DID on `network`.
    pub fn new(network: &str) -> Result<Self, IdentityError> {
        let now = Utc::now();
        Ok(Self {
            id: Did::placeholder(network)?,
            verification_method: Vec::new(),
            authentication: Vec::new(),
            assertion_method: Vec::new(),
            service: Vec::new(),
            metadata: DocumentMetadata {
                created: Some(now),
                updated: Some(now),
                deactivated: false,
            },
        })
    }

    pub fn id(&self) -> &Did {
        &self.id
    }

    pub fn methods(&self) -> &[VerificationMethod] {
        &self.verification_method
    }

    pub fn service(&self) -> &[Service] {
        &self.service
    }

    pub fn metadata(&self) -> &DocumentMetadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut DocumentMetadata {
        &mut self.metadata
    }

    /// Generate a key in `storage` and add it as a verification method.
    ///
    /// Returns the method's fragment.
    pub fn generate_method(
        &mut self,
        storage: &Storage,
        key_type: KeyType,
        alg: JwsAlgorithm,
        fragment: &str,
        scope: MethodScope,
    ) -> Result<String, IdentityError> {
        let fragment = fragment.trim_start_matches('#');
        let id = self.id.join(fragment)?;
        if self.fragment_in_use(fragment) {
            return Err(IdentityError::DuplicateFragment(fragment.to_string()));
        }

        let (key_id, jwk) = storage.key_storage().generate(key_type, alg)?;
        let digest = MethodDigest::new(fragment, &jwk.to_public_key()?);
        if let Err(e) = storage.key_id_storage().insert_key_id(digest, key_id.clone()) {
            storage.key_storage().delete(&key_id)?;
            return Err(e);
        }

        match scope {
            MethodScope::VerificationMethod => {}
            MethodScope::Authentication => self.authentication.push(id.clone()),
            MethodScope::AssertionMethod => self.assertion_method.push(id.clone()),
        }
        self.verification_method.push(VerificationMethod {
            id,
            controller: self.id.clone(),
            method_type: VerificationMethod::JSON_WEB_KEY.to_string(),
            public_key_jwk: jwk,
        });
        self.touch();

        tracing::debug!(did = %self.id, fragment = fragment, "Generated verification method");
        Ok(fragment.to_string())
    }

    /// Remove a method and delete its key from `storage`.
    pub fn purge_method(&mut self, storage: &Storage, query: &str) -> Result<(), IdentityError> {
        let method = self.resolve_method(query, None)?.clone();
        let fragment = method
            .fragment()
            .ok_or_else(|| IdentityError::MethodNotFound(query.to_string()))?;
        let digest = MethodDigest::new(fragment, &method.public_key_jwk.to_public_key()?);
        let key_id = storage.key_id_storage().get_key_id(&digest)?;
        storage.key_storage().delete(&key_id)?;
        storage.key_id_storage().delete_key_id(&digest)?;

        self.verification_method.retain(|m| m.id != method.id);
        self.authentication.retain(|id| id != &method.id);
        self.assertion_method.retain(|id| id != &method.id);
        self.touch();
        Ok(())
    }

    /// Find a verification method by fragment (`verify` or `#verify`) or
    /// full DID URL, optionally restricted to a relationship.
    pub fn resolve_method(
        &self,
        query: &str,
        scope: Option<MethodScope>,
    ) -> Result<&VerificationMethod, IdentityError> {
        let fragment = self.query_fragment(query)?;
        let method = self
            .verification_method
            .iter()
            .find(|m| m.fragment() == Some(fragment))
            .ok_or_else(|| IdentityError::MethodNotFound(query.to_string()))?;

        let in_scope = match scope {
            None | Some(MethodScope::VerificationMethod) => true,
            Some(MethodScope::Authentication) => self.authentication.contains(&method.id),
            Some(MethodScope::AssertionMethod) => self.assertion_method.contains(&method.id),
        };
        if !in_scope {
            return Err(IdentityError::MethodNotFound(format!(
                "{} is not in scope {:?}",
                query, scope
            )));
        }
        Ok(method)
    }

    pub fn insert_service(&mut self, service: Service) -> Result<(), IdentityError> {
        if service.id.did() != &self.id {
            return Err(IdentityError::InvalidService(format!(
                "{} does not belong to {}",
                service.id, self.id
            )));
        }
        let fragment = service
            .id
            .fragment()
            .ok_or_else(|| IdentityError::InvalidService("service id needs a fragment".into()))?;
        if self.fragment_in_use(fragment) {
            return Err(IdentityError::DuplicateFragment(fragment.to_string()));
        }
        self.service.push(service);
        self.touch();
        Ok(())
    }

    pub fn remove_service(&mut self, query: &str) -> Result<Service, IdentityError> {
        let fragment = self.query_fragment(query)?;
        let position = self
            .service
            .iter()
            .position(|s| s.id.fragment() == Some(fragment))
            .ok_or_else(|| IdentityError::ServiceNotFound(query.to_string()))?;
        self.touch();
        Ok(self.service.remove(position))
    }

    pub fn resolve_service(&self, query: &str) -> Result<&Service, IdentityError> {
        let fragment = self.query_fragment(query)?;
        self.service
            .iter()
            .find(|s| s.id.fragment() == Some(fragment))
            .ok_or_else(|| IdentityError::ServiceNotFound(query.to_string()))
    }

    /// Mark credential indices as revoked in a revocation bitmap service.
    pub fn revoke_credentials(
        &mut self,
        service_query: &str,
        indices: &[u32],
    ) -> Result<(), IdentityError> {
        self.update_bitmap(service_query, |bitmap| {
            for &index in indices {
                bitmap.revoke(index);
            }
        })
    }

    pub fn unrevoke_credentials(
        &mut self,
        service_query: &str,
        indices: &[u32],
    ) -> Result<(), IdentityError> {
        self.update_bitmap(service_query, |bitmap| {
            for &index in indices {
                bitmap.unrevoke(index);
            }
        })
    }

    /// Serialize for an alias output's state metadata.
    pub fn pack(&self) -> Result<Vec<u8>, IdentityError> {
        let json = serde_json::to_vec(self)?;
        let mut bytes = Vec::with_capacity(PACK_MAGIC.len() + 1 + json.len());
        bytes.extend_from_slice(PACK_MAGIC);
        bytes.push(PACK_VERSION);
        bytes.extend_from_slice(&json);
        Ok(bytes)
    }

    /// Deserialize state metadata published under `did`.
    ///
    /// A document packed under the placeholder DID is rebound to `did`.
    /// Empty metadata means the DID was deactivated.
    pub fn unpack(did: &Did, bytes: &[u8]) -> Result<Self, IdentityError> {
        if bytes.is_empty() {
            let mut document = Self::new(did.network())?;
            document.set_id(did);
            document.metadata = DocumentMetadata {
                deactivated: true,
                ..DocumentMetadata::default()
            };
            return Ok(document);
        }

        let json = bytes
            .strip_prefix(PACK_MAGIC.as_slice())
            .ok_or_else(|| IdentityError::InvalidDocument("missing DID marker".into()))?;
        let (&version, json) = json
            .split_first()
            .ok_or_else(|| IdentityError::InvalidDocument("missing version".into()))?;
        if version != PACK_VERSION {
            return Err(IdentityError::InvalidDocument(format!(
                "unsupported version {}",
                version
            )));
        }

        let mut document: Self = serde_json::from_slice(json)?;
        if document.id.is_placeholder() {
            document.set_id(did);
        } else if &document.id != did {
            return Err(IdentityError::InvalidDocument(format!(
                "document id {} does not match {}",
                document.id, did
            )));
        }
        Ok(document)
    }

    /// Sign a credential as a JWT with the method `fragment`.
    pub fn create_credential_jwt(
        &self,
        storage: &Storage,
        fragment: &str,
        credential: &Credential,
        options: &JwsSignatureOptions,
    ) -> Result<Jwt, IdentityError> {
        if credential.issuer != self.id {
            return Err(IdentityError::InvalidCredential(format!(
                "issuer {} is not {}",
                credential.issuer, self.id
            )));
        }
        let payload = serde_json::to_vec(&credential.to_jwt_claims())?;
        self.sign_jws(storage, fragment, &payload, options)
    }

    /// Sign a presentation as a JWT with the method `fragment`.
    pub fn create_presentation_jwt(
        &self,
        storage: &Storage,
        fragment: &str,
        presentation: &Presentation,
        signature_options: &JwsSignatureOptions,
        presentation_options: &JwtPresentationOptions,
    ) -> Result<Jwt, IdentityError> {
        if presentation.holder != self.id {
            return Err(IdentityError::InvalidCredential(format!(
                "holder {} is not {}",
                presentation.holder, self.id
            )));
        }
        let claims = presentation.to_jwt_claims(presentation_options);
        let payload = serde_json::to_vec(&claims)?;
        self.sign_jws(storage, fragment, &payload, signature_options)
    }

    fn sign_jws(
        &self,
        storage: &Storage,
        fragment: &str,
        payload: &[u8],
        options: &JwsSignatureOptions,
    ) -> Result<Jwt, IdentityError> {
        let method = self.resolve_method(fragment, None)?;
        let method_fragment = method
            .fragment()
            .ok_or_else(|| IdentityError::MethodNotFound(fragment.to_string()))?;
        let digest = MethodDigest::new(method_fragment, &method.public_key_jwk.to_public_key()?);
        let key_id = storage.key_id_storage().get_key_id(&digest)?;

        let header = JwsHeader {
            kid: Some(method.id.to_string()),
            typ: Some(options.typ.clone().unwrap_or_else(|| "JWT".to_string())),
            nonce: options.nonce.clone(),
            ..JwsHeader::new(JwsAlgorithm::EdDSA)
        };
        let input = jws::signing_input(&header, payload)?;
        let signature =
            storage
                .key_storage()
                .sign(&key_id, input.as_bytes(), &method.public_key_jwk)?;
        Ok(Jwt::new(jws::assemble(&input, &signature)))
    }

    fn update_bitmap(
        &mut self,
        service_query: &str,
        f: impl FnOnce(&mut RevocationBitmap),
    ) -> Result<(), IdentityError> {
        let fragment = self.query_fragment(service_query)?.to_string();
        let service = self
            .service
            .iter_mut()
            .find(|s| s.id.fragment() == Some(fragment.as_str()))
            .ok_or_else(|| IdentityError::ServiceNotFound(service_query.to_string()))?;
        let mut bitmap = RevocationBitmap::try_from(&*service)?;
        f(&mut bitmap);
        service.service_endpoint = bitmap.to_endpoint();
        self.touch();
        Ok(())
    }

    fn query_fragment<'q>(&self, query: &'q str) -> Result<&'q str, IdentityError> {
        if query.starts_with("did:") {
            let (did, fragment) = query
                .split_once('#')
                .ok_or_else(|| IdentityError::MethodNotFound(query.to_string()))?;
            if did != self.id.to_string() {
                return Err(IdentityError::MethodNotFound(query.to_string()));
            }
            Ok(fragment)
        } else {
            Ok(query.trim_start_matches('#'))
        }
    }

    fn fragment_in_use(&self, fragment: &str) -> bool {
        self.verification_method
            .iter()
            .any(|m| m.fragment() == Some(fragment))
            || self.service.iter().any(|s| s.id.fragment() == Some(fragment))
    }

    fn set_id(&mut self, did: &Did) {
        for method in &mut self.verification_method {
            method.id = method.id.with_did(did.clone());
            method.controller = did.clone();
        }
        for id in self
            .authentication
            .iter_mut()
            .chain(self.assertion_method.iter_mut())
        {
            *id = id.with_did(did.clone());
        }
        for service in &mut self.service {
            service.id = service.id.with_did(did.clone());
        }
        self.id = did.clone();
    }

    fn touch(&mut self) {
        self.metadata.updated = Some(Utc::now());
    }
}
