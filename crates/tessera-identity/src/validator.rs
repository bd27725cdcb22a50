//! Validation of credential and presentation JWTs against the DID
//! documents of their signers.

use chrono::{DateTime, Utc};
use tessera_core::{Did, DidUrl};
use tessera_crypto::jws::{self, DecodedJws, JwsHeader};

use crate::credential::Credential;
use crate::document::DidDocument;
use crate::error::IdentityError;
use crate::jwt::{from_timestamp, CredentialJwtClaims, Jwt, PresentationJwtClaims};
use crate::presentation::Presentation;
use crate::revocation::RevocationBitmap;

/// A single reason a credential or presentation is not valid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("protected header has no kid")]
    MissingKid,

    #[error("verification method {0} not found in the signer's document")]
    MethodNotFound(String),

    #[error("signature verification failed")]
    InvalidSignature,

    #[error("signer {actual} does not match document {expected}")]
    DocumentMismatch { expected: Did, actual: Did },

    #[error("expired at {0}")]
    Expired(DateTime<Utc>),

    #[error("issued at {0}, which is later than accepted")]
    IssuanceDate(DateTime<Utc>),

    #[error("credential index {0} has been revoked")]
    Revoked(u32),

    #[error("invalid credential status: {0}")]
    InvalidStatus(String),

    #[error("credential subject does not match holder {0}")]
    SubjectHolderRelationship(Did),

    #[error("nonce mismatch: expected {expected:?}, got {actual:?}")]
    NonceMismatch {
        expected: Option<String>,
        actual: Option<String>,
    },
}

/// Every failure found while validating one credential.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("[{}]", join_messages(.validation_errors))]
pub struct CompoundCredentialValidationError {
    pub validation_errors: Vec<ValidationError>,
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ValidationError> for CompoundCredentialValidationError {
    fn from(error: ValidationError) -> Self {
        Self {
            validation_errors: vec![error],
        }
    }
}

/// Whether to stop at the first failed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailFast {
    FirstError,
    #[default]
    AllErrors,
}

/// How a credential's subject must relate to the presenting holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectHolderRelationship {
    /// The holder must be the subject.
    AlwaysSubject,
    /// The holder must be the subject if the credential is non-transferable.
    SubjectOnNonTransferable,
    Any,
}

/// Handling of `credentialStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusCheck {
    /// Unsupported status types are errors.
    #[default]
    Strict,
    SkipUnsupported,
    SkipAll,
}

#[derive(Debug, Clone, Default)]
pub struct JwtCredentialValidationOptions {
    /// Credentials expiring before this are invalid. Defaults to now.
    pub earliest_expiry_date: Option<DateTime<Utc>>,
    /// Credentials issued after this are invalid. Defaults to now.
    pub latest_issuance_date: Option<DateTime<Utc>>,
    pub status: StatusCheck,
    pub subject_holder_relationship: Option<(Did, SubjectHolderRelationship)>,
}

impl JwtCredentialValidationOptions {
    pub fn subject_holder_relationship(
        mut self,
        holder: Did,
        relationship: SubjectHolderRelationship,
    ) -> Self {
        self.subject_holder_relationship = Some((holder, relationship));
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct JwtPresentationValidationOptions {
    /// The nonce the presentation's header must carry.
    pub nonce: Option<String>,
    pub earliest_expiry_date: Option<DateTime<Utc>>,
    pub latest_issuance_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct DecodedJwtCredential {
    pub credential: Credential,
    pub header: JwsHeader,
}

#[derive(Debug, Clone)]
pub struct DecodedJwtPresentation {
    pub presentation: Presentation,
    pub header: JwsHeader,
    pub issuance_date: Option<DateTime<Utc>>,
    pub expiration_date: Option<DateTime<Utc>>,
    pub aud: Option<String>,
}

/// Decode a JWS and check its signature against the method named by `kid`.
fn verify_signature(token: &str, signer: &DidDocument) -> Result<DecodedJws, ValidationError> {
    let decoded = jws::decode(token).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    let kid = decoded
        .header
        .kid
        .as_deref()
        .ok_or(ValidationError::MissingKid)?;
    let kid = DidUrl::parse(kid).map_err(|e| ValidationError::Malformed(e.to_string()))?;
    if kid.did() != signer.id() {
        return Err(ValidationError::DocumentMismatch {
            expected: signer.id().clone(),
            actual: kid.did().clone(),
        });
    }
    let method = signer
        .resolve_method(&kid.to_string(), None)
        .map_err(|_| ValidationError::MethodNotFound(kid.to_string()))?;
    let public_key = method
        .public_key_jwk
        .to_public_key()
        .map_err(|e| ValidationError::Malformed(e.to_string()))?;
    decoded
        .verify(&public_key)
        .map_err(|_| ValidationError::InvalidSignature)?;
    Ok(decoded)
}

/// Validates credential JWTs.
#[derive(Debug, Clone, Default)]
pub struct JwtCredentialValidator;

impl JwtCredentialValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a credential issued by `issuer`.
    ///
    /// A token whose signature can not be verified fails right away. The
    /// remaining checks run in order: expiry, issuance date, revocation
    /// status, subject-holder relationship.
    pub fn validate(
        &self,
        jwt: &Jwt,
        issuer: &DidDocument,
        options: &JwtCredentialValidationOptions,
        fail_fast: FailFast,
    ) -> Result<DecodedJwtCredential, CompoundCredentialValidationError> {
        let decoded = verify_signature(jwt.as_str(), issuer)?;
        let claims: CredentialJwtClaims = decoded
            .claims()
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        let credential = Credential::from_jwt_claims(claims)
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        if &credential.issuer != issuer.id() {
            return Err(ValidationError::DocumentMismatch {
                expected: issuer.id().clone(),
                actual: credential.issuer.clone(),
            }
            .into());
        }

        let now = Utc::now();
        let checks: [&dyn Fn() -> Result<(), ValidationError>; 4] = [
            &|| check_expiry(&credential, options.earliest_expiry_date.unwrap_or(now)),
            &|| check_issuance(&credential, options.latest_issuance_date.unwrap_or(now)),
            &|| check_status(&credential, issuer, options.status),
            &|| check_relationship(&credential, options.subject_holder_relationship.as_ref()),
        ];

        let mut errors = Vec::new();
        for check in checks {
            if let Err(e) = check() {
                errors.push(e);
                if fail_fast == FailFast::FirstError {
                    break;
                }
            }
        }

        if !errors.is_empty() {
            return Err(CompoundCredentialValidationError {
                validation_errors: errors,
            });
        }
        Ok(DecodedJwtCredential {
            credential,
            header: decoded.header,
        })
    }

    /// The `iss` claim of a credential JWT, without validating it.
    pub fn extract_issuer_from_jwt(jwt: &Jwt) -> Result<Did, IdentityError> {
        let claims: CredentialJwtClaims = jws::decode(jwt.as_str())?.claims()?;
        Ok(claims.iss)
    }
}

fn check_expiry(credential: &Credential, earliest: DateTime<Utc>) -> Result<(), ValidationError> {
    match credential.expiration_date {
        Some(exp) if exp < earliest => Err(ValidationError::Expired(exp)),
        _ => Ok(()),
    }
}

fn check_issuance(credential: &Credential, latest: DateTime<Utc>) -> Result<(), ValidationError> {
    if credential.issuance_date > latest {
        return Err(ValidationError::IssuanceDate(credential.issuance_date));
    }
    Ok(())
}

fn check_status(
    credential: &Credential,
    issuer: &DidDocument,
    check: StatusCheck,
) -> Result<(), ValidationError> {
    let status = match (&credential.credential_status, check) {
        (None, _) | (_, StatusCheck::SkipAll) => return Ok(()),
        (Some(status), _) => status,
    };
    if status.status_type != RevocationBitmap::TYPE {
        return match check {
            StatusCheck::Strict => Err(ValidationError::InvalidStatus(format!(
                "unsupported status type {}",
                status.status_type
            ))),
            _ => Ok(()),
        };
    }
    if status.id.did() != issuer.id() {
        return Err(ValidationError::InvalidStatus(format!(
            "status {} is not a service of the issuer",
            status.id
        )));
    }
    let service = issuer
        .resolve_service(&status.id.to_string())
        .map_err(|e| ValidationError::InvalidStatus(e.to_string()))?;
    let bitmap = RevocationBitmap::try_from(service)
        .map_err(|e| ValidationError::InvalidStatus(e.to_string()))?;
    if bitmap.is_revoked(status.revocation_bitmap_index) {
        return Err(ValidationError::Revoked(status.revocation_bitmap_index));
    }
    Ok(())
}

fn check_relationship(
    credential: &Credential,
    relationship: Option<&(Did, SubjectHolderRelationship)>,
) -> Result<(), ValidationError> {
    let Some((holder, relationship)) = relationship else {
        return Ok(());
    };
    let must_match = match relationship {
        SubjectHolderRelationship::AlwaysSubject => true,
        SubjectHolderRelationship::SubjectOnNonTransferable => credential.is_non_transferable(),
        SubjectHolderRelationship::Any => false,
    };
    if must_match && credential.credential_subject.id.as_ref() != Some(holder) {
        return Err(ValidationError::SubjectHolderRelationship(holder.clone()));
    }
    Ok(())
}

/// Validates presentation JWTs.
#[derive(Debug, Clone, Default)]
pub struct JwtPresentationValidator;

impl JwtPresentationValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a presentation signed by `holder`. Embedded credentials are
    /// not validated here.
    pub fn validate(
        &self,
        jwt: &Jwt,
        holder: &DidDocument,
        options: &JwtPresentationValidationOptions,
    ) -> Result<DecodedJwtPresentation, ValidationError> {
        let decoded = verify_signature(jwt.as_str(), holder)?;

        if let Some(expected) = &options.nonce {
            if decoded.header.nonce.as_ref() != Some(expected) {
                return Err(ValidationError::NonceMismatch {
                    expected: Some(expected.clone()),
                    actual: decoded.header.nonce.clone(),
                });
            }
        }

        let claims: PresentationJwtClaims = decoded
            .claims()
            .map_err(|e| ValidationError::Malformed(e.to_string()))?;
        if &claims.iss != holder.id() {
            return Err(ValidationError::DocumentMismatch {
                expected: holder.id().clone(),
                actual: claims.iss,
            });
        }

        let to_date = |seconds: Option<i64>| {
            seconds
                .map(from_timestamp)
                .transpose()
                .map_err(|e| ValidationError::Malformed(e.to_string()))
        };
        let issuance_date = to_date(claims.nbf)?;
        let expiration_date = to_date(claims.exp)?;

        let now = Utc::now();
        if let Some(exp) = expiration_date {
            if exp < options.earliest_expiry_date.unwrap_or(now) {
                return Err(ValidationError::Expired(exp));
            }
        }
        if let Some(nbf) = issuance_date {
            if nbf > options.latest_issuance_date.unwrap_or(now) {
                return Err(ValidationError::IssuanceDate(nbf));
            }
        }

        let aud = claims.aud.clone();
        Ok(DecodedJwtPresentation {
            presentation: Presentation::from_jwt_claims(claims),
            header: decoded.header,
            issuance_date,
            expiration_date,
            aud,
        })
    }

    /// The holder (`iss`) of a presentation JWT, without validating it.
    pub fn extract_holder(jwt: &Jwt) -> Result<Did, IdentityError> {
        let claims: PresentationJwtClaims = jws::decode(jwt.as_str())?.claims()?;
        Ok(claims.iss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{Status, Subject};
    use crate::document::MethodScope;
    use crate::jwt::{JwsSignatureOptions, JwtPresentationOptions};
    use crate::storage::{KeyType, Storage};
    use tessera_core::AliasId;
    use tessera_crypto::JwsAlgorithm;

    struct Party {
        document: DidDocument,
        storage: Storage,
    }

    fn party(byte: u8, revocation: bool) -> Party {
        let storage = Storage::default();
        let mut document = DidDocument::new("tst").unwrap();
        document
            .generate_method(
                &storage,
                KeyType::Ed25519,
                JwsAlgorithm::EdDSA,
                "verify",
                MethodScope::VerificationMethod,
            )
            .unwrap();
        if revocation {
            let service = RevocationBitmap::new().to_service(document.id().join("revoke").unwrap());
            document.insert_service(service).unwrap();
        }
        let did = Did::from_alias_id("tst", AliasId::new([byte; 32])).unwrap();
        let document = DidDocument::unpack(&did, &document.pack().unwrap()).unwrap();
        Party { document, storage }
    }

    fn issue(issuer: &Party, subject: &Did, status_index: Option<u32>) -> Jwt {
        let mut builder = Credential::builder()
            .issuer(issuer.document.id().clone())
            .subject(Subject::new(subject.clone()).with_property("degree", "Degree"));
        if let Some(index) = status_index {
            builder = builder.status(Status::revocation_bitmap(
                issuer.document.id().join("revoke").unwrap(),
                index,
            ));
        }
        issuer
            .document
            .create_credential_jwt(
                &issuer.storage,
                "verify",
                &builder.build().unwrap(),
                &JwsSignatureOptions::default(),
            )
            .unwrap()
    }

    fn strict(holder: &Did) -> JwtCredentialValidationOptions {
        JwtCredentialValidationOptions::default()
            .subject_holder_relationship(holder.clone(), SubjectHolderRelationship::AlwaysSubject)
    }

    #[test]
    fn test_valid_credential() {
        let college = party(1, true);
        let hans = party(2, false);
        let jwt = issue(&college, hans.document.id(), Some(1));

        let decoded = JwtCredentialValidator::new()
            .validate(&jwt, &college.document, &strict(hans.document.id()), FailFast::FirstError)
            .unwrap();
        assert_eq!(decoded.credential.property("degree").unwrap(), "Degree");
        assert_eq!(
            JwtCredentialValidator::extract_issuer_from_jwt(&jwt).unwrap(),
            *college.document.id()
        );
    }

    #[test]
    fn test_revoked_credential() {
        let mut college = party(1, true);
        let hans = party(2, false);
        let jwt = issue(&college, hans.document.id(), Some(1));
        college.document.revoke_credentials("revoke", &[1]).unwrap();

        let err = JwtCredentialValidator::new()
            .validate(&jwt, &college.document, &strict(hans.document.id()), FailFast::FirstError)
            .unwrap_err();
        assert_eq!(err.validation_errors, vec![ValidationError::Revoked(1)]);
    }

    #[test]
    fn test_wrong_issuer_document() {
        let college = party(1, true);
        let other = party(3, false);
        let jwt = issue(&college, other.document.id(), None);
        let err = JwtCredentialValidator::new()
            .validate(
                &jwt,
                &other.document,
                &JwtCredentialValidationOptions::default(),
                FailFast::AllErrors,
            )
            .unwrap_err();
        assert!(matches!(
            err.validation_errors[0],
            ValidationError::DocumentMismatch { .. }
        ));
    }

    #[test]
    fn test_all_errors_collected() {
        let mut college = party(1, true);
        let hans = party(2, false);
        let mallory = party(4, false);
        let jwt = issue(&college, hans.document.id(), Some(7));
        college.document.revoke_credentials("revoke", &[7]).unwrap();

        let options = JwtCredentialValidationOptions {
            earliest_expiry_date: None,
            latest_issuance_date: Some(Utc::now() - chrono::Duration::days(1)),
            ..strict(mallory.document.id())
        };

        let all = JwtCredentialValidator::new()
            .validate(&jwt, &college.document, &options, FailFast::AllErrors)
            .unwrap_err();
        assert_eq!(all.validation_errors.len(), 3);
        assert!(matches!(all.validation_errors[0], ValidationError::IssuanceDate(_)));
        assert_eq!(all.validation_errors[1], ValidationError::Revoked(7));
        assert!(matches!(
            all.validation_errors[2],
            ValidationError::SubjectHolderRelationship(_)
        ));

        let first = JwtCredentialValidator::new()
            .validate(&jwt, &college.document, &options, FailFast::FirstError)
            .unwrap_err();
        assert_eq!(first.validation_errors.len(), 1);
    }

    #[test]
    fn test_expired_credential() {
        let college = party(1, false);
        let hans = party(2, false);
        let credential = Credential::builder()
            .issuer(college.document.id().clone())
            .subject(Subject::new(hans.document.id().clone()))
            .issuance_date(Utc::now() - chrono::Duration::days(2))
            .expiration_date(Utc::now() - chrono::Duration::days(1))
            .build()
            .unwrap();
        let jwt = college
            .document
            .create_credential_jwt(&college.storage, "verify", &credential, &Default::default())
            .unwrap();
        let err = JwtCredentialValidator::new()
            .validate(&jwt, &college.document, &Default::default(), FailFast::FirstError)
            .unwrap_err();
        assert!(matches!(err.validation_errors[0], ValidationError::Expired(_)));
    }

    #[test]
    fn test_unsupported_status_type() {
        let college = party(1, false);
        let hans = party(2, false);
        let mut status = Status::revocation_bitmap(college.document.id().join("status").unwrap(), 0);
        status.status_type = "StatusList2021".into();
        let credential = Credential::builder()
            .issuer(college.document.id().clone())
            .subject(Subject::new(hans.document.id().clone()))
            .status(status)
            .build()
            .unwrap();
        let jwt = college
            .document
            .create_credential_jwt(&college.storage, "verify", &credential, &Default::default())
            .unwrap();

        let validator = JwtCredentialValidator::new();
        assert!(validator
            .validate(&jwt, &college.document, &Default::default(), FailFast::FirstError)
            .is_err());
        let lenient = JwtCredentialValidationOptions {
            status: StatusCheck::SkipUnsupported,
            ..Default::default()
        };
        assert!(validator
            .validate(&jwt, &college.document, &lenient, FailFast::FirstError)
            .is_ok());
    }

    #[test]
    fn test_non_transferable_relationship() {
        let college = party(1, false);
        let hans = party(2, false);
        let mallory = party(4, false);
        let credential = Credential::builder()
            .issuer(college.document.id().clone())
            .subject(Subject::new(hans.document.id().clone()))
            .build()
            .unwrap();
        let jwt = college
            .document
            .create_credential_jwt(&college.storage, "verify", &credential, &Default::default())
            .unwrap();
        let options = JwtCredentialValidationOptions::default().subject_holder_relationship(
            mallory.document.id().clone(),
            SubjectHolderRelationship::SubjectOnNonTransferable,
        );
        assert!(JwtCredentialValidator::new()
            .validate(&jwt, &college.document, &options, FailFast::FirstError)
            .is_ok());
    }

    #[test]
    fn test_tampered_credential() {
        let college = party(1, false);
        let hans = party(2, false);
        let jwt = issue(&college, hans.document.id(), None);
        let mut parts: Vec<String> = jwt.as_str().split('.').map(String::from).collect();
        parts[2] = parts[2].chars().rev().collect();
        let forged = Jwt::new(parts.join("."));
        let err = JwtCredentialValidator::new()
            .validate(&forged, &college.document, &Default::default(), FailFast::AllErrors)
            .unwrap_err();
        assert_eq!(err.validation_errors.len(), 1);
    }

    fn present(holder: &Party, credentials: Vec<Jwt>, nonce: Option<&str>) -> Jwt {
        present_with(holder, credentials, nonce, &JwtPresentationOptions::default())
    }

    fn present_with(
        holder: &Party,
        credentials: Vec<Jwt>,
        nonce: Option<&str>,
        jwt_options: &JwtPresentationOptions,
    ) -> Jwt {
        let presentation = Presentation::new(holder.document.id().clone(), credentials);
        let options = JwsSignatureOptions {
            nonce: nonce.map(String::from),
            ..Default::default()
        };
        holder
            .document
            .create_presentation_jwt(&holder.storage, "verify", &presentation, &options, jwt_options)
            .unwrap()
    }

    #[test]
    fn test_valid_presentation() {
        let college = party(1, true);
        let hans = party(2, false);
        let credential = issue(&college, hans.document.id(), Some(1));
        let jwt = present(&hans, vec![credential.clone()], Some("42"));

        assert_eq!(
            JwtPresentationValidator::extract_holder(&jwt).unwrap(),
            *hans.document.id()
        );
        let options = JwtPresentationValidationOptions {
            nonce: Some("42".into()),
            ..Default::default()
        };
        let decoded = JwtPresentationValidator::new()
            .validate(&jwt, &hans.document, &options)
            .unwrap();
        assert_eq!(decoded.presentation.verifiable_credential, vec![credential]);
        assert_eq!(decoded.header.nonce.as_deref(), Some("42"));
    }

    #[test]
    fn test_presentation_nonce_mismatch() {
        let hans = party(2, false);
        let jwt = present(&hans, vec![], Some("1"));
        let options = JwtPresentationValidationOptions {
            nonce: Some("2".into()),
            ..Default::default()
        };
        assert!(matches!(
            JwtPresentationValidator::new().validate(&jwt, &hans.document, &options),
            Err(ValidationError::NonceMismatch { .. })
        ));

        let unsigned_nonce = present(&hans, vec![], None);
        assert!(JwtPresentationValidator::new()
            .validate(&unsigned_nonce, &hans.document, &options)
            .is_err());
    }

    #[test]
    fn test_presentation_wrong_holder_document() {
        let hans = party(2, false);
        let mallory = party(4, false);
        let jwt = present(&hans, vec![], Some("1"));
        assert!(matches!(
            JwtPresentationValidator::new().validate(&jwt, &mallory.document, &Default::default()),
            Err(ValidationError::DocumentMismatch { .. })
        ));
    }

    #[test]
    fn test_expired_presentation() {
        let hans = party(2, false);
        let expired_at = Utc::now() - chrono::Duration::hours(1);
        let jwt = present_with(
            &hans,
            vec![],
            None,
            &JwtPresentationOptions {
                issuance_date: Some(expired_at - chrono::Duration::hours(1)),
                expiration_date: Some(expired_at),
                ..Default::default()
            },
        );

        match JwtPresentationValidator::new().validate(&jwt, &hans.document, &Default::default()) {
            Err(ValidationError::Expired(exp)) => {
                assert_eq!(exp.timestamp(), expired_at.timestamp())
            }
            other => panic!("expected an expiry error, got {:?}", other),
        }

        // Still accepted by a verifier asking only for validity at an earlier time.
        let options = JwtPresentationValidationOptions {
            earliest_expiry_date: Some(expired_at - chrono::Duration::minutes(5)),
            ..Default::default()
        };
        assert!(JwtPresentationValidator::new()
            .validate(&jwt, &hans.document, &options)
            .is_ok());
    }

    #[test]
    fn test_presentation_issued_in_the_future() {
        let hans = party(2, false);
        let issued_at = Utc::now() + chrono::Duration::hours(1);
        let jwt = present_with(
            &hans,
            vec![],
            None,
            &JwtPresentationOptions {
                issuance_date: Some(issued_at),
                ..Default::default()
            },
        );

        assert!(matches!(
            JwtPresentationValidator::new().validate(&jwt, &hans.document, &Default::default()),
            Err(ValidationError::IssuanceDate(_))
        ));

        let options = JwtPresentationValidationOptions {
            latest_issuance_date: Some(issued_at + chrono::Duration::minutes(5)),
            ..Default::default()
        };
        assert!(JwtPresentationValidator::new()
            .validate(&jwt, &hans.document, &options)
            .is_ok());
    }

    #[test]
    fn test_compound_error_display() {
        let err = CompoundCredentialValidationError {
            validation_errors: vec![ValidationError::Revoked(1), ValidationError::MissingKid],
        };
        assert_eq!(
            err.to_string(),
            "[credential index 1 has been revoked; protected header has no kid]"
        );
    }
}
