use std::fmt;

use chrono::{Duration, Utc};
use tessera_identity::{JwsSignatureOptions, Jwt, JwtPresentationOptions, Presentation};

use crate::error::CredentialError;
use crate::predicate::Predicate;
use crate::wallet::Identity;

/// A fresh challenge for a presentation request.
pub fn generate_nonce() -> String {
    rand::random::<u32>().to_string()
}

/// What a verifier asks a holder to present.
#[derive(Clone)]
pub struct PresentationRequest {
    pub nonce: String,
    pub predicates: Vec<Predicate>,
}

impl fmt::Debug for PresentationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresentationRequest")
            .field("nonce", &self.nonce)
            .field("predicates", &self.predicates.len())
            .finish()
    }
}

#[derive(Default)]
pub struct PresentationRequestBuilder {
    nonce: Option<String>,
    predicates: Vec<Predicate>,
}

impl PresentationRequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn create(self) -> Result<PresentationRequest, CredentialError> {
        let nonce = self.nonce.ok_or(CredentialError::MissingNonce)?;
        Ok(PresentationRequest {
            nonce,
            predicates: self.predicates,
        })
    }
}

/// Builds a holder's signed answer to a presentation request.
pub struct PresentationResponseBuilder<'a> {
    holder: &'a Identity,
    nonce: Option<String>,
    fragment: Option<String>,
    credentials: Vec<Jwt>,
    expires_in: Option<Duration>,
}

impl<'a> PresentationResponseBuilder<'a> {
    pub(crate) fn new(holder: &'a Identity) -> Self {
        Self {
            holder,
            nonce: None,
            fragment: None,
            credentials: Vec::new(),
            expires_in: None,
        }
    }

    /// The nonce of the request being answered.
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn with_verification_method(mut self, fragment: impl Into<String>) -> Self {
        self.fragment = Some(fragment.into());
        self
    }

    pub fn with_credential(mut self, credential: Jwt) -> Self {
        self.credentials.push(credential);
        self
    }

    /// Limit how long the presentation stays valid.
    pub fn with_expiration(mut self, expires_in: Duration) -> Self {
        self.expires_in = Some(expires_in);
        self
    }

    pub fn create(self) -> Result<Jwt, CredentialError> {
        let nonce = self.nonce.ok_or(CredentialError::MissingNonce)?;
        let fragment = self
            .fragment
            .ok_or(CredentialError::MissingVerificationMethod)?;
        if self.credentials.is_empty() {
            return Err(CredentialError::NoCredentials);
        }

        let count = self.credentials.len();
        let presentation = Presentation::new(self.holder.did().clone(), self.credentials);
        let options = JwtPresentationOptions {
            expiration_date: self.expires_in.map(|d| Utc::now() + d),
            ..Default::default()
        };
        let jwt = self.holder.document().create_presentation_jwt(
            self.holder.storage(),
            &fragment,
            &presentation,
            &JwsSignatureOptions::default().with_nonce(nonce),
            &options,
        )?;
        tracing::info!(holder = %self.holder.did(), credentials = count, "Created presentation");
        Ok(jwt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::has_property;
    use crate::wallet::tests::{identity, ledger};
    use tessera_identity::{JwtPresentationValidationOptions, JwtPresentationValidator};

    #[test]
    fn test_nonce_is_decimal() {
        let nonce = generate_nonce();
        assert!(nonce.parse::<u32>().is_ok());
    }

    #[test]
    fn test_request_requires_nonce() {
        let result = PresentationRequestBuilder::new()
            .with_predicate(has_property("degree", "Bachelor"))
            .create();
        assert!(matches!(result, Err(CredentialError::MissingNonce)));
    }

    #[test]
    fn test_request() {
        let request = PresentationRequestBuilder::new()
            .with_nonce("1234")
            .with_predicate(has_property("degree", "Bachelor"))
            .create()
            .unwrap();
        assert_eq!(request.nonce, "1234");
        assert_eq!(request.predicates.len(), 1);
    }

    #[tokio::test]
    async fn test_response_errors() {
        let ledger = ledger();
        let holder = identity(&ledger).await;
        let credential = holder
            .generate_credential()
            .with_subject(&holder)
            .with_verification_method("key-1")
            .create()
            .unwrap();

        let result = holder
            .generate_presentation_response()
            .with_verification_method("key-1")
            .with_credential(credential.clone())
            .create();
        assert!(matches!(result, Err(CredentialError::MissingNonce)));

        let result = holder
            .generate_presentation_response()
            .with_nonce("1")
            .with_credential(credential)
            .create();
        assert!(matches!(
            result,
            Err(CredentialError::MissingVerificationMethod)
        ));

        let result = holder
            .generate_presentation_response()
            .with_nonce("1")
            .with_verification_method("key-1")
            .create();
        assert!(matches!(result, Err(CredentialError::NoCredentials)));
    }

    #[tokio::test]
    async fn test_response_carries_nonce() {
        let ledger = ledger();
        let holder = identity(&ledger).await;
        let credential = holder
            .generate_credential()
            .with_subject(&holder)
            .with_verification_method("key-1")
            .create()
            .unwrap();

        let jwt = holder
            .generate_presentation_response()
            .with_nonce("42")
            .with_verification_method("key-1")
            .with_credential(credential.clone())
            .with_expiration(Duration::minutes(10))
            .create()
            .unwrap();

        let options = JwtPresentationValidationOptions {
            nonce: Some("42".into()),
            ..Default::default()
        };
        let decoded = JwtPresentationValidator::new()
            .validate(&jwt, holder.document(), &options)
            .unwrap();
        assert_eq!(decoded.header.nonce.as_deref(), Some("42"));
        assert_eq!(&decoded.presentation.holder, holder.did());
        assert_eq!(decoded.presentation.verifiable_credential, vec![credential]);
        assert!(decoded.expiration_date.is_some());
    }
}
