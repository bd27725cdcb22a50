use std::sync::Arc;

use tessera_core::Did;
use tessera_identity::{
    CompoundCredentialValidationError, Credential, DidResolver, FailFast, IdentityClient,
    IdentityError, Jwt, JwtCredentialValidationOptions, JwtCredentialValidator,
    JwtPresentationValidationOptions, JwtPresentationValidator, LedgerDidResolver,
    SubjectHolderRelationship,
};
use tessera_ledger::LedgerClient;

use crate::error::CredentialError;
use crate::presentation::{generate_nonce, PresentationRequest, PresentationRequestBuilder};

/// Requests presentations and validates the responses.
pub struct Verifier {
    resolver: Arc<dyn DidResolver>,
    presentation_validator: JwtPresentationValidator,
    credential_validator: JwtCredentialValidator,
}

impl Verifier {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> VerifierBuilder {
        VerifierBuilder::default()
    }

    /// A request builder with a fresh nonce already set.
    pub fn generate_presentation_request(&self) -> PresentationRequestBuilder {
        PresentationRequestBuilder::new().with_nonce(generate_nonce())
    }

    pub fn generate_presentation_validation(&self) -> PresentationValidationBuilder<'_> {
        PresentationValidationBuilder {
            verifier: self,
            request: None,
            response: None,
        }
    }
}

#[derive(Default)]
pub struct VerifierBuilder {
    client: Option<Arc<dyn LedgerClient>>,
    resolver: Option<Arc<dyn DidResolver>>,
}

impl VerifierBuilder {
    pub fn with_client(mut self, client: Arc<dyn LedgerClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Resolve DIDs with `resolver` instead of reading them from the
    /// ledger client.
    pub fn with_resolver(mut self, resolver: Arc<dyn DidResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn create(self) -> Result<Verifier, CredentialError> {
        let resolver: Arc<dyn DidResolver> = match (self.resolver, self.client) {
            (Some(resolver), _) => resolver,
            (None, Some(client)) => Arc::new(LedgerDidResolver::new(IdentityClient::new(client))),
            (None, None) => return Err(CredentialError::MissingClient),
        };
        Ok(Verifier {
            resolver,
            presentation_validator: JwtPresentationValidator::new(),
            credential_validator: JwtCredentialValidator::new(),
        })
    }
}

/// A credential of a presentation that failed validation.
#[derive(Debug, Clone)]
pub struct CredentialFailure {
    /// Position in the presentation.
    pub index: usize,
    pub issuer: Did,
    pub errors: CompoundCredentialValidationError,
}

/// Outcome of validating a presentation response.
#[derive(Debug, Clone)]
pub struct PresentationValidation {
    /// No credential failed and every predicate of the request held.
    pub validated: bool,
    pub holder: Did,
    /// Credentials that passed validation.
    pub credentials: Vec<Credential>,
    pub credential_errors: Vec<CredentialFailure>,
    /// Predicates no valid credential satisfied.
    pub unsatisfied_predicates: usize,
}

pub struct PresentationValidationBuilder<'a> {
    verifier: &'a Verifier,
    request: Option<PresentationRequest>,
    response: Option<Jwt>,
}

impl PresentationValidationBuilder<'_> {
    pub fn with_request(mut self, request: &PresentationRequest) -> Self {
        self.request = Some(request.clone());
        self
    }

    pub fn with_response(mut self, response: Jwt) -> Self {
        self.response = Some(response);
        self
    }

    /// Validate the response against the request.
    ///
    /// A presentation that is malformed, unsigned by its holder or
    /// answering another nonce is an error. Failing credentials are
    /// reported in [`PresentationValidation::credential_errors`].
    pub async fn create(self) -> Result<PresentationValidation, CredentialError> {
        let request = self.request.ok_or(CredentialError::NoRequest)?;
        let response = self.response.ok_or(CredentialError::NoResponse)?;
        let verifier = self.verifier;

        let holder_did = JwtPresentationValidator::extract_holder(&response)?;
        let holder_document = verifier.resolver.resolve(&holder_did).await?;
        let presentation_options = JwtPresentationValidationOptions {
            nonce: Some(request.nonce.clone()),
            ..Default::default()
        };
        let decoded = verifier
            .presentation_validator
            .validate(&response, &holder_document, &presentation_options)
            .map_err(IdentityError::from)?;
        let jwts = decoded.presentation.verifiable_credential;

        let issuers = jwts
            .iter()
            .map(JwtCredentialValidator::extract_issuer_from_jwt)
            .collect::<Result<Vec<_>, _>>()?;
        let issuer_documents = verifier.resolver.resolve_multiple(&issuers).await?;

        let credential_options = JwtCredentialValidationOptions::default().subject_holder_relationship(
            holder_did.clone(),
            SubjectHolderRelationship::AlwaysSubject,
        );
        let mut credentials = Vec::new();
        let mut credential_errors = Vec::new();
        for (index, (jwt, issuer_document)) in jwts.iter().zip(&issuer_documents).enumerate() {
            match verifier.credential_validator.validate(
                jwt,
                issuer_document,
                &credential_options,
                FailFast::AllErrors,
            ) {
                Ok(decoded) => credentials.push(decoded.credential),
                Err(errors) => {
                    tracing::warn!(
                        holder = %holder_did,
                        index,
                        error = %errors,
                        "Credential failed validation"
                    );
                    credential_errors.push(CredentialFailure {
                        index,
                        issuer: issuer_document.id().clone(),
                        errors,
                    });
                }
            }
        }

        let unsatisfied_predicates = request
            .predicates
            .iter()
            .filter(|&predicate| !credentials.iter().any(|c| predicate(c)))
            .count();
        let validated = credential_errors.is_empty() && unsatisfied_predicates == 0;
        tracing::info!(
            holder = %holder_did,
            validated,
            credentials = jwts.len(),
            failed = credential_errors.len(),
            unsatisfied_predicates,
            "Validated presentation"
        );

        Ok(PresentationValidation {
            validated,
            holder: holder_did,
            credentials,
            credential_errors,
            unsatisfied_predicates,
        })
    }
}
