//! Integration test: issuer → holder → verifier across the ledger.
//!
//! Exercises tessera-credentials on top of tessera-identity and an
//! in-memory tessera-ledger.

use std::time::Duration;

use tessera_credentials::{has_property, issued_by, not_older_than, CredentialError, Identity};
use tessera_identity::{IdentityError, Jwt, ValidationError};
use tessera_integration_tests::{
    faucet, holder, issuer, ledger, verifier, METHOD, REVOCATION_SERVICE,
};

fn degree(college: &Identity, student: &Identity, index: u32) -> Jwt {
    college
        .generate_credential()
        .with_subject(student)
        .with_property("degree", "Degree")
        .with_verification_method(METHOD)
        .with_revocation_status(REVOCATION_SERVICE, index)
        .create()
        .expect("issue degree")
}

fn respond(student: &Identity, nonce: &str, credentials: &[Jwt]) -> Jwt {
    let mut builder = student
        .generate_presentation_response()
        .with_nonce(nonce)
        .with_verification_method(METHOD);
    for credential in credentials {
        builder = builder.with_credential(credential.clone());
    }
    builder.create().expect("presentation response")
}

// =========================================================================
// Full lifecycle: issue, present, age out, revoke
// =========================================================================

#[tokio::test]
async fn test_degree_lifecycle() {
    let ledger = ledger();
    let hans = holder(&ledger).await;
    let mut college = issuer(&ledger).await;
    let verifier = verifier(&ledger);

    let credential = degree(&college, &hans, 1);

    // Fresh credential passes the age predicate
    let request = verifier
        .generate_presentation_request()
        .with_predicate(not_older_than(Duration::from_secs(3)))
        .create()
        .unwrap();
    let response = respond(&hans, &request.nonce, &[credential.clone()]);
    let validation = verifier
        .generate_presentation_validation()
        .with_request(&request)
        .with_response(response.clone())
        .create()
        .await
        .unwrap();
    assert!(validation.validated);
    assert_eq!(&validation.holder, hans.did());

    // Same presentation once the credential is older than allowed
    tokio::time::sleep(Duration::from_secs(4)).await;
    let validation = verifier
        .generate_presentation_validation()
        .with_request(&request)
        .with_response(response)
        .create()
        .await
        .unwrap();
    assert!(!validation.validated);
    assert!(validation.credential_errors.is_empty());
    assert_eq!(validation.unsatisfied_predicates, 1);

    // Revoked credential fails even without an age predicate
    college
        .generate_revocation()
        .with_revocation_status(REVOCATION_SERVICE, 1)
        .with_storage_deposit_covered(faucet(&ledger))
        .create()
        .await
        .unwrap();
    let request = verifier.generate_presentation_request().create().unwrap();
    let response = respond(&hans, &request.nonce, &[credential]);
    let validation = verifier
        .generate_presentation_validation()
        .with_request(&request)
        .with_response(response)
        .create()
        .await
        .unwrap();
    assert!(!validation.validated);
    assert_eq!(validation.credential_errors.len(), 1);
    assert!(validation.credential_errors[0]
        .errors
        .validation_errors
        .contains(&ValidationError::Revoked(1)));
}

#[tokio::test]
async fn test_revocation_leaves_other_indices_valid() {
    let ledger = ledger();
    let hans = holder(&ledger).await;
    let mut college = issuer(&ledger).await;
    let verifier = verifier(&ledger);

    let revoked = degree(&college, &hans, 1);
    let kept = degree(&college, &hans, 2);
    college
        .generate_revocation()
        .with_revocation_status(REVOCATION_SERVICE, 1)
        .with_storage_deposit_covered(faucet(&ledger))
        .create()
        .await
        .unwrap();

    let request = verifier.generate_presentation_request().create().unwrap();
    let validation = verifier
        .generate_presentation_validation()
        .with_request(&request)
        .with_response(respond(&hans, &request.nonce, &[kept]))
        .create()
        .await
        .unwrap();
    assert!(validation.validated);

    let validation = verifier
        .generate_presentation_validation()
        .with_request(&request)
        .with_response(respond(&hans, &request.nonce, &[revoked]))
        .create()
        .await
        .unwrap();
    assert!(!validation.validated);
}

// =========================================================================
// Multiple issuers and predicates
// =========================================================================

#[tokio::test]
async fn test_presentation_from_two_issuers() {
    let ledger = ledger();
    let hans = holder(&ledger).await;
    let college = issuer(&ledger).await;
    let employer = issuer(&ledger).await;
    let verifier = verifier(&ledger);

    let diploma = degree(&college, &hans, 0);
    let employment = employer
        .generate_credential()
        .with_subject(&hans)
        .with_type("EmploymentCredential")
        .with_property("position", "Engineer")
        .with_verification_method(METHOD)
        .create()
        .unwrap();

    let request = verifier
        .generate_presentation_request()
        .with_predicate(issued_by(college.did().clone()))
        .with_predicate(issued_by(employer.did().clone()))
        .with_predicate(has_property("degree", "Degree"))
        .with_predicate(has_property("position", "Engineer"))
        .create()
        .unwrap();
    let response = respond(&hans, &request.nonce, &[diploma, employment]);
    let validation = verifier
        .generate_presentation_validation()
        .with_request(&request)
        .with_response(response)
        .create()
        .await
        .unwrap();
    assert!(validation.validated);
    assert_eq!(validation.credentials.len(), 2);
    assert_eq!(validation.unsatisfied_predicates, 0);
}

#[tokio::test]
async fn test_unknown_issuer_is_an_error() {
    let ledger = ledger();
    let other_ledger = tessera_integration_tests::ledger();
    let hans = holder(&ledger).await;
    // Published on a different ledger, so the verifier cannot resolve it.
    let stranger = issuer(&other_ledger).await;
    let verifier = verifier(&ledger);

    let credential = stranger
        .generate_credential()
        .with_subject_did(hans.did().clone())
        .with_verification_method(METHOD)
        .create()
        .unwrap();
    let request = verifier.generate_presentation_request().create().unwrap();
    let result = verifier
        .generate_presentation_validation()
        .with_request(&request)
        .with_response(respond(&hans, &request.nonce, &[credential]))
        .create()
        .await;
    assert!(matches!(
        result,
        Err(CredentialError::Identity(IdentityError::DidNotFound(_)))
    ));
}

// =========================================================================
// Identity state on the ledger
// =========================================================================

#[tokio::test]
async fn test_refresh_picks_up_published_document() {
    let ledger = ledger();
    let mut college = issuer(&ledger).await;
    let before = college.document().clone();

    college
        .generate_revocation()
        .with_revocation_status(REVOCATION_SERVICE, 7)
        .with_storage_deposit_covered(faucet(&ledger))
        .create()
        .await
        .unwrap();
    assert_ne!(college.document(), &before);

    let published = college.document().clone();
    college.refresh().await.unwrap();
    assert_eq!(college.document(), &published);
}
