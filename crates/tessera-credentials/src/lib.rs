//! Tessera Credentials
//!
//! The end-to-end credential flow, expressed as chained builders:
//! - `IdentityWallet` creates identities whose DID documents are published
//!   on the ledger
//! - an `Identity` issues credentials, answers presentation requests and
//!   revokes what it issued
//! - a `Verifier` requests presentations and validates the responses

pub mod deposit;
pub mod error;
pub mod explorer;
pub mod issuance;
pub mod predicate;
pub mod presentation;
pub mod revocation;
pub mod verifier;
pub mod wallet;

pub use deposit::{DepositCover, FaucetDepositCover};
pub use error::CredentialError;
pub use explorer::{link_to_alias_output, link_to_explorer, link_to_identity_output};
pub use issuance::CredentialIssuance;
pub use predicate::{has_property, issued_by, not_older_than, Predicate};
pub use presentation::{
    generate_nonce, PresentationRequest, PresentationRequestBuilder, PresentationResponseBuilder,
};
pub use revocation::RevocationUpdate;
pub use verifier::{
    CredentialFailure, PresentationValidation, PresentationValidationBuilder, Verifier,
    VerifierBuilder,
};
pub use wallet::{Identity, IdentityBuilder, IdentityWallet, IdentityWalletBuilder};
