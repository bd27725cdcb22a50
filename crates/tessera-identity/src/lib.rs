//! Tessera Identity Layer
//!
//! Decentralised identity primitives on top of the Tessera ledger:
//! - DID documents published in alias outputs
//! - In-memory key storage that signs without exporting private keys
//! - Verifiable credentials and presentations as EdDSA JWTs
//! - Revocation bitmaps carried as DID document services
//! - Credential and presentation validation
//! - DID resolution against a ledger

pub mod client;
pub mod credential;
pub mod did_resolver;
pub mod document;
pub mod error;
pub mod jwt;
pub mod presentation;
pub mod revocation;
pub mod storage;
pub mod validator;

pub use client::IdentityClient;
pub use credential::{Credential, CredentialBuilder, Status, Subject};
pub use did_resolver::{DidResolver, LedgerDidResolver};
pub use document::{DidDocument, DocumentMetadata, MethodScope, Service, VerificationMethod};
pub use error::IdentityError;
pub use jwt::{JwsSignatureOptions, Jwt, JwtPresentationOptions};
pub use presentation::Presentation;
pub use revocation::RevocationBitmap;
pub use storage::{JwkMemStore, KeyId, KeyIdMemStore, KeyType, MethodDigest, Storage};
pub use validator::{
    CompoundCredentialValidationError, DecodedJwtCredential, DecodedJwtPresentation, FailFast,
    JwtCredentialValidationOptions, JwtCredentialValidator, JwtPresentationValidationOptions,
    JwtPresentationValidator, StatusCheck, SubjectHolderRelationship, ValidationError,
};
