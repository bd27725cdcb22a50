use async_trait::async_trait;
use futures::future::try_join_all;
use tessera_core::Did;

use crate::client::IdentityClient;
use crate::document::DidDocument;
use crate::error::IdentityError;

/// Trait for resolving DIDs to their documents.
#[async_trait]
pub trait DidResolver: Send + Sync {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, IdentityError>;

    /// Resolve several DIDs concurrently, in order, failing on the first
    /// error.
    async fn resolve_multiple(&self, dids: &[Did]) -> Result<Vec<DidDocument>, IdentityError> {
        try_join_all(dids.iter().map(|did| self.resolve(did))).await
    }
}

/// Resolves DIDs from alias outputs on a ledger.
///
/// Deactivated DIDs resolve to an error rather than an empty document.
#[derive(Clone)]
pub struct LedgerDidResolver {
    client: IdentityClient,
}

impl LedgerDidResolver {
    pub fn new(client: IdentityClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DidResolver for LedgerDidResolver {
    async fn resolve(&self, did: &Did) -> Result<DidDocument, IdentityError> {
        let document = self.client.resolve_did(did).await?;
        if document.metadata().deactivated {
            return Err(IdentityError::Deactivated(did.to_string()));
        }
        tracing::debug!(did = %did, "Resolved DID");
        Ok(document)
    }
}
