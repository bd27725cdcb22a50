use std::sync::Arc;

use tessera_core::{Address, AliasId, Did, OutputId};
use tessera_crypto::KeyPair;
use tessera_ledger::{
    compute_storage_deposit, AliasOutput, LedgerClient, LedgerError, Output, RentStructure,
    TransactionBuilder,
};

use crate::document::DidDocument;
use crate::error::IdentityError;

/// Publishes and resolves DID documents stored in alias outputs.
#[derive(Clone)]
pub struct IdentityClient {
    ledger: Arc<dyn LedgerClient>,
}

impl IdentityClient {
    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<dyn LedgerClient> {
        &self.ledger
    }

    pub async fn network_hrp(&self) -> Result<String, IdentityError> {
        Ok(self.ledger.network_hrp().await?)
    }

    pub async fn rent_structure(&self) -> Result<RentStructure, IdentityError> {
        Ok(self.ledger.rent_structure().await?)
    }

    /// Storage deposit an alias output requires on this ledger.
    pub async fn storage_deposit(&self, output: &AliasOutput) -> Result<u64, IdentityError> {
        let rent = self.rent_structure().await?;
        Ok(compute_storage_deposit(&Output::Alias(output.clone()), &rent))
    }

    /// A new alias output holding `document`, funded with exactly its
    /// storage deposit and controlled by `address`.
    pub async fn new_did_output(
        &self,
        address: &Address,
        document: &DidDocument,
    ) -> Result<AliasOutput, IdentityError> {
        self.check_network(document.id()).await?;
        let mut output = AliasOutput::new(0, address.clone(), document.pack()?);
        output.amount = self.storage_deposit(&output).await?;
        Ok(output)
    }

    /// The current alias output of `document` carrying its new state.
    ///
    /// The amount is raised to the new storage deposit if needed and never
    /// lowered.
    pub async fn update_did_output(
        &self,
        document: &DidDocument,
    ) -> Result<AliasOutput, IdentityError> {
        let did = document.id();
        if did.is_placeholder() {
            return Err(IdentityError::InvalidDocument(
                "document has not been published yet".into(),
            ));
        }
        let (_, mut output) = self.get_alias_output(&did.alias_id()).await?;
        output.state_metadata = document.pack()?;
        output.state_index = output.state_index.wrapping_add(1);
        output.amount = output.amount.max(self.storage_deposit(&output).await?);
        Ok(output)
    }

    /// The current alias output of `did` with its document removed.
    pub async fn deactivate_did_output(&self, did: &Did) -> Result<AliasOutput, IdentityError> {
        let (_, mut output) = self.get_alias_output(&did.alias_id()).await?;
        output.state_metadata = Vec::new();
        output.state_index = output.state_index.wrapping_add(1);
        Ok(output)
    }

    /// Sign and submit a transaction creating or updating `output`, funded
    /// from the basic outputs of `keypair`'s address.
    ///
    /// Returns the document as resolved from the ledger afterwards.
    pub async fn publish_did_output(
        &self,
        keypair: &KeyPair,
        output: AliasOutput,
    ) -> Result<DidDocument, IdentityError> {
        let hrp = self.network_hrp().await?;
        let existing = output.alias_id;
        let mut builder = TransactionBuilder::new(self.ledger.as_ref(), keypair);
        if !existing.is_null() {
            let (current_id, _) = self.get_alias_output(&existing).await?;
            builder = builder.with_input(current_id);
        }
        let tx = builder.with_output(Output::Alias(output)).build().await?;
        let transaction_id = self.ledger.submit_transaction(&tx).await?;

        // The alias is always the builder's first output.
        let alias_id = if existing.is_null() {
            AliasId::from_output_id(&OutputId::new(transaction_id, 0))
        } else {
            existing
        };
        let did = Did::from_alias_id(&hrp, alias_id)?;
        tracing::info!(did = %did, transaction_id = %transaction_id, "Published DID output");
        self.resolve_did(&did).await
    }

    /// Fetch and unpack the document of `did`.
    pub async fn resolve_did(&self, did: &Did) -> Result<DidDocument, IdentityError> {
        self.check_network(did).await?;
        let (_, output) = self.get_alias_output(&did.alias_id()).await?;
        DidDocument::unpack(did, &output.state_metadata)
    }

    pub async fn get_alias_output(
        &self,
        alias_id: &AliasId,
    ) -> Result<(OutputId, AliasOutput), IdentityError> {
        match self.ledger.get_alias_output(alias_id).await {
            Ok(found) => Ok(found),
            Err(LedgerError::AliasNotFound(id)) => Err(IdentityError::DidNotFound(id.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn check_network(&self, did: &Did) -> Result<(), IdentityError> {
        let hrp = self.network_hrp().await?;
        if did.network() != hrp {
            return Err(IdentityError::NetworkMismatch {
                expected: hrp,
                actual: did.network().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MethodScope;
    use crate::storage::{KeyType, Storage};
    use tessera_crypto::JwsAlgorithm;
    use tessera_ledger::{MemoryLedger, ProtocolParameters};

    async fn funded_client() -> (IdentityClient, KeyPair, Address) {
        let ledger = MemoryLedger::new(ProtocolParameters::default());
        let keypair = KeyPair::generate();
        let address =
            Address::from_public_key_bytes("tst", keypair.public_key().as_bytes()).unwrap();
        ledger.request_funds(&address).await.unwrap();
        (IdentityClient::new(Arc::new(ledger)), keypair, address)
    }

    fn document(storage: &Storage) -> DidDocument {
        let mut doc = DidDocument::new("tst").unwrap();
        doc.generate_method(
            storage,
            KeyType::Ed25519,
            JwsAlgorithm::EdDSA,
            "verify",
            MethodScope::VerificationMethod,
        )
        .unwrap();
        doc
    }

    #[tokio::test]
    async fn test_new_did_output_covers_deposit() {
        let (client, _, address) = funded_client().await;
        let doc = document(&Storage::default());
        let output = client.new_did_output(&address, &doc).await.unwrap();
        assert!(output.alias_id.is_null());
        assert_eq!(output.amount, client.storage_deposit(&output).await.unwrap());
        assert_eq!(output.state_controller, address);
    }

    #[tokio::test]
    async fn test_publish_and_resolve() {
        let (client, keypair, address) = funded_client().await;
        let doc = document(&Storage::default());
        let output = client.new_did_output(&address, &doc).await.unwrap();
        let published = client.publish_did_output(&keypair, output).await.unwrap();

        assert!(!published.id().is_placeholder());
        assert_eq!(published.methods().len(), 1);
        let resolved = client.resolve_did(published.id()).await.unwrap();
        assert_eq!(resolved, published);
    }

    #[tokio::test]
    async fn test_update_bumps_state_index() {
        let (client, keypair, address) = funded_client().await;
        let storage = Storage::default();
        let output = client
            .new_did_output(&address, &document(&storage))
            .await
            .unwrap();
        let mut doc = client.publish_did_output(&keypair, output).await.unwrap();

        doc.generate_method(
            &storage,
            KeyType::Ed25519,
            JwsAlgorithm::EdDSA,
            "second",
            MethodScope::AssertionMethod,
        )
        .unwrap();
        let updated = client.update_did_output(&doc).await.unwrap();
        assert_eq!(updated.state_index, 1);

        let republished = client.publish_did_output(&keypair, updated).await.unwrap();
        assert_eq!(republished.id(), doc.id());
        assert_eq!(republished.methods().len(), 2);
    }

    #[tokio::test]
    async fn test_update_unpublished_fails() {
        let (client, _, _) = funded_client().await;
        let doc = document(&Storage::default());
        assert!(matches!(
            client.update_did_output(&doc).await,
            Err(IdentityError::InvalidDocument(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_unknown_did() {
        let (client, _, _) = funded_client().await;
        let did = Did::from_alias_id("tst", AliasId::new([9u8; 32])).unwrap();
        assert!(matches!(
            client.resolve_did(&did).await,
            Err(IdentityError::DidNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_other_network() {
        let (client, _, _) = funded_client().await;
        let did = Did::from_alias_id("rms", AliasId::new([9u8; 32])).unwrap();
        assert!(matches!(
            client.resolve_did(&did).await,
            Err(IdentityError::NetworkMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_deactivate() {
        let (client, keypair, address) = funded_client().await;
        let output = client
            .new_did_output(&address, &document(&Storage::default()))
            .await
            .unwrap();
        let doc = client.publish_did_output(&keypair, output).await.unwrap();

        let deactivated = client.deactivate_did_output(doc.id()).await.unwrap();
        let resolved = client.publish_did_output(&keypair, deactivated).await.unwrap();
        assert!(resolved.metadata().deactivated);
    }

    #[tokio::test]
    async fn test_publish_without_funds() {
        let ledger = MemoryLedger::new(ProtocolParameters::default());
        let client = IdentityClient::new(Arc::new(ledger));
        let keypair = KeyPair::generate();
        let address =
            Address::from_public_key_bytes("tst", keypair.public_key().as_bytes()).unwrap();
        let output = client
            .new_did_output(&address, &document(&Storage::default()))
            .await
            .unwrap();
        assert!(matches!(
            client.publish_did_output(&keypair, output).await,
            Err(IdentityError::Ledger(LedgerError::InsufficientFunds { .. }))
        ));
    }
}
