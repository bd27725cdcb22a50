//! Integration test: token movements and DID outputs on the in-memory ledger.

use tessera_core::Address;
use tessera_crypto::KeyPair;
use tessera_identity::{DidDocument, DidResolver, IdentityClient, IdentityError, LedgerDidResolver};
use tessera_integration_tests::ledger;
use tessera_ledger::{
    tokens_available, BasicOutput, LedgerClient, LedgerError, Output, TransactionBuilder,
};

async fn address_of(client: &dyn LedgerClient, keypair: &KeyPair) -> Address {
    let hrp = client.network_hrp().await.unwrap();
    Address::from_public_key_bytes(&hrp, keypair.public_key().as_bytes()).unwrap()
}

// =========================================================================
// Basic outputs
// =========================================================================

#[tokio::test]
async fn test_faucet_then_transfer() {
    let ledger = ledger();
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let alice_address = address_of(ledger.as_ref(), &alice).await;
    let bob_address = address_of(ledger.as_ref(), &bob).await;

    ledger.request_funds(&alice_address).await.unwrap();
    let funded = tokens_available(ledger.as_ref(), &alice_address).await.unwrap();
    assert_eq!(funded, 10_000_000);

    let tx = TransactionBuilder::new(ledger.as_ref(), &alice)
        .with_output(Output::Basic(BasicOutput::new(1_000_000, bob_address.clone())))
        .build()
        .await
        .unwrap();
    ledger.submit_transaction(&tx).await.unwrap();

    assert_eq!(
        tokens_available(ledger.as_ref(), &bob_address).await.unwrap(),
        1_000_000
    );
    assert_eq!(
        tokens_available(ledger.as_ref(), &alice_address).await.unwrap(),
        9_000_000
    );

    // Replaying the same transaction spends already consumed inputs.
    let replay = ledger.submit_transaction(&tx).await;
    assert!(matches!(replay, Err(LedgerError::InputNotFound(_))));
}

#[tokio::test]
async fn test_transfer_without_funds() {
    let ledger = ledger();
    let alice = KeyPair::generate();
    let bob = KeyPair::generate();
    let bob_address = address_of(ledger.as_ref(), &bob).await;

    let result = TransactionBuilder::new(ledger.as_ref(), &alice)
        .with_output(Output::Basic(BasicOutput::new(1_000_000, bob_address)))
        .build()
        .await;
    assert!(matches!(
        result,
        Err(LedgerError::InsufficientFunds { available: 0, .. })
    ));
}

#[tokio::test]
async fn test_output_below_storage_deposit() {
    let ledger = ledger();
    let alice = KeyPair::generate();
    let alice_address = address_of(ledger.as_ref(), &alice).await;
    ledger.request_funds(&alice_address).await.unwrap();

    let tx = TransactionBuilder::new(ledger.as_ref(), &alice)
        .with_output(Output::Basic(BasicOutput::new(1, alice_address.clone())))
        .build()
        .await
        .unwrap();
    let result = ledger.submit_transaction(&tx).await;
    assert!(matches!(
        result,
        Err(LedgerError::InsufficientStorageDeposit { .. })
    ));
    // Rejected transactions leave balances untouched.
    assert_eq!(
        tokens_available(ledger.as_ref(), &alice_address).await.unwrap(),
        10_000_000
    );
}

// =========================================================================
// DID outputs
// =========================================================================

#[tokio::test]
async fn test_publish_update_and_deactivate_did() {
    let ledger = ledger();
    let client = IdentityClient::new(ledger.clone());
    let keypair = KeyPair::generate();
    let address = address_of(ledger.as_ref(), &keypair).await;
    ledger.request_funds(&address).await.unwrap();

    let document = DidDocument::new("tst").unwrap();
    let output = client.new_did_output(&address, &document).await.unwrap();
    let published = client.publish_did_output(&keypair, output).await.unwrap();
    assert!(!published.id().is_placeholder());

    let resolver = LedgerDidResolver::new(client.clone());
    assert_eq!(resolver.resolve(published.id()).await.unwrap(), published);

    let (first_id, first) = client
        .get_alias_output(&published.id().alias_id())
        .await
        .unwrap();
    let updated = client.update_did_output(&published).await.unwrap();
    assert_eq!(updated.state_index, first.state_index + 1);
    client.publish_did_output(&keypair, updated).await.unwrap();
    let (second_id, _) = client
        .get_alias_output(&published.id().alias_id())
        .await
        .unwrap();
    assert_ne!(first_id, second_id);

    let deactivated = client.deactivate_did_output(published.id()).await.unwrap();
    let document = client.publish_did_output(&keypair, deactivated).await.unwrap();
    assert!(document.metadata().deactivated);
    assert!(matches!(
        resolver.resolve(published.id()).await,
        Err(IdentityError::Deactivated(_))
    ));
}

#[tokio::test]
async fn test_only_controller_can_update_did() {
    let ledger = ledger();
    let client = IdentityClient::new(ledger.clone());
    let owner = KeyPair::generate();
    let intruder = KeyPair::generate();
    let owner_address = address_of(ledger.as_ref(), &owner).await;
    let intruder_address = address_of(ledger.as_ref(), &intruder).await;
    ledger.request_funds(&owner_address).await.unwrap();
    ledger.request_funds(&intruder_address).await.unwrap();

    let document = DidDocument::new("tst").unwrap();
    let output = client.new_did_output(&owner_address, &document).await.unwrap();
    let published = client.publish_did_output(&owner, output).await.unwrap();

    let updated = client.update_did_output(&published).await.unwrap();
    let result = client.publish_did_output(&intruder, updated).await;
    assert!(matches!(
        result,
        Err(IdentityError::Ledger(LedgerError::UnlockFailed(_)))
    ));
}

#[tokio::test]
async fn test_resolve_on_wrong_network() {
    let ledger = ledger();
    let client = IdentityClient::new(ledger);
    let document = DidDocument::new("smr").unwrap();
    let result = client.resolve_did(document.id()).await;
    assert!(matches!(result, Err(IdentityError::NetworkMismatch { .. })));
}
