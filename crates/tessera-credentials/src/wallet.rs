use std::sync::Arc;

use tessera_core::{Address, Did, COIN_TYPE_SHIMMER};
use tessera_crypto::{JwsAlgorithm, KeyPair, Mnemonic};
use tessera_identity::{
    DidDocument, IdentityClient, KeyType, MethodScope, RevocationBitmap, Storage,
};
use tessera_ledger::LedgerClient;

use crate::deposit::DepositCover;
use crate::error::CredentialError;
use crate::issuance::CredentialIssuance;
use crate::presentation::PresentationResponseBuilder;
use crate::revocation::RevocationUpdate;

/// Entry point for creating identities on a ledger.
#[derive(Clone)]
pub struct IdentityWallet {
    client: IdentityClient,
    coin_type: u32,
}

impl IdentityWallet {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> IdentityWalletBuilder {
        IdentityWalletBuilder::default()
    }

    pub fn client(&self) -> &IdentityClient {
        &self.client
    }

    /// Start building a fresh identity with its own mnemonic.
    pub fn generate_identity(&self) -> IdentityBuilder {
        IdentityBuilder {
            client: self.client.clone(),
            coin_type: self.coin_type,
            steps: Vec::new(),
        }
    }
}

pub struct IdentityWalletBuilder {
    client: Option<Arc<dyn LedgerClient>>,
    coin_type: u32,
}

impl Default for IdentityWalletBuilder {
    fn default() -> Self {
        Self {
            client: None,
            coin_type: COIN_TYPE_SHIMMER,
        }
    }
}

impl IdentityWalletBuilder {
    pub fn with_client(mut self, client: Arc<dyn LedgerClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Key derivation branch for new identities.
    pub fn with_coin_type(mut self, coin_type: u32) -> Self {
        self.coin_type = coin_type;
        self
    }

    pub fn create(self) -> Result<IdentityWallet, CredentialError> {
        let ledger = self.client.ok_or(CredentialError::MissingClient)?;
        Ok(IdentityWallet {
            client: IdentityClient::new(ledger),
            coin_type: self.coin_type,
        })
    }
}

enum IdentityStep {
    VerificationMethod(String),
    RevocationService(String),
    CoverDeposit(Arc<dyn DepositCover>),
}

/// Collects the setup of a new identity. Steps run in the order they were
/// added when [`IdentityBuilder::create`] is called.
pub struct IdentityBuilder {
    client: IdentityClient,
    coin_type: u32,
    steps: Vec<IdentityStep>,
}

impl IdentityBuilder {
    /// Add an Ed25519 verification method under `fragment`.
    pub fn with_verification_method(mut self, fragment: impl Into<String>) -> Self {
        self.steps
            .push(IdentityStep::VerificationMethod(fragment.into()));
        self
    }

    /// Add an empty revocation bitmap service under `fragment`.
    pub fn with_revocation_service(mut self, fragment: impl Into<String>) -> Self {
        self.steps
            .push(IdentityStep::RevocationService(fragment.into()));
        self
    }

    /// Fund the identity's address for the storage deposit of the document
    /// as built so far.
    pub fn with_storage_deposit_covered(mut self, cover: Arc<dyn DepositCover>) -> Self {
        self.steps.push(IdentityStep::CoverDeposit(cover));
        self
    }

    pub async fn create(self) -> Result<Identity, CredentialError> {
        let network = self.client.network_hrp().await?;
        let mnemonic = Mnemonic::generate();
        let keypair = mnemonic.derive_keypair(self.coin_type, 0, 0)?;
        let address = Address::from_public_key_bytes(&network, keypair.public_key().as_bytes())?;
        tracing::info!(address = %address, "Generated identity address");

        let storage = Storage::default();
        let mut document = DidDocument::new(&network)?;
        for step in self.steps {
            match step {
                IdentityStep::VerificationMethod(fragment) => {
                    document.generate_method(
                        &storage,
                        KeyType::Ed25519,
                        JwsAlgorithm::EdDSA,
                        &fragment,
                        MethodScope::VerificationMethod,
                    )?;
                }
                IdentityStep::RevocationService(fragment) => {
                    let service_id = document.id().join(&fragment)?;
                    document.insert_service(RevocationBitmap::new().to_service(service_id))?;
                }
                IdentityStep::CoverDeposit(cover) => {
                    let output = self.client.new_did_output(&address, &document).await?;
                    cover.cover(&address, output.amount).await?;
                }
            }
        }

        let output = self.client.new_did_output(&address, &document).await?;
        let document = self.client.publish_did_output(&keypair, output).await?;
        tracing::info!(did = %document.id(), address = %address, "Created identity");

        Ok(Identity {
            client: self.client,
            address,
            keypair,
            storage,
            document,
            mnemonic,
            coin_type: self.coin_type,
        })
    }
}

/// A published identity together with the keys that control it.
pub struct Identity {
    client: IdentityClient,
    address: Address,
    keypair: KeyPair,
    storage: Storage,
    pub(crate) document: DidDocument,
    mnemonic: Mnemonic,
    coin_type: u32,
}

impl Identity {
    pub fn did(&self) -> &Did {
        self.document.id()
    }

    pub fn document(&self) -> &DidDocument {
        &self.document
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn mnemonic(&self) -> &Mnemonic {
        &self.mnemonic
    }

    pub fn coin_type(&self) -> u32 {
        self.coin_type
    }

    pub fn client(&self) -> &IdentityClient {
        &self.client
    }

    /// Controls the alias output and the address's funds.
    pub(crate) fn keypair(&self) -> &KeyPair {
        &self.keypair
    }

    pub fn generate_credential(&self) -> CredentialIssuance<'_> {
        CredentialIssuance::new(self)
    }

    pub fn generate_presentation_response(&self) -> PresentationResponseBuilder<'_> {
        PresentationResponseBuilder::new(self)
    }

    pub fn generate_revocation(&mut self) -> RevocationUpdate<'_> {
        RevocationUpdate::new(self)
    }

    /// Replace the local document with the one on the ledger.
    pub async fn refresh(&mut self) -> Result<(), CredentialError> {
        self.document = self.client.resolve_did(self.document.id()).await?;
        Ok(())
    }
}
