//! Fixtures shared by the cross-crate tests.

use std::sync::Arc;
use std::time::Duration;

use tessera_credentials::{
    DepositCover, FaucetDepositCover, Identity, IdentityWallet, Verifier,
};
use tessera_ledger::{LedgerClient, MemoryLedger, ProtocolParameters};

/// Fragment of the signing method every fixture identity carries.
pub const METHOD: &str = "verify";
/// Fragment of the revocation service of issuers.
pub const REVOCATION_SERVICE: &str = "revoke";

/// A fresh in-process ledger with default parameters.
pub fn ledger() -> Arc<dyn LedgerClient> {
    Arc::new(MemoryLedger::new(ProtocolParameters::default()))
}

/// A faucet that polls fast enough for tests.
pub fn faucet(ledger: &Arc<dyn LedgerClient>) -> Arc<dyn DepositCover> {
    Arc::new(
        FaucetDepositCover::new(Arc::clone(ledger))
            .with_poll_interval(Duration::from_millis(1))
            .with_max_attempts(3),
    )
}

pub fn wallet(ledger: &Arc<dyn LedgerClient>) -> IdentityWallet {
    IdentityWallet::new()
        .with_client(Arc::clone(ledger))
        .create()
        .expect("wallet with client")
}

pub fn verifier(ledger: &Arc<dyn LedgerClient>) -> Verifier {
    Verifier::new()
        .with_client(Arc::clone(ledger))
        .create()
        .expect("verifier with client")
}

/// A published identity with a signing method only.
pub async fn holder(ledger: &Arc<dyn LedgerClient>) -> Identity {
    wallet(ledger)
        .generate_identity()
        .with_verification_method(METHOD)
        .with_storage_deposit_covered(faucet(ledger))
        .create()
        .await
        .expect("holder identity")
}

/// A published identity with a signing method and a revocation service.
pub async fn issuer(ledger: &Arc<dyn LedgerClient>) -> Identity {
    wallet(ledger)
        .generate_identity()
        .with_verification_method(METHOD)
        .with_revocation_service(REVOCATION_SERVICE)
        .with_storage_deposit_covered(faucet(ledger))
        .create()
        .await
        .expect("issuer identity")
}
