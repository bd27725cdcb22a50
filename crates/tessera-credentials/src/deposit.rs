use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tessera_core::Address;
use tessera_ledger::{tokens_available, LedgerClient};

use crate::error::CredentialError;

/// Makes sure an address holds enough tokens for a storage deposit.
#[async_trait]
pub trait DepositCover: Send + Sync {
    async fn cover(&self, address: &Address, tokens_required: u64) -> Result<(), CredentialError>;
}

/// Covers deposits by asking the ledger's faucet for funds.
///
/// Each request is followed by polling the address balance until it
/// changes, since a remote faucet confirms asynchronously.
#[derive(Clone)]
pub struct FaucetDepositCover {
    ledger: Arc<dyn LedgerClient>,
    poll_interval: Duration,
    max_attempts: u32,
}

impl FaucetDepositCover {
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 12;

    pub fn new(ledger: Arc<dyn LedgerClient>) -> Self {
        Self {
            ledger,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Request funds once and wait until the balance moves.
    ///
    /// Returns the new balance.
    pub async fn request_tokens(&self, address: &Address) -> Result<u64, CredentialError> {
        let before = tokens_available(self.ledger.as_ref(), address).await?;
        self.ledger.request_funds(address).await?;
        tracing::debug!(address = %address, balance = before, "Requested faucet funds");

        for attempt in 1..=self.max_attempts {
            let balance = tokens_available(self.ledger.as_ref(), address).await?;
            if balance != before {
                tracing::info!(address = %address, balance, attempt, "Faucet funds arrived");
                return Ok(balance);
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        Err(CredentialError::FaucetTimeout {
            address: address.to_string(),
            attempts: self.max_attempts,
        })
    }
}

#[async_trait]
impl DepositCover for FaucetDepositCover {
    async fn cover(&self, address: &Address, tokens_required: u64) -> Result<(), CredentialError> {
        let mut balance = tokens_available(self.ledger.as_ref(), address).await?;
        let mut requests = 0;
        while balance < tokens_required {
            if requests == self.max_attempts {
                return Err(CredentialError::FaucetTimeout {
                    address: address.to_string(),
                    attempts: requests,
                });
            }
            balance = self.request_tokens(address).await?;
            requests += 1;
        }
        tracing::debug!(address = %address, balance, tokens_required, "Storage deposit covered");
        Ok(())
    }
}
