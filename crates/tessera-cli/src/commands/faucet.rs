//! `tessera faucet` — Fund an address from the faucet.

use clap::Args;
use tessera_core::Address;
use tessera_credentials::FaucetDepositCover;

use crate::config::CliConfig;

#[derive(Args, Debug)]
pub struct FaucetArgs {
    /// Bech32 address to fund.
    pub address: String,
}

pub async fn run(args: &FaucetArgs, config: &CliConfig) -> anyhow::Result<()> {
    let address: Address = args.address.parse()?;
    let faucet = FaucetDepositCover::new(config.ledger_client(false))
        .with_poll_interval(config.wallet.poll_interval())
        .with_max_attempts(config.wallet.max_attempts);
    let balance = faucet.request_tokens(&address).await?;
    println!("Funded {}, balance now {}", address, balance);
    Ok(())
}
