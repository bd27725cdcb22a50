//! `tessera balance` — Tokens spendable by an address.

use clap::Args;
use tessera_core::Address;
use tessera_ledger::tokens_available;

use crate::config::CliConfig;

#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Bech32 address to query.
    pub address: String,
}

pub async fn run(args: &BalanceArgs, config: &CliConfig) -> anyhow::Result<()> {
    let address: Address = args.address.parse()?;
    let client = config.ledger_client(false);
    let balance = tokens_available(client.as_ref(), &address).await?;
    println!("{}: {}", address, balance);
    Ok(())
}
