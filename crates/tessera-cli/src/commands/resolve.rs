//! `tessera resolve` — Resolve a DID to its document.

use clap::Args;
use tessera_core::Did;
use tessera_identity::IdentityClient;

use crate::config::CliConfig;

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// The DID to resolve.
    pub did: String,
}

pub async fn run(args: &ResolveArgs, config: &CliConfig) -> anyhow::Result<()> {
    let did: Did = args.did.parse()?;
    let client = IdentityClient::new(config.ledger_client(false));
    let document = client.resolve_did(&did).await?;

    println!("DID: {}", did);
    println!("Document:\n{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
