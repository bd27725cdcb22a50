//! `tessera demo` — Issue, present, expire and revoke a degree credential.

use clap::Args;
use std::sync::Arc;
use std::time::Duration;

use tessera_credentials::{
    link_to_explorer, link_to_identity_output, not_older_than, DepositCover, FaucetDepositCover,
    Identity, IdentityWallet, PresentationRequest, PresentationValidation, Verifier,
};
use tessera_identity::Jwt;
use tessera_ledger::LedgerClient;

use crate::config::CliConfig;

/// Fragment of every signing method in the scenario.
const METHOD: &str = "verify";
const REVOCATION_SERVICE: &str = "revoke";

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Run against a fresh in-process ledger instead of the configured node.
    #[arg(long)]
    pub in_memory: bool,
}

/// Validation results of the three presentations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoOutcome {
    pub fresh: bool,
    pub aged: bool,
    pub revoked: bool,
}

impl DemoOutcome {
    pub const EXPECTED: DemoOutcome = DemoOutcome {
        fresh: true,
        aged: false,
        revoked: false,
    };
}

pub async fn run(args: &DemoArgs, config: &CliConfig) -> anyhow::Result<()> {
    let ledger = config.ledger_client(args.in_memory);
    let outcome = run_scenario(ledger, config).await?;

    println!();
    println!("Fresh credential validated:   {}", outcome.fresh);
    println!("Aged credential validated:    {}", outcome.aged);
    println!("Revoked credential validated: {}", outcome.revoked);
    if outcome != DemoOutcome::EXPECTED {
        anyhow::bail!("demo outcome {:?} differs from {:?}", outcome, DemoOutcome::EXPECTED);
    }
    Ok(())
}

pub async fn run_scenario(
    ledger: Arc<dyn LedgerClient>,
    config: &CliConfig,
) -> anyhow::Result<DemoOutcome> {
    let explorer = &config.ledger.explorer_url;
    let index = config.demo.revocation_index;
    let max_age = Duration::from_secs(config.demo.max_age_secs);

    let cover: Arc<dyn DepositCover> = Arc::new(
        FaucetDepositCover::new(Arc::clone(&ledger))
            .with_poll_interval(config.wallet.poll_interval())
            .with_max_attempts(config.wallet.max_attempts),
    );
    let wallet = IdentityWallet::new()
        .with_client(Arc::clone(&ledger))
        .with_coin_type(config.wallet.coin_type)
        .create()?;
    let verifier = Verifier::new().with_client(ledger).create()?;

    let hans = wallet
        .generate_identity()
        .with_verification_method(METHOD)
        .with_storage_deposit_covered(Arc::clone(&cover))
        .create()
        .await?;
    print_identity("Hans", &hans, explorer).await?;

    let mut college = wallet
        .generate_identity()
        .with_verification_method(METHOD)
        .with_revocation_service(REVOCATION_SERVICE)
        .with_storage_deposit_covered(Arc::clone(&cover))
        .create()
        .await?;
    print_identity("College", &college, explorer).await?;

    let degree = college
        .generate_credential()
        .with_subject(&hans)
        .with_property("degree", "Degree")
        .with_verification_method(METHOD)
        .with_revocation_status(REVOCATION_SERVICE, index)
        .create()?;
    tracing::info!(issuer = %college.did(), subject = %hans.did(), index, "Issued degree");

    let request = verifier
        .generate_presentation_request()
        .with_predicate(not_older_than(max_age))
        .create()?;
    let response = respond(&hans, &request, &degree)?;
    let fresh = validate(&verifier, &request, &response).await?;

    tracing::info!(
        seconds = config.demo.expiry_wait_secs,
        "Waiting for the credential to age"
    );
    tokio::time::sleep(Duration::from_secs(config.demo.expiry_wait_secs)).await;
    let aged = validate(&verifier, &request, &response).await?;

    college
        .generate_revocation()
        .with_revocation_status(REVOCATION_SERVICE, index)
        .with_storage_deposit_covered(cover)
        .create()
        .await?;
    tracing::info!(issuer = %college.did(), index, "Revoked degree");

    let request = verifier.generate_presentation_request().create()?;
    let response = respond(&hans, &request, &degree)?;
    let revoked = validate(&verifier, &request, &response).await?;

    Ok(DemoOutcome {
        fresh: fresh.validated,
        aged: aged.validated,
        revoked: revoked.validated,
    })
}

async fn print_identity(name: &str, identity: &Identity, explorer: &str) -> anyhow::Result<()> {
    println!("{}: {}", name, identity.did());
    println!("  resolver: {}", link_to_explorer(explorer, identity.did()));
    println!(
        "  output:   {}",
        link_to_identity_output(explorer, identity).await?
    );
    Ok(())
}

fn respond(
    holder: &Identity,
    request: &PresentationRequest,
    credential: &Jwt,
) -> anyhow::Result<Jwt> {
    let response = holder
        .generate_presentation_response()
        .with_nonce(request.nonce.clone())
        .with_verification_method(METHOD)
        .with_credential(credential.clone())
        .create()?;
    Ok(response)
}

async fn validate(
    verifier: &Verifier,
    request: &PresentationRequest,
    response: &Jwt,
) -> anyhow::Result<PresentationValidation> {
    let validation = verifier
        .generate_presentation_validation()
        .with_request(request)
        .with_response(response.clone())
        .create()
        .await?;
    for failure in &validation.credential_errors {
        println!(
            "  credential {} from {}: {}",
            failure.index, failure.issuer, failure.errors
        );
    }
    if validation.unsatisfied_predicates > 0 {
        println!("  unsatisfied predicates: {}", validation.unsatisfied_predicates);
    }
    Ok(validation)
}
