use std::sync::Arc;

use tessera_identity::DidDocument;
use tessera_ledger::AliasOutput;

use crate::deposit::DepositCover;
use crate::error::CredentialError;
use crate::wallet::Identity;

enum RevocationStep {
    Revoke { fragment: String, index: u32 },
    CoverDeposit(Arc<dyn DepositCover>),
}

/// Revokes credentials an identity issued and publishes the updated
/// document.
pub struct RevocationUpdate<'a> {
    issuer: &'a mut Identity,
    steps: Vec<RevocationStep>,
}

impl<'a> RevocationUpdate<'a> {
    pub(crate) fn new(issuer: &'a mut Identity) -> Self {
        Self {
            issuer,
            steps: Vec::new(),
        }
    }

    /// Revoke index `index` of the revocation bitmap service `fragment`.
    pub fn with_revocation_status(mut self, fragment: impl Into<String>, index: u32) -> Self {
        self.steps.push(RevocationStep::Revoke {
            fragment: fragment.into(),
            index,
        });
        self
    }

    /// Fund any storage deposit the grown document needs. Must follow the
    /// revocation it pays for.
    pub fn with_storage_deposit_covered(mut self, cover: Arc<dyn DepositCover>) -> Self {
        self.steps.push(RevocationStep::CoverDeposit(cover));
        self
    }

    /// Apply every step to a copy of the issuer's document and publish it.
    /// The issuer's local document only changes once publishing succeeds.
    pub async fn create(self) -> Result<DidDocument, CredentialError> {
        let client = self.issuer.client().clone();
        let mut document = self.issuer.document.clone();
        let mut output: Option<AliasOutput> = None;

        for step in self.steps {
            match step {
                RevocationStep::Revoke { fragment, index } => {
                    document.revoke_credentials(&fragment, &[index])?;
                    output = Some(client.update_did_output(&document).await?);
                    tracing::debug!(service = %fragment, index, "Revoked credential index");
                }
                RevocationStep::CoverDeposit(cover) => {
                    let updated = output.as_ref().ok_or(CredentialError::OutputNotUpdated)?;
                    let (_, current) = client.get_alias_output(&updated.alias_id).await?;
                    let extra = updated.amount.saturating_sub(current.amount);
                    if extra > 0 {
                        cover.cover(self.issuer.address(), extra).await?;
                    }
                }
            }
        }

        let output = output.ok_or(CredentialError::OutputNotUpdated)?;
        let published = client
            .publish_did_output(self.issuer.keypair(), output)
            .await?;
        tracing::info!(did = %published.id(), "Published revocation");
        self.issuer.document = published.clone();
        Ok(published)
    }
}
