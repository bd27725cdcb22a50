use tessera_core::{Did, OutputId};

use crate::error::CredentialError;
use crate::wallet::Identity;

/// Explorer page resolving a DID.
pub fn link_to_explorer(explorer_url: &str, did: &Did) -> String {
    format!("{}/identity-resolver/{}", explorer_url.trim_end_matches('/'), did)
}

/// Explorer page of a single output.
pub fn link_to_alias_output(explorer_url: &str, output_id: &OutputId) -> String {
    format!("{}/output/{}", explorer_url.trim_end_matches('/'), output_id)
}

/// Explorer page of the alias output currently holding an identity's
/// document.
pub async fn link_to_identity_output(
    explorer_url: &str,
    identity: &Identity,
) -> Result<String, CredentialError> {
    let (output_id, _) = identity
        .client()
        .get_alias_output(&identity.did().alias_id())
        .await?;
    Ok(link_to_alias_output(explorer_url, &output_id))
}
