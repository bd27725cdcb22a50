use chrono::Utc;
use serde::{Deserialize, Serialize};
use tessera_core::Did;

use crate::credential::BASE_CONTEXT;
use crate::jwt::{to_timestamp, Jwt, JwtPresentationOptions, PresentationJwtClaims, VpClaim};

pub const PRESENTATION_TYPE: &str = "VerifiablePresentation";

/// Credentials a holder shows to a verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    pub holder: Did,
    pub verifiable_credential: Vec<Jwt>,
}

impl Presentation {
    pub fn new(holder: Did, credentials: Vec<Jwt>) -> Self {
        Self {
            context: vec![BASE_CONTEXT.to_string()],
            id: None,
            types: vec![PRESENTATION_TYPE.to_string()],
            holder,
            verifiable_credential: credentials,
        }
    }

    pub(crate) fn to_jwt_claims(&self, options: &JwtPresentationOptions) -> PresentationJwtClaims {
        let issued = options.issuance_date.unwrap_or_else(Utc::now);
        PresentationJwtClaims {
            iss: self.holder.clone(),
            nbf: Some(to_timestamp(&issued)),
            exp: options.expiration_date.as_ref().map(to_timestamp),
            jti: self.id.clone(),
            aud: options.audience.clone(),
            vp: VpClaim {
                context: self.context.clone(),
                types: self.types.clone(),
                verifiable_credential: self.verifiable_credential.clone(),
            },
        }
    }

    pub(crate) fn from_jwt_claims(claims: PresentationJwtClaims) -> Self {
        Self {
            context: claims.vp.context,
            id: claims.jti,
            types: claims.vp.types,
            holder: claims.iss,
            verifiable_credential: claims.vp.verifiable_credential,
        }
    }
}
