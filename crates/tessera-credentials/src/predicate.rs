//! Conditions a verifier places on the credentials of a presentation.
//!
//! A request is satisfied when every predicate holds for at least one of
//! the presented credentials.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tessera_core::Did;
use tessera_identity::Credential;

pub type Predicate = Arc<dyn Fn(&Credential) -> bool + Send + Sync>;

/// Holds for credentials issued less than `max_age` before evaluation.
pub fn not_older_than(max_age: Duration) -> Predicate {
    Arc::new(move |credential: &Credential| {
        let age = Utc::now().signed_duration_since(credential.issuance_date);
        // Negative ages do not convert; a credential from the future is not old.
        age.to_std().map_or(true, |age| age < max_age)
    })
}

/// Holds for credentials whose subject carries `key` with exactly `value`.
pub fn has_property(key: impl Into<String>, value: impl Into<serde_json::Value>) -> Predicate {
    let key = key.into();
    let value = value.into();
    Arc::new(move |credential: &Credential| credential.property(&key) == Some(&value))
}

pub fn issued_by(issuer: Did) -> Predicate {
    Arc::new(move |credential: &Credential| credential.issuer == issuer)
}
