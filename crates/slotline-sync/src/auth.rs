//! # Mutation Credentials
//!
//! Every mutation path takes a credential; reads do not. Issuance and
//! renewal live outside the engine, which only checks presence and expiry
//! at the top of each mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// An opaque bearer credential for authenticated mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Opaque token issued by the external auth service.
    pub token: String,

    /// Expiry instant, if the issuer set one.
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// Creates a non-expiring credential.
    pub fn new(token: impl Into<String>) -> Self {
        Credential {
            token: token.into(),
            expires_at: None,
        }
    }

    /// Creates a credential with an expiry instant.
    pub fn with_expiry(token: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Credential {
            token: token.into(),
            expires_at: Some(expires_at),
        }
    }

    /// Checks that the credential is present and unexpired at `now`.
    ///
    /// ## Rules
    /// - empty token → `MissingCredential`
    /// - `expires_at` at or before `now` → `CredentialExpired`
    pub fn ensure_valid(&self, now: DateTime<Utc>) -> EngineResult<()> {
        if self.token.is_empty() {
            return Err(EngineError::MissingCredential);
        }
        if let Some(expires_at) = self.expires_at {
            if expires_at <= now {
                return Err(EngineError::CredentialExpired);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_empty_token_is_missing() {
        let cred = Credential::new("");
        assert!(matches!(
            cred.ensure_valid(Utc::now()),
            Err(EngineError::MissingCredential)
        ));
    }

    #[test]
    fn test_expiry_check() {
        let now = Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap();

        let live = Credential::with_expiry("tok", now + chrono::Duration::hours(1));
        assert!(live.ensure_valid(now).is_ok());

        let expired = Credential::with_expiry("tok", now);
        assert!(matches!(
            expired.ensure_valid(now),
            Err(EngineError::CredentialExpired)
        ));

        let forever = Credential::new("tok");
        assert!(forever.ensure_valid(now).is_ok());
    }
}
