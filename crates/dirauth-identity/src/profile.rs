//! Profile provider
//!
//! Invoked by the token-issuance framework after the fact, keyed only by
//! the stored subject identifier: claims re-derivation at issuance time and
//! liveness checks for existing sessions.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::claims::{claim_types, Claim};
use crate::error::{IdentityError, Result};
use crate::models::LocalAccount;
use crate::repository::AccountRepository;

pub struct ProfileProvider<R> {
    repository: Arc<R>,
}

impl<R: AccountRepository> ProfileProvider<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Re-derive the claim set for a subject. Unlike validation-time claims,
    /// only populated profile fields produce a claim here.
    pub async fn build_claims(&self, subject: &str) -> Result<Vec<Claim>> {
        let account = self
            .find_subject(subject)
            .await?
            .ok_or_else(|| IdentityError::UnknownSubject(subject.to_string()))?;

        let mut claims = Vec::new();
        if !account.username.is_empty() {
            claims.push(Claim::new(claim_types::NAME, account.username.clone()));
        }
        if !account.email.is_empty() {
            claims.push(Claim::new(claim_types::EMAIL, account.email.clone()));
        }
        if !account.given_name.is_empty() {
            claims.push(Claim::new(claim_types::GIVEN_NAME, account.given_name.clone()));
        }
        if !account.family_name.is_empty() {
            claims.push(Claim::new(
                claim_types::FAMILY_NAME,
                account.family_name.clone(),
            ));
        }

        let roles = self.repository.get_roles(account.id).await?;
        claims.extend(
            roles
                .into_iter()
                .map(|role| Claim::new(claim_types::ROLE, role)),
        );

        debug!(subject, claims = claims.len(), "profile claims rebuilt");
        Ok(claims)
    }

    /// Whether the subject still maps to a live account. Deleted accounts
    /// turn existing sessions inactive without explicit revocation.
    pub async fn is_active(&self, subject: &str) -> Result<bool> {
        Ok(self.find_subject(subject).await?.is_some())
    }

    async fn find_subject(&self, subject: &str) -> Result<Option<LocalAccount>> {
        // A malformed subject is an unknown one, not a fault.
        let id = match Uuid::parse_str(subject) {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };
        Ok(self.repository.find_by_id(id).await?)
    }
}
