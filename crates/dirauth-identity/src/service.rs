//! Pipeline facade
//!
//! Single entry point for embedding applications: wires the validator and
//! the profile provider over one shared repository and directory client.

use std::sync::Arc;

use dirauth_ldap::Directory;

use crate::claims::Claim;
use crate::error::Result;
use crate::models::AuthenticationResult;
use crate::profile::ProfileProvider;
use crate::repository::AccountRepository;
use crate::roles::RoleMapping;
use crate::validator::CredentialValidator;

pub struct IdentityService<D, R> {
    validator: CredentialValidator<D, R>,
    profile: ProfileProvider<R>,
}

impl<D: Directory, R: AccountRepository> IdentityService<D, R> {
    pub fn new(directory: Arc<D>, repository: Arc<R>, role_mapping: RoleMapping) -> Self {
        Self {
            validator: CredentialValidator::new(directory, Arc::clone(&repository), role_mapping),
            profile: ProfileProvider::new(repository),
        }
    }

    /// Password-grant entry point.
    pub async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> AuthenticationResult {
        self.validator.validate(username, password).await
    }

    /// Token-issuance entry point.
    pub async fn build_claims(&self, subject: &str) -> Result<Vec<Claim>> {
        self.profile.build_claims(subject).await
    }

    /// Session-validation entry point.
    pub async fn is_active(&self, subject: &str) -> Result<bool> {
        self.profile.is_active(subject).await
    }
}
