//! Credential validation
//!
//! One run per request: directory authentication, account synchronization,
//! claim construction. Every fault maps to a `Rejected` outcome; nothing
//! here panics or propagates an error to the caller.

use std::sync::Arc;

use chrono::Utc;
use dirauth_ldap::Directory;
use tracing::{error, info, warn};

use crate::claims;
use crate::error::RepositoryError;
use crate::models::{AuthenticationResult, RejectionReason};
use crate::repository::AccountRepository;
use crate::roles::RoleMapping;
use crate::sync::AccountSynchronizer;

pub struct CredentialValidator<D, R> {
    directory: Arc<D>,
    synchronizer: AccountSynchronizer<R>,
    repository: Arc<R>,
}

impl<D: Directory, R: AccountRepository> CredentialValidator<D, R> {
    pub fn new(directory: Arc<D>, repository: Arc<R>, role_mapping: RoleMapping) -> Self {
        Self {
            directory,
            synchronizer: AccountSynchronizer::new(Arc::clone(&repository), role_mapping),
            repository,
        }
    }

    /// Run one authentication attempt. The password is never logged.
    pub async fn validate(&self, username: &str, password: &str) -> AuthenticationResult {
        match self.try_validate(username, password).await {
            Ok(result) => result,
            Err(e) => {
                error!(username, error = %e, "authentication attempt failed unexpectedly");
                AuthenticationResult::rejected(
                    RejectionReason::AuthenticationError,
                    "Authentication error",
                )
            }
        }
    }

    async fn try_validate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AuthenticationResult, RepositoryError> {
        let directory_user = match self.directory.authenticate(username, password).await {
            Ok(user) => user,
            Err(e) => {
                // Uniform rejection: the exact failure stays in the logs so
                // callers cannot tell which usernames exist.
                warn!(username, error = %e, "directory authentication failed");
                return Ok(AuthenticationResult::rejected(
                    RejectionReason::InvalidCredentials,
                    "Invalid username or password",
                ));
            }
        };

        let account = match self.synchronizer.sync_account(&directory_user).await {
            Ok(account) => account,
            Err(e) => {
                error!(username, error = %e, "account provisioning failed");
                return Ok(AuthenticationResult::rejected(
                    RejectionReason::ProvisioningFailed,
                    "User provisioning failed",
                ));
            }
        };

        let roles = self.repository.get_roles(account.id).await?;
        let claims = claims::for_account(&account, &roles);

        self.repository
            .update_last_login(account.id, Utc::now())
            .await?;

        info!(username, subject = %account.id, "authentication succeeded");
        Ok(AuthenticationResult::accepted(account.id.to_string(), claims))
    }
}
