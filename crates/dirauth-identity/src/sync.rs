//! Identity synchronization
//!
//! Reconciles a freshly authenticated directory user against the local
//! account store. The directory is the source of truth for profile fields;
//! role assignments are diffed, never replaced wholesale.

use std::sync::Arc;

use dirauth_ldap::DirectoryUser;
use tracing::{debug, info, warn};

use crate::error::RepositoryError;
use crate::models::{AccountProfile, LocalAccount};
use crate::repository::AccountRepository;
use crate::roles::RoleMapping;

pub struct AccountSynchronizer<R> {
    repository: Arc<R>,
    role_mapping: RoleMapping,
}

impl<R: AccountRepository> AccountSynchronizer<R> {
    pub fn new(repository: Arc<R>, role_mapping: RoleMapping) -> Self {
        Self {
            repository,
            role_mapping,
        }
    }

    /// Create or refresh the local account for a directory user, then
    /// reconcile its role assignments against current group membership.
    pub async fn sync_account(
        &self,
        directory_user: &DirectoryUser,
    ) -> Result<LocalAccount, RepositoryError> {
        let account = match self
            .repository
            .find_by_username(&directory_user.username)
            .await?
        {
            Some(existing) => self.update_existing(existing, directory_user).await?,
            None => self.create_account(directory_user).await?,
        };

        self.sync_roles(&account, &directory_user.groups).await;
        Ok(account)
    }

    async fn create_account(
        &self,
        directory_user: &DirectoryUser,
    ) -> Result<LocalAccount, RepositoryError> {
        let account = LocalAccount::from_directory(directory_user);
        match self.repository.create(&account).await {
            Ok(()) => {
                info!(username = %account.username, subject = %account.id, "created local account");
                Ok(account)
            }
            // Lost a concurrent-create race: another attempt for the same
            // username landed first. Fall through to an update of the
            // winner's row.
            Err(RepositoryError::Duplicate(existing)) => {
                debug!(username = %existing, "account appeared concurrently, updating instead");
                match self
                    .repository
                    .find_by_username(&directory_user.username)
                    .await?
                {
                    Some(account) => self.update_existing(account, directory_user).await,
                    None => Err(RepositoryError::Duplicate(existing)),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn update_existing(
        &self,
        mut account: LocalAccount,
        directory_user: &DirectoryUser,
    ) -> Result<LocalAccount, RepositoryError> {
        let profile = AccountProfile::from(directory_user);
        self.repository.update_profile(account.id, &profile).await?;
        account.apply_profile(&profile);
        debug!(username = %account.username, "refreshed account profile from directory");
        Ok(account)
    }

    /// Reconcile stored roles against current group membership.
    ///
    /// Best-effort: failures are logged per operation and never abort the
    /// sync. Unchanged membership performs no repository writes at all.
    pub async fn sync_roles(&self, account: &LocalAccount, groups: &[String]) {
        let target = self.role_mapping.resolve(groups);

        let current = match self.repository.get_roles(account.id).await {
            Ok(roles) => roles,
            Err(e) => {
                warn!(
                    username = %account.username,
                    error = %e,
                    "could not read current roles, skipping role sync"
                );
                return;
            }
        };

        let to_remove: Vec<String> = current
            .iter()
            .filter(|role| !target.contains(role))
            .cloned()
            .collect();
        let to_add: Vec<String> = target
            .iter()
            .filter(|role| !current.contains(role))
            .cloned()
            .collect();

        if to_remove.is_empty() && to_add.is_empty() {
            return;
        }

        if !to_remove.is_empty() {
            if let Err(e) = self.repository.remove_roles(account.id, &to_remove).await {
                warn!(username = %account.username, error = %e, "failed to remove stale roles");
            }
        }
        if !to_add.is_empty() {
            if let Err(e) = self.repository.add_roles(account.id, &to_add).await {
                warn!(username = %account.username, error = %e, "failed to add new roles");
            }
        }

        debug!(
            username = %account.username,
            added = to_add.len(),
            removed = to_remove.len(),
            "reconciled role assignments"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryAccountRepository;

    fn directory_user(username: &str, groups: &[&str]) -> DirectoryUser {
        DirectoryUser {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            given_name: "Test".to_string(),
            family_name: "User".to_string(),
            dn: format!("uid={username},ou=people,dc=example,dc=com"),
            groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    fn synchronizer(
        repo: &Arc<MemoryAccountRepository>,
    ) -> AccountSynchronizer<MemoryAccountRepository> {
        let mapping = RoleMapping::default().with_mapping("employees", "Employee");
        AccountSynchronizer::new(Arc::clone(repo), mapping)
    }

    #[tokio::test]
    async fn test_first_sync_creates_account() {
        let repo = Arc::new(MemoryAccountRepository::new());
        let sync = synchronizer(&repo);

        let account = sync
            .sync_account(&directory_user("alice", &["employees"]))
            .await
            .unwrap();

        assert_eq!(repo.len(), 1);
        assert!(account.email_verified);
        assert_eq!(
            repo.get_roles(account.id).await.unwrap(),
            vec!["Employee".to_string()]
        );
    }

    #[tokio::test]
    async fn test_second_sync_updates_same_account() {
        let repo = Arc::new(MemoryAccountRepository::new());
        let sync = synchronizer(&repo);

        let first = sync
            .sync_account(&directory_user("alice", &["employees"]))
            .await
            .unwrap();

        let mut changed = directory_user("alice", &["employees"]);
        changed.email = "alice@corp.example.com".to_string();
        let second = sync.sync_account(&changed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(repo.len(), 1);
        let stored = repo.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(stored.email, "alice@corp.example.com");
    }

    #[tokio::test]
    async fn test_sync_without_mapped_groups_assigns_default() {
        let repo = Arc::new(MemoryAccountRepository::new());
        let sync = synchronizer(&repo);

        let account = sync
            .sync_account(&directory_user("bob", &[]))
            .await
            .unwrap();

        assert_eq!(
            repo.get_roles(account.id).await.unwrap(),
            vec!["Employee".to_string()]
        );
    }
}
