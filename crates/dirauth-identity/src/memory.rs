//! In-process account store
//!
//! Backs tests and single-node deployments. Username uniqueness is enforced
//! through a dedicated index so concurrent creates cannot slip past each
//! other.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use async_trait::async_trait;

use crate::error::RepositoryError;
use crate::models::{AccountProfile, LocalAccount};
use crate::repository::AccountRepository;

#[derive(Default)]
pub struct MemoryAccountRepository {
    accounts: DashMap<Uuid, LocalAccount>,
    username_index: DashMap<String, Uuid>,
    roles: DashMap<Uuid, Vec<String>>,
}

impl MemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Administrative removal. Not part of the pipeline's own operations.
    pub fn remove(&self, id: Uuid) -> Option<LocalAccount> {
        let removed = self.accounts.remove(&id).map(|(_, account)| account);
        if let Some(account) = &removed {
            self.username_index.remove(&account.username);
            self.roles.remove(&id);
        }
        removed
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountRepository {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<LocalAccount>, RepositoryError> {
        let id = match self.username_index.get(username) {
            Some(entry) => *entry.value(),
            None => return Ok(None),
        };
        Ok(self.accounts.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LocalAccount>, RepositoryError> {
        Ok(self.accounts.get(&id).map(|entry| entry.value().clone()))
    }

    async fn create(&self, account: &LocalAccount) -> Result<(), RepositoryError> {
        // The vacant-entry guard makes the uniqueness check and the index
        // write one atomic step.
        match self.username_index.entry(account.username.clone()) {
            Entry::Occupied(_) => Err(RepositoryError::Duplicate(account.username.clone())),
            Entry::Vacant(slot) => {
                self.accounts.insert(account.id, account.clone());
                self.roles.insert(account.id, Vec::new());
                slot.insert(account.id);
                Ok(())
            }
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        profile: &AccountProfile,
    ) -> Result<(), RepositoryError> {
        match self.accounts.get_mut(&id) {
            Some(mut stored) => {
                stored.apply_profile(profile);
                Ok(())
            }
            None => Err(RepositoryError::NotFound(id.to_string())),
        }
    }

    async fn get_roles(&self, id: Uuid) -> Result<Vec<String>, RepositoryError> {
        Ok(self
            .roles
            .get(&id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn add_roles(&self, id: Uuid, roles: &[String]) -> Result<(), RepositoryError> {
        let mut assigned = self.roles.entry(id).or_default();
        for role in roles {
            if !assigned.contains(role) {
                assigned.push(role.clone());
            }
        }
        Ok(())
    }

    async fn remove_roles(&self, id: Uuid, roles: &[String]) -> Result<(), RepositoryError> {
        if let Some(mut assigned) = self.roles.get_mut(&id) {
            assigned.retain(|role| !roles.contains(role));
        }
        Ok(())
    }

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        match self.accounts.get_mut(&id) {
            Some(mut stored) => {
                stored.last_login_at = Some(at);
                Ok(())
            }
            None => Err(RepositoryError::NotFound(id.to_string())),
        }
    }
}
