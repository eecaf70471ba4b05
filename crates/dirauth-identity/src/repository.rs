//! Account repository seam
//!
//! The persistent account store lives outside this crate. Everything here
//! talks to it through [`AccountRepository`], which mirrors the operations
//! the pipeline needs and nothing more.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::models::{AccountProfile, LocalAccount};

/// Abstract account store.
///
/// Implementations must enforce username uniqueness on `create` and report
/// a violation as [`RepositoryError::Duplicate`]; the synchronizer depends
/// on that signal to resolve concurrent first logins.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<LocalAccount>, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LocalAccount>, RepositoryError>;

    /// Insert a new account. The caller assigns the identifier.
    async fn create(&self, account: &LocalAccount) -> Result<(), RepositoryError>;

    /// Overwrite the directory-derived profile fields of a stored account.
    async fn update_profile(
        &self,
        id: Uuid,
        profile: &AccountProfile,
    ) -> Result<(), RepositoryError>;

    /// Role names currently assigned to the account.
    async fn get_roles(&self, id: Uuid) -> Result<Vec<String>, RepositoryError>;

    async fn add_roles(&self, id: Uuid, roles: &[String]) -> Result<(), RepositoryError>;

    async fn remove_roles(&self, id: Uuid, roles: &[String]) -> Result<(), RepositoryError>;

    async fn update_last_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError>;
}
