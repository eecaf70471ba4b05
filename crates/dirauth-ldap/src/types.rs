//! Directory data types and the client abstraction

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;

/// A user entry as read from the directory.
///
/// Produced for a single authentication attempt and never stored. Attributes
/// the directory does not carry are left as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectoryUser {
    /// Login name (the `uid` attribute).
    pub username: String,

    /// Mail address, empty when the entry has none.
    pub email: String,

    pub given_name: String,

    pub family_name: String,

    /// Distinguished name of the entry.
    pub dn: String,

    /// Short names of the groups the user belongs to, deduplicated in
    /// first-sighting order.
    pub groups: Vec<String>,
}

/// Narrow interface to the directory: credential checks and group lookups.
///
/// Implemented by [`LdapClient`](crate::client::LdapClient). Consumers
/// should accept this trait so the directory can be substituted in tests.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Verify a username/password pair against the directory and return the
    /// matching entry with groups populated.
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<DirectoryUser, DirectoryError>;

    /// Resolve the short names of the groups the user is a member of.
    async fn member_groups(&self, username: &str) -> Result<Vec<String>, DirectoryError>;
}
