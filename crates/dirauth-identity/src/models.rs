//! Data models for the identity pipeline

use chrono::{DateTime, Utc};
use dirauth_ldap::DirectoryUser;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::claims::Claim;

/// Authentication-method tag attached to accepted results.
pub const AUTH_METHOD_DIRECTORY: &str = "ldap";

/// A locally stored account backed by a directory entry.
///
/// Profile fields mirror the directory and are overwritten on every
/// successful authentication. Role assignments are owned by the repository
/// and are not part of this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalAccount {
    /// Stable identifier, assigned at creation. Used as the token subject.
    pub id: Uuid,
    /// Unique join key between the directory and the local store.
    pub username: String,
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    /// Distinguished name of the backing directory entry.
    pub directory_dn: String,
    /// Directory-authenticated identities are trusted as already verified.
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl LocalAccount {
    /// New account seeded from a directory entry.
    pub fn from_directory(user: &DirectoryUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: user.username.clone(),
            email: user.email.clone(),
            given_name: user.given_name.clone(),
            family_name: user.family_name.clone(),
            directory_dn: user.dn.clone(),
            email_verified: true,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }

    /// Overwrite the directory-derived fields. Local-only fields such as
    /// timestamps are untouched.
    pub fn apply_profile(&mut self, profile: &AccountProfile) {
        self.email = profile.email.clone();
        self.given_name = profile.given_name.clone();
        self.family_name = profile.family_name.clone();
        self.directory_dn = profile.directory_dn.clone();
    }
}

impl Default for LocalAccount {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            username: String::new(),
            email: String::new(),
            given_name: String::new(),
            family_name: String::new(),
            directory_dn: String::new(),
            email_verified: true,
            created_at: Utc::now(),
            last_login_at: None,
        }
    }
}

/// The directory-derived subset of account fields.
///
/// Payload of the repository's profile update, kept separate from
/// [`LocalAccount`] so a profile sync can never touch local-only fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub email: String,
    pub given_name: String,
    pub family_name: String,
    pub directory_dn: String,
}

impl From<&DirectoryUser> for AccountProfile {
    fn from(user: &DirectoryUser) -> Self {
        Self {
            email: user.email.clone(),
            given_name: user.given_name.clone(),
            family_name: user.family_name.clone(),
            directory_dn: user.dn.clone(),
        }
    }
}

/// Why an authentication attempt was turned down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Credential-stage failure, deliberately unspecific.
    InvalidCredentials,
    /// The credential was valid but the local account could not be written.
    ProvisioningFailed,
    /// An internal fault was caught at the top of the pipeline.
    AuthenticationError,
}

/// Terminal verdict of one authentication attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AuthenticationResult {
    Accepted {
        /// The local account's stable identifier.
        subject: String,
        /// Authentication-method tag, always [`AUTH_METHOD_DIRECTORY`].
        method: String,
        claims: Vec<Claim>,
    },
    Rejected {
        reason: RejectionReason,
        message: String,
    },
}

impl AuthenticationResult {
    pub fn accepted(subject: impl Into<String>, claims: Vec<Claim>) -> Self {
        Self::Accepted {
            subject: subject.into(),
            method: AUTH_METHOD_DIRECTORY.to_string(),
            claims,
        }
    }

    pub fn rejected(reason: RejectionReason, message: impl Into<String>) -> Self {
        Self::Rejected {
            reason,
            message: message.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}
