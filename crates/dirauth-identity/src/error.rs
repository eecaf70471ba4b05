//! Error types for the identity pipeline

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IdentityError>;

/// Errors surfaced by the account repository seam.
///
/// `Duplicate` is load-bearing: the synchronizer relies on it to detect a
/// lost create race and fall back to an update.
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Account already exists: {0}")]
    Duplicate(String),

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Repository backend error: {0}")]
    Backend(String),
}

/// Errors surfaced by the profile provider.
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Unknown subject: {0}")]
    UnknownSubject(String),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}
