//! Error types for directory operations

use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DirectoryError>;

/// Errors raised by directory operations.
///
/// `UserNotFound` and `InvalidCredentials` describe the credential check
/// itself; callers facing end users must collapse both into one uniform
/// rejection. The remaining variants are connectivity or configuration
/// faults.
#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("User not found in directory")]
    UserNotFound,

    #[error("Directory rejected the supplied credentials")]
    InvalidCredentials,

    #[error("Service bind failed with code {rc}: {text}")]
    ServiceBind { rc: u32, text: String },

    #[error("Directory connection error: {0}")]
    Connection(#[from] ldap3::LdapError),

    #[error("Directory operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid directory settings: {0}")]
    InvalidSettings(String),
}
