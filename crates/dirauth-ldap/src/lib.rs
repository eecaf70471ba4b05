//! LDAP directory client for dirauth
//!
//! Verifies user credentials against an LDAP directory and resolves group
//! memberships. The directory is treated as read-only; the only writes are
//! the bind operations used to prove passwords.

pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::LdapClient;
pub use config::LdapSettings;
pub use error::{DirectoryError, Result};
pub use types::{Directory, DirectoryUser};
