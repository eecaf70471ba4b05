//! Identity reconciliation and credential validation for dirauth
//!
//! Orchestrates one authentication attempt end to end: directory credential
//! check, local account create-or-update, role reconciliation against group
//! membership, claim construction. A separate profile provider serves
//! later claims re-derivation and session liveness checks.

pub mod claims;
pub mod error;
pub mod memory;
pub mod models;
pub mod profile;
pub mod repository;
pub mod roles;
pub mod service;
pub mod sync;
pub mod validator;

pub use claims::{claim_types, Claim};
pub use error::{IdentityError, RepositoryError};
pub use memory::MemoryAccountRepository;
pub use models::{
    AccountProfile, AuthenticationResult, LocalAccount, RejectionReason, AUTH_METHOD_DIRECTORY,
};
pub use profile::ProfileProvider;
pub use repository::AccountRepository;
pub use roles::RoleMapping;
pub use service::IdentityService;
pub use sync::AccountSynchronizer;
pub use validator::CredentialValidator;

pub use dirauth_ldap::{Directory, DirectoryError, DirectoryUser};
