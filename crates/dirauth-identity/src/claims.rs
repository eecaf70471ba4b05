//! Claim construction for issued tokens

use serde::{Deserialize, Serialize};

use crate::models::LocalAccount;

/// Standard claim type names attached to issued tokens.
pub mod claim_types {
    pub const NAME: &str = "name";
    pub const EMAIL: &str = "email";
    pub const GIVEN_NAME: &str = "given_name";
    pub const FAMILY_NAME: &str = "family_name";
    pub const ROLE: &str = "role";
}

/// A typed fact about an authenticated subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    #[serde(rename = "type")]
    pub claim_type: String,
    pub value: String,
}

impl Claim {
    pub fn new(claim_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            claim_type: claim_type.into(),
            value: value.into(),
        }
    }
}

/// Claims issued at validation time. The `name` claim carries the account
/// username; all four profile claims are present even when a value is
/// empty, followed by one claim per assigned role.
pub fn for_account(account: &LocalAccount, roles: &[String]) -> Vec<Claim> {
    let mut claims = vec![
        Claim::new(claim_types::NAME, account.username.clone()),
        Claim::new(claim_types::EMAIL, account.email.clone()),
        Claim::new(claim_types::GIVEN_NAME, account.given_name.clone()),
        Claim::new(claim_types::FAMILY_NAME, account.family_name.clone()),
    ];
    claims.extend(
        roles
            .iter()
            .map(|role| Claim::new(claim_types::ROLE, role.clone())),
    );
    claims
}
