//! Directory connection settings

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::DirectoryError;

/// Connection settings for the LDAP directory.
///
/// Loaded once at startup by the embedding application and handed to
/// [`LdapClient::new`](crate::client::LdapClient::new).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LdapSettings {
    /// Directory server host name or address.
    pub host: String,

    /// Directory server port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base DN under which users and groups are searched.
    pub base_dn: String,

    /// DN of the service account used for searches.
    pub bind_dn: String,

    /// Password of the service account.
    pub bind_password: String,

    /// Connect with TLS from the start (`ldaps://`).
    #[serde(default)]
    pub use_tls: bool,

    /// Timeout in seconds applied to connecting and to each directory
    /// operation individually.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_port() -> u16 {
    389
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for LdapSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: default_port(),
            base_dn: String::new(),
            bind_dn: String::new(),
            bind_password: String::new(),
            use_tls: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LdapSettings {
    /// Server URL derived from host, port and the TLS flag.
    pub fn url(&self) -> String {
        let scheme = if self.use_tls { "ldaps" } else { "ldap" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }

    /// Operation timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check that the settings are usable before a connection is attempted.
    pub fn validate(&self) -> Result<(), DirectoryError> {
        if self.host.is_empty() {
            return Err(DirectoryError::InvalidSettings("host is required".into()));
        }
        if self.base_dn.is_empty() {
            return Err(DirectoryError::InvalidSettings("base_dn is required".into()));
        }
        if self.bind_dn.is_empty() {
            return Err(DirectoryError::InvalidSettings("bind_dn is required".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LdapSettings {
        LdapSettings {
            host: "ldap.example.com".to_string(),
            base_dn: "dc=example,dc=com".to_string(),
            bind_dn: "cn=admin,dc=example,dc=com".to_string(),
            bind_password: "admin".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_url_plain() {
        assert_eq!(settings().url(), "ldap://ldap.example.com:389");
    }

    #[test]
    fn test_url_tls() {
        let mut s = settings();
        s.use_tls = true;
        s.port = 636;
        assert_eq!(s.url(), "ldaps://ldap.example.com:636");
    }

    #[test]
    fn test_validate_accepts_complete_settings() {
        assert!(settings().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_host() {
        let mut s = settings();
        s.host.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_missing_base_dn() {
        let mut s = settings();
        s.base_dn.clear();
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_defaults_applied_when_omitted() {
        let parsed: LdapSettings = toml::from_str(
            r#"
            host = "ldap.example.com"
            base_dn = "dc=example,dc=com"
            bind_dn = "cn=admin,dc=example,dc=com"
            bind_password = "admin"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.port, 389);
        assert!(!parsed.use_tls);
        assert_eq!(parsed.timeout(), Duration::from_secs(10));
    }
}
