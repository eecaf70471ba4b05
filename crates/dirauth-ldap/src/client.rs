//! LDAP client implementation
//!
//! Connection handling follows a strict acquire-use-release pattern: every
//! public operation opens its own connection and unbinds it on all paths.
//! Nothing is cached between calls.

use std::future::Future;

use async_trait::async_trait;
use ldap3::{ldap_escape, Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use tracing::{debug, warn};

use crate::config::LdapSettings;
use crate::error::DirectoryError;
use crate::types::{Directory, DirectoryUser};

/// Attributes requested for a user entry.
const USER_ATTRS: [&str; 5] = ["uid", "mail", "cn", "sn", "givenName"];

/// Attribute naming the groups an entry belongs to. Only populated on
/// servers with the memberOf overlay.
const MEMBER_OF_ATTR: &str = "memberOf";

/// Attribute holding a group's short name.
const GROUP_NAME_ATTR: &str = "cn";

/// LDAP implementation of the [`Directory`] abstraction.
pub struct LdapClient {
    settings: LdapSettings,
}

impl LdapClient {
    pub fn new(settings: LdapSettings) -> Self {
        Self { settings }
    }

    /// Open a fresh connection and spawn its driver. No bind is performed.
    async fn connect(&self) -> Result<Ldap, DirectoryError> {
        let conn_settings = LdapConnSettings::new().set_conn_timeout(self.settings.timeout());
        let url = self.settings.url();
        debug!(url = %url, "connecting to directory");

        let (conn, ldap) = LdapConnAsync::with_settings(conn_settings, &url).await?;
        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "directory connection driver error");
            }
        });

        Ok(ldap)
    }

    /// Await a directory operation under the configured timeout.
    async fn timed<T, F>(&self, op: F) -> Result<T, DirectoryError>
    where
        F: Future<Output = Result<T, ldap3::LdapError>>,
    {
        let limit = self.settings.timeout();
        match tokio::time::timeout(limit, op).await {
            Ok(outcome) => Ok(outcome?),
            Err(_) => Err(DirectoryError::Timeout(limit)),
        }
    }

    /// Bind as the configured service account.
    async fn service_bind(&self, ldap: &mut Ldap) -> Result<(), DirectoryError> {
        let result = self
            .timed(ldap.simple_bind(&self.settings.bind_dn, &self.settings.bind_password))
            .await?;
        if result.rc != 0 {
            return Err(DirectoryError::ServiceBind {
                rc: result.rc,
                text: result.text,
            });
        }
        Ok(())
    }

    /// Locate the user entry and prove possession of the password by
    /// re-binding as that entry on the same connection.
    async fn verify_credentials(
        &self,
        ldap: &mut Ldap,
        username: &str,
        password: &str,
    ) -> Result<DirectoryUser, DirectoryError> {
        self.service_bind(ldap).await?;

        let filter = user_filter(username);
        debug!(filter = %filter, "searching for user entry");
        let search = self
            .timed(ldap.search(
                &self.settings.base_dn,
                Scope::Subtree,
                &filter,
                USER_ATTRS.to_vec(),
            ))
            .await?;
        let (entries, _) = search.success()?;

        let entry = match entries.into_iter().next() {
            Some(entry) => SearchEntry::construct(entry),
            None => return Err(DirectoryError::UserNotFound),
        };
        let user = user_from_entry(&entry, username);

        let bind = self.timed(ldap.simple_bind(&user.dn, password)).await?;
        if bind.rc != 0 {
            debug!(rc = bind.rc, "user bind rejected");
            return Err(DirectoryError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Collect group names from both lookup strategies. Each search degrades
    /// independently so one unsupported schema does not hide the other.
    async fn collect_groups(
        &self,
        ldap: &mut Ldap,
        username: &str,
    ) -> Result<Vec<String>, DirectoryError> {
        self.service_bind(ldap).await?;

        let mut groups: Vec<String> = Vec::new();

        match self.search_membership_groups(ldap, username).await {
            Ok(names) => {
                for name in names {
                    if !groups.contains(&name) {
                        groups.push(name);
                    }
                }
            }
            Err(e) => warn!(username, error = %e, "group membership search failed"),
        }

        match self.search_member_of(ldap, username).await {
            Ok(names) => {
                for name in names {
                    if !groups.contains(&name) {
                        groups.push(name);
                    }
                }
            }
            Err(e) => warn!(username, error = %e, "memberOf search failed"),
        }

        Ok(groups)
    }

    /// Groups that list the user in their membership attribute.
    async fn search_membership_groups(
        &self,
        ldap: &mut Ldap,
        username: &str,
    ) -> Result<Vec<String>, DirectoryError> {
        let filter = group_filter(username);
        let search = self
            .timed(ldap.search(
                &self.settings.base_dn,
                Scope::Subtree,
                &filter,
                vec![GROUP_NAME_ATTR],
            ))
            .await?;
        let (entries, _) = search.success()?;

        Ok(entries
            .into_iter()
            .map(SearchEntry::construct)
            .filter_map(|entry| first_attr(&entry, GROUP_NAME_ATTR))
            .collect())
    }

    /// The user entry's own memberOf back-references.
    async fn search_member_of(
        &self,
        ldap: &mut Ldap,
        username: &str,
    ) -> Result<Vec<String>, DirectoryError> {
        let filter = user_filter(username);
        let search = self
            .timed(ldap.search(
                &self.settings.base_dn,
                Scope::Subtree,
                &filter,
                vec![MEMBER_OF_ATTR],
            ))
            .await?;
        let (entries, _) = search.success()?;

        let mut names = Vec::new();
        if let Some(entry) = entries.into_iter().next() {
            let entry = SearchEntry::construct(entry);
            if let Some(dns) = entry.attrs.get(MEMBER_OF_ATTR) {
                for dn in dns {
                    if let Some(name) = group_cn(dn) {
                        names.push(name);
                    }
                }
            }
        }
        Ok(names)
    }
}

#[async_trait]
impl Directory for LdapClient {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<DirectoryUser, DirectoryError> {
        self.settings.validate()?;

        // An empty password would be sent as an anonymous bind, which most
        // servers accept. That must never count as a credential check.
        if password.is_empty() {
            return Err(DirectoryError::InvalidCredentials);
        }

        let mut ldap = self.connect().await?;
        let verified = self.verify_credentials(&mut ldap, username, password).await;
        if let Err(e) = ldap.unbind().await {
            warn!(error = %e, "directory unbind failed");
        }
        let mut user = verified?;

        // Group resolution is best-effort: a fault here degrades to an empty
        // set and the caller falls back to its default role.
        user.groups = groups_or_empty(username, self.member_groups(username).await);

        debug!(username, groups = user.groups.len(), "directory authentication succeeded");
        Ok(user)
    }

    async fn member_groups(&self, username: &str) -> Result<Vec<String>, DirectoryError> {
        self.settings.validate()?;

        let mut ldap = self.connect().await?;
        let outcome = self.collect_groups(&mut ldap, username).await;
        if let Err(e) = ldap.unbind().await {
            warn!(error = %e, "directory unbind failed");
        }
        outcome
    }
}

/// Degrade a failed group lookup to an empty set so authentication can still
/// succeed and the caller can apply its default-role policy.
fn groups_or_empty(
    username: &str,
    lookup: Result<Vec<String>, DirectoryError>,
) -> Vec<String> {
    match lookup {
        Ok(groups) => groups,
        Err(e) => {
            warn!(username, error = %e, "group lookup failed, continuing with no groups");
            Vec::new()
        }
    }
}

/// Build the user search filter, escaping the username for safe embedding.
fn user_filter(username: &str) -> String {
    format!("(uid={})", ldap_escape(username))
}

/// Build the group membership filter for the posixGroup schema.
fn group_filter(username: &str) -> String {
    format!(
        "(&(objectClass=posixGroup)(memberUid={}))",
        ldap_escape(username)
    )
}

/// First value of an attribute, if present.
fn first_attr(entry: &SearchEntry, attr: &str) -> Option<String> {
    entry.attrs.get(attr).and_then(|values| values.first().cloned())
}

/// Build a [`DirectoryUser`] from a search entry. Missing attributes become
/// empty strings; the username falls back to the requested one so the join
/// key for account reconciliation is never empty.
fn user_from_entry(entry: &SearchEntry, requested_username: &str) -> DirectoryUser {
    let display_name = first_attr(entry, "cn").unwrap_or_default();
    let mut given_name = first_attr(entry, "givenName").unwrap_or_default();
    let mut family_name = first_attr(entry, "sn").unwrap_or_default();

    // Entries without explicit name attributes carry only a display name.
    if given_name.is_empty() && family_name.is_empty() && !display_name.is_empty() {
        match display_name.split_once(' ') {
            Some((given, family)) => {
                given_name = given.to_string();
                family_name = family.to_string();
            }
            None => given_name = display_name.clone(),
        }
    }

    DirectoryUser {
        username: first_attr(entry, "uid").unwrap_or_else(|| requested_username.to_string()),
        email: first_attr(entry, "mail").unwrap_or_default(),
        given_name,
        family_name,
        dn: entry.dn.clone(),
        groups: Vec::new(),
    }
}

/// Extract the `cn` component from a group DN, case-insensitively.
fn group_cn(dn: &str) -> Option<String> {
    dn.split(',').find_map(|component| {
        let (key, value) = component.trim().split_once('=')?;
        if key.eq_ignore_ascii_case("cn") {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::*;

    fn client(timeout_secs: u64) -> LdapClient {
        LdapClient::new(LdapSettings {
            host: "localhost".to_string(),
            base_dn: "dc=example,dc=com".to_string(),
            bind_dn: "cn=admin,dc=example,dc=com".to_string(),
            bind_password: "admin".to_string(),
            timeout_secs,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_timed_passes_through_ready_results() {
        let outcome = client(5)
            .timed(std::future::ready(Ok::<_, ldap3::LdapError>(7u32)))
            .await;
        assert_eq!(outcome.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_timed_converts_elapsed_to_timeout_error() {
        let outcome = client(0)
            .timed(std::future::pending::<Result<(), ldap3::LdapError>>())
            .await;
        match outcome {
            Err(DirectoryError::Timeout(limit)) => assert_eq!(limit, Duration::from_secs(0)),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_groups_or_empty_passes_lookup_through() {
        let groups = groups_or_empty("alice", Ok(vec!["employees".to_string()]));
        assert_eq!(groups, vec!["employees".to_string()]);
    }

    #[test]
    fn test_groups_or_empty_degrades_on_lookup_failure() {
        let timeout = DirectoryError::Timeout(Duration::from_secs(5));
        assert!(groups_or_empty("alice", Err(timeout)).is_empty());

        let refused = DirectoryError::UserNotFound;
        assert!(groups_or_empty("alice", Err(refused)).is_empty());
    }

    fn entry(dn: &str, attrs: &[(&str, &[&str])]) -> SearchEntry {
        SearchEntry {
            dn: dn.to_string(),
            attrs: attrs
                .iter()
                .map(|(name, values)| {
                    (
                        name.to_string(),
                        values.iter().map(|v| v.to_string()).collect(),
                    )
                })
                .collect(),
            bin_attrs: HashMap::new(),
        }
    }

    #[test]
    fn test_user_filter_plain() {
        assert_eq!(user_filter("alice"), "(uid=alice)");
    }

    #[test]
    fn test_user_filter_escapes_metacharacters() {
        assert_eq!(user_filter("a*lice"), "(uid=a\\2alice)");
        assert_eq!(user_filter("x)(uid=*"), "(uid=x\\29\\28uid=\\2a)");
    }

    #[test]
    fn test_group_filter() {
        assert_eq!(
            group_filter("bob"),
            "(&(objectClass=posixGroup)(memberUid=bob))"
        );
    }

    #[test]
    fn test_group_cn_extraction() {
        assert_eq!(
            group_cn("cn=employees,ou=groups,dc=example,dc=com"),
            Some("employees".to_string())
        );
        assert_eq!(
            group_cn("CN=Office Managers,OU=Groups,DC=corp,DC=local"),
            Some("Office Managers".to_string())
        );
        assert_eq!(group_cn("ou=groups,dc=example,dc=com"), None);
    }

    #[test]
    fn test_user_from_entry_full_attributes() {
        let e = entry(
            "uid=alice,ou=people,dc=example,dc=com",
            &[
                ("uid", &["alice"]),
                ("mail", &["alice@example.com"]),
                ("cn", &["Alice Liddell"]),
                ("givenName", &["Alice"]),
                ("sn", &["Liddell"]),
            ],
        );
        let user = user_from_entry(&e, "alice");
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.given_name, "Alice");
        assert_eq!(user.family_name, "Liddell");
        assert_eq!(user.dn, "uid=alice,ou=people,dc=example,dc=com");
        assert!(user.groups.is_empty());
    }

    #[test]
    fn test_user_from_entry_splits_display_name() {
        let e = entry(
            "uid=bob,ou=people,dc=example,dc=com",
            &[("uid", &["bob"]), ("cn", &["Bob Builder"])],
        );
        let user = user_from_entry(&e, "bob");
        assert_eq!(user.given_name, "Bob");
        assert_eq!(user.family_name, "Builder");
    }

    #[test]
    fn test_user_from_entry_single_word_display_name() {
        let e = entry(
            "uid=plato,ou=people,dc=example,dc=com",
            &[("uid", &["plato"]), ("cn", &["Plato"])],
        );
        let user = user_from_entry(&e, "plato");
        assert_eq!(user.given_name, "Plato");
        assert_eq!(user.family_name, "");
    }

    #[test]
    fn test_user_from_entry_missing_uid_falls_back() {
        let e = entry("cn=ghost,ou=people,dc=example,dc=com", &[]);
        let user = user_from_entry(&e, "ghost");
        assert_eq!(user.username, "ghost");
        assert_eq!(user.email, "");
    }
}
