//! Directory-group to local-role mapping

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Static group-to-role mapping, loaded once at startup and shared
/// read-only across authentication attempts.
///
/// Groups without an entry are ignored. A group set that yields no mapped
/// role resolves to the single default role so an account is never left
/// without one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleMapping {
    #[serde(default)]
    pub mappings: HashMap<String, String>,

    #[serde(default = "default_role")]
    pub default_role: String,
}

fn default_role() -> String {
    "Employee".to_string()
}

impl Default for RoleMapping {
    fn default() -> Self {
        Self {
            mappings: HashMap::new(),
            default_role: default_role(),
        }
    }
}

impl RoleMapping {
    pub fn new(mappings: HashMap<String, String>, default_role: impl Into<String>) -> Self {
        Self {
            mappings,
            default_role: default_role.into(),
        }
    }

    pub fn with_mapping(mut self, group: impl Into<String>, role: impl Into<String>) -> Self {
        self.mappings.insert(group.into(), role.into());
        self
    }

    /// Resolve a group set to the target role set, deduplicated in
    /// first-sighting order.
    pub fn resolve(&self, groups: &[String]) -> Vec<String> {
        let mut roles: Vec<String> = Vec::new();
        for group in groups {
            if let Some(role) = self.mappings.get(group) {
                if !roles.contains(role) {
                    roles.push(role.clone());
                }
            }
        }
        if roles.is_empty() {
            roles.push(self.default_role.clone());
        }
        roles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapping() -> RoleMapping {
        RoleMapping::default()
            .with_mapping("employees", "Employee")
            .with_mapping("office-managers", "OfficeManager")
    }

    #[test]
    fn test_resolve_maps_known_groups() {
        let roles = mapping().resolve(&["employees".to_string()]);
        assert_eq!(roles, vec!["Employee".to_string()]);
    }

    #[test]
    fn test_resolve_ignores_unmapped_groups() {
        let roles = mapping().resolve(&[
            "employees".to_string(),
            "coffee-club".to_string(),
        ]);
        assert_eq!(roles, vec!["Employee".to_string()]);
    }

    #[test]
    fn test_resolve_deduplicates() {
        let m = mapping().with_mapping("staff", "Employee");
        let roles = m.resolve(&["employees".to_string(), "staff".to_string()]);
        assert_eq!(roles, vec!["Employee".to_string()]);
    }

    #[test]
    fn test_empty_group_set_falls_back_to_default() {
        assert_eq!(mapping().resolve(&[]), vec!["Employee".to_string()]);
    }

    #[test]
    fn test_unmapped_only_groups_fall_back_to_default() {
        let roles = mapping().resolve(&["coffee-club".to_string()]);
        assert_eq!(roles, vec!["Employee".to_string()]);
    }

    #[test]
    fn test_custom_default_role() {
        let m = RoleMapping::new(HashMap::new(), "Guest");
        assert_eq!(m.resolve(&[]), vec!["Guest".to_string()]);
    }
}
