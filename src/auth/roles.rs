// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Roles and the authority strings they are stored as.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Authority granted to every account.
pub const ROLE_USER: &str = "ROLE_USER";

/// Authority granted to administrators.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// User roles for authorization.
///
/// ## Role Hierarchy
///
/// - `Admin` - Full access, including other users' accounts
/// - `User` - Normal signed-in user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    /// Authority string carried in tokens and accounts.
    pub fn authority(&self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::User => ROLE_USER,
        }
    }

    /// Parse an authority string.
    pub fn from_authority(authority: &str) -> Option<Role> {
        match authority {
            ROLE_ADMIN => Some(Role::Admin),
            ROLE_USER => Some(Role::User),
            _ => None,
        }
    }

    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            (Role::Admin, _) => true,
            (Role::User, Role::User) => true,
            _ => false,
        }
    }

    /// Whether any authority in `authorities` grants `self`.
    pub fn granted_by(&self, authorities: &BTreeSet<String>) -> bool {
        authorities
            .iter()
            .filter_map(|a| Role::from_authority(a))
            .any(|role| role.has_privilege(*self))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.authority())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn admin_has_all_privileges() {
        assert!(Role::Admin.has_privilege(Role::Admin));
        assert!(Role::Admin.has_privilege(Role::User));
        assert!(!Role::User.has_privilege(Role::Admin));
    }

    #[test]
    fn authority_round_trip() {
        assert_eq!(Role::from_authority("ROLE_ADMIN"), Some(Role::Admin));
        assert_eq!(Role::from_authority("ROLE_USER"), Some(Role::User));
        assert_eq!(Role::from_authority("role_admin"), None);
        assert_eq!(Role::Admin.to_string(), "ROLE_ADMIN");
    }

    #[test]
    fn granted_by_checks_hierarchy() {
        assert!(Role::User.granted_by(&set(&["ROLE_ADMIN"])));
        assert!(!Role::Admin.granted_by(&set(&["ROLE_USER", "ROLE_AUDITOR"])));
        assert!(!Role::User.granted_by(&set(&[])));
    }
}
