//! User and principal model.
//!
//! # Responsibility
//! - Define the user record, the role membership set and the
//!   authenticated `Principal` derived from it.
//! - Own the deterministic role precedence rule.
//!
//! # Invariants
//! - `email` is unique and doubles as the login identity.
//! - A user may hold several role memberships, but a principal always
//!   resolves to exactly one effective role:
//!   Admin > Teacher > Parent > Student.

use crate::model::ClassId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable user identifier.
pub type UserId = i64;

/// Visibility role. Stored as a membership set per user, resolved to a
/// single effective role for every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Teacher,
    Student,
    Parent,
}

impl Role {
    /// Lower value wins when a user holds several memberships.
    fn precedence(self) -> u8 {
        match self {
            Self::Admin => 0,
            Self::Teacher => 1,
            Self::Parent => 2,
            Self::Student => 3,
        }
    }

    /// Picks the effective role from a membership set.
    ///
    /// Returns `None` for users with no role; such principals see nothing.
    pub fn primary(roles: &[Role]) -> Option<Role> {
        roles.iter().copied().min_by_key(|role| role.precedence())
    }
}

pub(crate) fn role_to_db(role: Role) -> &'static str {
    match role {
        Role::Admin => "ADMIN",
        Role::Teacher => "TEACHER",
        Role::Student => "STUDENT",
        Role::Parent => "PARENT",
    }
}

pub(crate) fn parse_role(value: &str) -> Option<Role> {
    match value {
        "ADMIN" => Some(Role::Admin),
        "TEACHER" => Some(Role::Teacher),
        "STUDENT" => Some(Role::Student),
        "PARENT" => Some(Role::Parent),
        _ => None,
    }
}

/// Canonical user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// Soft lifecycle flag; inactive users stay on record.
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    /// Role membership set, sorted by precedence.
    pub roles: Vec<Role>,
    /// Students only: the class this user attends.
    pub attends: Option<ClassId>,
}

impl User {
    /// Effective role under the documented precedence order.
    pub fn primary_role(&self) -> Option<Role> {
        Role::primary(&self.roles)
    }
}

/// The authenticated identity issuing a request.
///
/// Supplied by the external credential service; this core trusts it
/// completely and performs no credential validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    /// Effective role, or `None` for principals without any membership.
    pub role: Option<Role>,
}

impl Principal {
    /// Builds a principal from an authenticated identity and its
    /// membership set, applying the precedence rule.
    pub fn resolve(user_id: UserId, roles: &[Role]) -> Self {
        Self {
            user_id,
            role: Role::primary(roles),
        }
    }

    /// Builds a principal from a loaded user record.
    pub fn for_user(user: &User) -> Self {
        Self::resolve(user.id, &user.roles)
    }
}

#[cfg(test)]
mod tests {
    use super::{Principal, Role};

    #[test]
    fn precedence_order_is_admin_teacher_parent_student() {
        assert_eq!(
            Role::primary(&[Role::Student, Role::Parent, Role::Teacher, Role::Admin]),
            Some(Role::Admin)
        );
        assert_eq!(
            Role::primary(&[Role::Parent, Role::Teacher]),
            Some(Role::Teacher)
        );
        assert_eq!(
            Role::primary(&[Role::Student, Role::Parent]),
            Some(Role::Parent)
        );
        assert_eq!(Role::primary(&[Role::Student]), Some(Role::Student));
    }

    #[test]
    fn empty_membership_resolves_to_no_role() {
        assert_eq!(Role::primary(&[]), None);
        let principal = Principal::resolve(7, &[]);
        assert_eq!(principal.role, None);
    }
}
