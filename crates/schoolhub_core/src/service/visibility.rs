//! Visibility resolver: principal -> role-derived base set.
//!
//! # Responsibility
//! - Map an authenticated principal to the scope predicate for each
//!   entity kind. Scopes are compiled to SQL by the repositories, so the
//!   base set composes with secondary filters without loading records.
//!
//! # Invariants
//! - Resolution is pure: no storage access, fully determined by
//!   `(principal, entity kind)`.
//! - Principals without a recognized role resolve to the empty scope for
//!   every entity kind; students see nothing anywhere.
//! - A multi-role user acts under exactly one role:
//!   Admin > Teacher > Parent > Student.

use crate::model::user::{Principal, Role};

pub use crate::repo::directory_repo::{SubjectScope, UserScope};
pub use crate::repo::notification_repo::NotificationScope;

/// Base set rule for notifications.
///
/// - Admin: everything.
/// - Teacher: own notifications only, even for their own classes.
/// - Parent: notifications to their children or their children's classes.
/// - Student / no role: nothing.
pub fn notification_scope(principal: &Principal) -> NotificationScope {
    match principal.role {
        Some(Role::Admin) => NotificationScope::All,
        Some(Role::Teacher) => NotificationScope::OwnedBy(principal.user_id),
        Some(Role::Parent) => NotificationScope::ParentOf(principal.user_id),
        Some(Role::Student) | None => NotificationScope::Empty,
    }
}

/// Base set rule for the user directory.
///
/// `no_students` additionally drops the student arm of the reach (or, for
/// admins, anyone holding the Student role).
pub fn user_scope(principal: &Principal, no_students: bool) -> UserScope {
    match principal.role {
        Some(Role::Admin) => UserScope::AdminAll {
            except: principal.user_id,
            no_students,
        },
        Some(Role::Teacher) => UserScope::TeacherReach {
            teacher: principal.user_id,
            no_students,
        },
        Some(Role::Parent) => UserScope::ParentReach {
            parent: principal.user_id,
            no_students,
        },
        Some(Role::Student) | None => UserScope::Empty,
    }
}

/// Base set rule for the subjects view.
pub fn subject_scope(principal: &Principal) -> SubjectScope {
    match principal.role {
        Some(Role::Admin) => SubjectScope::All,
        Some(Role::Teacher) => SubjectScope::TaughtBy(principal.user_id),
        Some(Role::Parent) | Some(Role::Student) | None => SubjectScope::Empty,
    }
}
