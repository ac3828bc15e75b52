//! Provisioning surface: the admin/import tooling writes.
//!
//! # Responsibility
//! - Validate inbound identity data before it reaches the directory
//!   graph.
//! - Wrap the repository write surface behind one facade so import
//!   tooling never talks to storage directly.

use crate::model::directory::Weekday;
use crate::model::user::{Role, UserId};
use crate::model::{AssignmentId, ClassId, SubjectId};
use crate::repo::directory_repo::{DirectoryRepository, NewUser};
use crate::service::{ServiceError, ServiceResult};
use chrono::Utc;
use log::info;
use once_cell::sync::Lazy;
use regex::Regex;

// Shape check only; deliverability is the mail system's problem.
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// Facade over the directory write surface.
pub struct ProvisioningService<D> {
    directory: D,
}

impl<D> ProvisioningService<D>
where
    D: DirectoryRepository,
{
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Creates a user with a validated email. Joined-at is the creation
    /// instant.
    pub fn create_user(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
    ) -> ServiceResult<UserId> {
        let email = email.trim();
        if !EMAIL_PATTERN.is_match(email) {
            return Err(ServiceError::BadRequest(format!(
                "invalid email address: `{email}`"
            )));
        }
        let id = self.directory.create_user(&NewUser {
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            date_joined: Utc::now(),
        })?;
        info!("event=user_create module=service status=ok id={id}");
        Ok(id)
    }

    /// Grants a role membership. Idempotent.
    pub fn grant_role(&self, user_id: UserId, role: Role) -> ServiceResult<()> {
        Ok(self.directory.grant_role(user_id, role)?)
    }

    /// Links a child to a parent. Idempotent.
    pub fn link_parent(&self, child_id: UserId, parent_id: UserId) -> ServiceResult<()> {
        Ok(self.directory.link_parent(child_id, parent_id)?)
    }

    /// Sets or clears a student's attendance class.
    pub fn set_attends(&self, student_id: UserId, class_id: Option<ClassId>) -> ServiceResult<()> {
        Ok(self.directory.set_attends(student_id, class_id)?)
    }

    /// Enrolls a student in a subject. Idempotent.
    pub fn add_student_subject(
        &self,
        student_id: UserId,
        subject_id: SubjectId,
    ) -> ServiceResult<()> {
        Ok(self.directory.add_student_subject(student_id, subject_id)?)
    }

    pub fn create_class(&self, name: &str) -> ServiceResult<ClassId> {
        require_name(name, "class")?;
        Ok(self.directory.create_class(name.trim())?)
    }

    pub fn create_subject(&self, name: &str) -> ServiceResult<SubjectId> {
        require_name(name, "subject")?;
        Ok(self.directory.create_subject(name.trim())?)
    }

    pub fn create_assignment(
        &self,
        teacher_id: UserId,
        subject_id: SubjectId,
        class_id: ClassId,
    ) -> ServiceResult<AssignmentId> {
        Ok(self
            .directory
            .create_assignment(teacher_id, subject_id, class_id)?)
    }

    pub fn create_schedule_entry(
        &self,
        assignment_id: AssignmentId,
        day: Weekday,
        starts_at: &str,
        slot_order: u8,
    ) -> ServiceResult<i64> {
        if !(1..=10).contains(&slot_order) {
            return Err(ServiceError::BadRequest(format!(
                "slot order must be between 1 and 10, got {slot_order}"
            )));
        }
        Ok(self
            .directory
            .create_schedule_entry(assignment_id, day, starts_at, slot_order)?)
    }
}

fn require_name(name: &str, entity: &'static str) -> ServiceResult<()> {
    if name.trim().is_empty() {
        return Err(ServiceError::BadRequest(format!(
            "{entity} name must not be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::EMAIL_PATTERN;

    #[test]
    fn email_shape_check_accepts_plain_addresses() {
        for email in ["teacher@school.example", "a.b+c@host.co"] {
            assert!(EMAIL_PATTERN.is_match(email), "{email}");
        }
    }

    #[test]
    fn email_shape_check_rejects_malformed_addresses() {
        for email in ["", "no-at-sign", "two@@signs.example", "user@nodot", "spa ce@x.y"] {
            assert!(!EMAIL_PATTERN.is_match(email), "{email}");
        }
    }
}
