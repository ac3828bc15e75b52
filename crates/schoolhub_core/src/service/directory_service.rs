//! Directory use cases: contacts, user retrieval, classes, subjects and
//! the teaching schedule.
//!
//! # Responsibility
//! - Gate every single-user read on the principal's visible set; records
//!   outside it are indistinguishable from missing ones.
//! - Assemble the nested class and profile projections from the
//!   directory graph.
//!
//! # Invariants
//! - Self-retrieval bypasses the scope gate; everything else goes
//!   through it.
//! - The class roster and subject projections are visible to any
//!   authenticated principal; the contact list is not.

use crate::model::directory::{Class, Subject};
use crate::model::user::{Principal, User, UserId};
use crate::model::ClassId;
use crate::repo::directory_repo::{AssignmentDetail, DirectoryRepository, ScheduleSlot};
use crate::service::filters::parse_id_param;
use crate::service::visibility::{subject_scope, user_scope};
use crate::service::{ServiceError, ServiceResult};
use log::debug;
use serde::Serialize;

/// The authenticated principal's own profile projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthProfile {
    pub user: User,
    /// Subjects studied; empty for non-students.
    pub subjects: Vec<Subject>,
    /// Attendance class; students only.
    pub attends_class: Option<Class>,
    /// Linked children; empty for non-parents.
    pub children: Vec<User>,
}

/// One roster entry of a class projection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentDetail {
    pub user: User,
    pub subjects: Vec<Subject>,
}

/// A class with its nested roster and teaching assignments.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDetail {
    pub class: Class,
    pub students: Vec<StudentDetail>,
    pub assignments: Vec<AssignmentDetail>,
}

/// Facade over the directory graph.
pub struct DirectoryService<D> {
    directory: D,
}

impl<D> DirectoryService<D>
where
    D: DirectoryRepository,
{
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// The principal's contact list, ascending id order.
    pub fn list_users(&self, principal: &Principal, no_students: bool) -> ServiceResult<Vec<User>> {
        let users = self
            .directory
            .list_users(&user_scope(principal, no_students))?;
        debug!(
            "event=user_list module=service status=ok principal={} count={}",
            principal.user_id,
            users.len()
        );
        Ok(users)
    }

    /// Retrieves one user through the principal's visible set. Retrieving
    /// oneself always succeeds.
    pub fn get_user(&self, principal: &Principal, id: UserId) -> ServiceResult<User> {
        self.require_visible(principal, id)?;
        self.directory
            .get_user(id)?
            .ok_or(ServiceError::NotFound { entity: "user", id })
    }

    /// Parents of one visible user, ascending id order.
    pub fn user_parents(&self, principal: &Principal, id: UserId) -> ServiceResult<Vec<User>> {
        self.require_visible(principal, id)?;
        Ok(self.directory.parents_of(id)?)
    }

    /// The principal's own profile with nested relationship detail.
    pub fn profile(&self, principal: &Principal) -> ServiceResult<AuthProfile> {
        let user = self
            .directory
            .get_user(principal.user_id)?
            .ok_or(ServiceError::NotFound {
                entity: "user",
                id: principal.user_id,
            })?;
        let subjects = self.directory.subjects_of_student(user.id)?;
        let attends_class = match user.attends {
            Some(class_id) => self.directory.get_class(class_id)?,
            None => None,
        };
        let children = self.directory.children_of(user.id)?;
        Ok(AuthProfile {
            user,
            subjects,
            attends_class,
            children,
        })
    }

    pub fn list_classes(&self) -> ServiceResult<Vec<Class>> {
        Ok(self.directory.list_classes()?)
    }

    /// One class with roster and assignments.
    pub fn get_class(&self, id: ClassId) -> ServiceResult<ClassDetail> {
        let class = self
            .directory
            .get_class(id)?
            .ok_or(ServiceError::NotFound { entity: "class", id })?;
        let mut students = Vec::new();
        for user in self.directory.class_students(id)? {
            let subjects = self.directory.subjects_of_student(user.id)?;
            students.push(StudentDetail { user, subjects });
        }
        let assignments = self.directory.class_assignments(id)?;
        Ok(ClassDetail {
            class,
            students,
            assignments,
        })
    }

    /// Subjects visible to the principal, optionally intersected with the
    /// subjects taught in one class. The class id arrives as a wire
    /// string and must reference an existing class.
    pub fn list_subjects(
        &self,
        principal: &Principal,
        class_param: Option<&str>,
    ) -> ServiceResult<Vec<Subject>> {
        let class_filter = class_param
            .map(|raw| parse_id_param("class", raw))
            .transpose()?;
        if let Some(class_id) = class_filter {
            if !self.directory.class_exists(class_id)? {
                return Err(ServiceError::NotFound {
                    entity: "class",
                    id: class_id,
                });
            }
        }
        Ok(self
            .directory
            .list_subjects(&subject_scope(principal), class_filter)?)
    }

    /// The principal's own teaching schedule. Empty for principals
    /// without assignments; no admin or parent path exists.
    pub fn schedule(&self, principal: &Principal) -> ServiceResult<Vec<ScheduleSlot>> {
        Ok(self.directory.schedule_for_teacher(principal.user_id)?)
    }

    fn require_visible(&self, principal: &Principal, id: UserId) -> ServiceResult<()> {
        if id == principal.user_id {
            return Ok(());
        }
        let scope = user_scope(principal, false);
        if self.directory.user_in_scope(&scope, id)? {
            Ok(())
        } else {
            Err(ServiceError::NotFound { entity: "user", id })
        }
    }
}
