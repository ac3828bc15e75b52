//! Notification model.
//!
//! # Responsibility
//! - Define the immutable notification record and the draft accepted by
//!   the dispatch gate.
//!
//! # Invariants
//! - `target_student.is_some() || target_class.is_some()` for every
//!   persisted notification (both may be set; dual targeting is allowed).
//! - `owner` is always the creating principal, never client-supplied.
//! - Notifications are immutable after creation.

use crate::model::user::UserId;
use crate::model::{ClassId, SubjectId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable notification identifier.
pub type NotificationId = i64;

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NotificationKind {
    Generic,
    Exam,
    Task,
    Attendance,
}

impl Default for NotificationKind {
    fn default() -> Self {
        Self::Generic
    }
}

pub(crate) fn kind_to_db(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Generic => "GENERIC",
        NotificationKind::Exam => "EXAM",
        NotificationKind::Task => "TASK",
        NotificationKind::Attendance => "ATTENDANCE",
    }
}

pub(crate) fn parse_kind(value: &str) -> Option<NotificationKind> {
    match value {
        "GENERIC" => Some(NotificationKind::Generic),
        "EXAM" => Some(NotificationKind::Exam),
        "TASK" => Some(NotificationKind::Task),
        "ATTENDANCE" => Some(NotificationKind::Attendance),
        _ => None,
    }
}

/// Persisted notification record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    /// Creation instant, set by the gate.
    pub created_at: DateTime<Utc>,
    /// Logical date the notification is about (exam day, task deadline).
    pub date: DateTime<Utc>,
    pub target_student: Option<UserId>,
    pub target_class: Option<ClassId>,
    pub subject: Option<SubjectId>,
    pub kind: NotificationKind,
    /// Free-form structured metadata, stored and returned verbatim.
    pub custom_fields: serde_json::Value,
    pub icon: Option<String>,
}

/// Client-supplied fields for notification creation.
///
/// Reference ids arrive as raw wire strings; the dispatch gate owns
/// parsing them (non-integer values are client errors) and resolving them
/// against the directory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Logical date in the wire timestamp format.
    pub date: String,
    #[serde(default)]
    pub kind: NotificationKind,
    #[serde(default)]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub target_student_id: Option<String>,
    #[serde(default)]
    pub target_class_id: Option<String>,
    #[serde(default)]
    pub custom_fields: Option<serde_json::Value>,
    #[serde(default)]
    pub icon: Option<String>,
}
