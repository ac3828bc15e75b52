//! Class, subject, teaching assignment and schedule records.
//!
//! Leaf data model of the directory graph; relationship traversal lives in
//! the repository layer as indexed adjacency queries.

use crate::model::user::UserId;
use crate::model::{AssignmentId, ClassId, SubjectId};
use serde::Serialize;

/// A school class. `name` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Class {
    pub id: ClassId,
    pub name: String,
}

/// A taught subject. `name` is unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
}

/// "This teacher teaches this subject in this class."
/// The triple is unique per combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeachingAssignment {
    pub id: AssignmentId,
    pub teacher_id: UserId,
    pub subject_id: SubjectId,
    pub class_id: ClassId,
}

/// School day for schedule entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

pub(crate) fn weekday_to_db(day: Weekday) -> &'static str {
    match day {
        Weekday::Monday => "MONDAY",
        Weekday::Tuesday => "TUESDAY",
        Weekday::Wednesday => "WEDNESDAY",
        Weekday::Thursday => "THURSDAY",
        Weekday::Friday => "FRIDAY",
    }
}

pub(crate) fn parse_weekday(value: &str) -> Option<Weekday> {
    match value {
        "MONDAY" => Some(Weekday::Monday),
        "TUESDAY" => Some(Weekday::Tuesday),
        "WEDNESDAY" => Some(Weekday::Wednesday),
        "THURSDAY" => Some(Weekday::Thursday),
        "FRIDAY" => Some(Weekday::Friday),
        _ => None,
    }
}

/// One slot in a teacher's weekly schedule. Read-only projection; unique
/// per (day, starts_at, slot_order, assignment).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub id: i64,
    pub assignment_id: AssignmentId,
    pub day: Weekday,
    /// Wall-clock start as `HH:MM`.
    pub starts_at: String,
    /// Slot position within the day, 1..=10.
    pub slot_order: u8,
}
