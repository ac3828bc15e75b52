//! Domain model for the school directory, notifications and messaging.
//!
//! # Responsibility
//! - Define the canonical records used by core business logic.
//! - Keep identity types explicit in signatures.
//!
//! # Invariants
//! - Every entity is identified by a stable integer id issued by storage.
//! - User email/identity is unique; users are never hard-deleted in normal
//!   operation (soft lifecycle via `is_active`).

pub mod directory;
pub mod message;
pub mod notification;
pub mod user;

/// Stable class identifier.
pub type ClassId = i64;
/// Stable subject identifier.
pub type SubjectId = i64;
/// Stable teaching assignment identifier.
pub type AssignmentId = i64;
