//! Push fan-out: recipient resolution and payload assembly for the
//! delivery collaborator.
//!
//! # Responsibility
//! - Resolve the parent recipient set of a persisted notification from
//!   the directory graph.
//!
//! # Invariants
//! - A direct student target takes precedence over a class target; the
//!   class fan-out runs only when no student is set.
//! - Recipient lists are ascending by user id and hold parents only.
//! - Delivery is fire-and-forget: gateway failures are logged by the
//!   caller and never surface to the notification creator.

use crate::model::notification::{Notification, NotificationId, NotificationKind};
use crate::model::user::UserId;
use crate::model::ClassId;
use crate::repo::directory_repo::DirectoryRepository;
use crate::service::{ServiceError, ServiceResult};
use crate::time::format_push;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Delivery failure reported by a [`PushGateway`].
#[derive(Debug)]
pub struct PushError(pub String);

impl Display for PushError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "push delivery failed: {}", self.0)
    }
}

impl Error for PushError {}

/// Wire payload handed to the delivery collaborator. Timestamps use the
/// collaborator's `%Y-%m-%d %H:%M:%S` format, not the storage format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PushPayload {
    pub notification_id: NotificationId,
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub kind: NotificationKind,
    pub date: String,
    pub created_at: String,
    pub target_student: Option<UserId>,
    pub target_class: Option<ClassId>,
    pub recipients: Vec<UserId>,
}

/// Outbound delivery seam. Implementations carry the transport (FCM
/// relay, test double); the core only assembles payloads.
pub trait PushGateway {
    fn deliver(&self, payload: &PushPayload) -> Result<(), PushError>;
}

impl<G: PushGateway + ?Sized> PushGateway for &G {
    fn deliver(&self, payload: &PushPayload) -> Result<(), PushError> {
        (**self).deliver(payload)
    }
}

/// Resolves the parent recipients of one notification.
///
/// Unreachable for persisted records, which always carry a target; kept
/// as a typed Internal error rather than a panic.
pub fn resolve_push_recipients(
    directory: &impl DirectoryRepository,
    notification: &Notification,
) -> ServiceResult<Vec<UserId>> {
    if let Some(student_id) = notification.target_student {
        let parents = directory.parents_of(student_id)?;
        return Ok(parents.into_iter().map(|parent| parent.id).collect());
    }
    if let Some(class_id) = notification.target_class {
        return Ok(directory.class_parent_ids(class_id)?);
    }
    Err(ServiceError::Internal(format!(
        "notification {} has no target for push fan-out",
        notification.id
    )))
}

/// Assembles the delivery payload for one notification.
pub fn build_push_payload(notification: &Notification, recipients: Vec<UserId>) -> PushPayload {
    PushPayload {
        notification_id: notification.id,
        owner: notification.owner,
        title: notification.title.clone(),
        description: notification.description.clone(),
        kind: notification.kind,
        date: format_push(notification.date),
        created_at: format_push(notification.created_at),
        target_student: notification.target_student,
        target_class: notification.target_class,
        recipients,
    }
}
