//! Notification use cases: scoped listing, scoped retrieval and the
//! dispatch gate.
//!
//! # Responsibility
//! - Run every read through the visibility resolver before the filter
//!   pipeline.
//! - Validate drafts in the documented sequence, persist them and hand
//!   the result to the push gateway fire-and-forget.
//!
//! # Invariants
//! - `owner` is the creating principal; the draft cannot claim one.
//! - A delivery failure never fails the create call.
//! - Retrieval outside the caller's scope is NotFound, never Forbidden.

use crate::model::notification::{Notification, NotificationDraft, NotificationId};
use crate::model::user::Principal;
use crate::repo::directory_repo::DirectoryRepository;
use crate::repo::notification_repo::{
    NewNotification, NotificationListQuery, NotificationRepository, StudentTargetFilter,
};
use crate::service::filters::{parse_id_param, NotificationQuery};
use crate::service::push::{build_push_payload, resolve_push_recipients, PushGateway};
use crate::service::visibility::notification_scope;
use crate::service::{ServiceError, ServiceResult};
use chrono::Utc;
use log::{debug, warn};

/// Facade over the notification store, the directory graph and the push
/// delivery seam.
pub struct NotificationService<N, D, P> {
    notifications: N,
    directory: D,
    push: P,
}

impl<N, D, P> NotificationService<N, D, P>
where
    N: NotificationRepository,
    D: DirectoryRepository,
    P: PushGateway,
{
    pub fn new(notifications: N, directory: D, push: P) -> Self {
        Self {
            notifications,
            directory,
            push,
        }
    }

    /// Lists notifications visible to the principal, narrowed by the
    /// parsed filter pipeline.
    pub fn list(
        &self,
        principal: &Principal,
        query: &NotificationQuery,
    ) -> ServiceResult<Vec<Notification>> {
        let filters = query.parse()?;
        let mut list_query = NotificationListQuery::for_scope(notification_scope(principal));

        if let Some(student_id) = filters.student {
            let student =
                self.directory
                    .get_user(student_id)?
                    .ok_or(ServiceError::NotFound {
                        entity: "user",
                        id: student_id,
                    })?;
            list_query.student = Some(StudentTargetFilter {
                student_id,
                attends: student.attends,
            });
        }

        if let Some(subject_id) = filters.subject {
            if !self.directory.subject_exists(subject_id)? {
                return Err(ServiceError::NotFound {
                    entity: "subject",
                    id: subject_id,
                });
            }
            list_query.subject = Some(subject_id);
        }

        list_query.kind = filters.kind;
        list_query.from_date = filters.from_date;
        list_query.to_date = filters.to_date;
        list_query.size = filters.size;

        let notifications = self.notifications.list(&list_query)?;
        debug!(
            "event=notification_list module=service status=ok principal={} count={}",
            principal.user_id,
            notifications.len()
        );
        Ok(notifications)
    }

    /// Retrieves one notification through the principal's scope.
    pub fn get(&self, principal: &Principal, id: NotificationId) -> ServiceResult<Notification> {
        self.notifications
            .get_in_scope(&notification_scope(principal), id)?
            .ok_or(ServiceError::NotFound {
                entity: "notification",
                id,
            })
    }

    /// Dispatch gate: validates the draft, persists it and triggers the
    /// push fan-out.
    pub fn create(
        &self,
        principal: &Principal,
        draft: &NotificationDraft,
    ) -> ServiceResult<Notification> {
        if draft.title.trim().is_empty() {
            return Err(ServiceError::BadRequest(
                "notification title must not be empty".to_string(),
            ));
        }

        // Reference ids arrive as wire strings; non-integer values are
        // client errors before any lookup happens.
        let subject = draft
            .subject_id
            .as_deref()
            .map(|raw| parse_id_param("subject", raw))
            .transpose()?;
        let target_student = draft
            .target_student_id
            .as_deref()
            .map(|raw| parse_id_param("student", raw))
            .transpose()?;
        let target_class = draft
            .target_class_id
            .as_deref()
            .map(|raw| parse_id_param("class", raw))
            .transpose()?;

        let date = crate::time::parse_utc(&draft.date)
            .map_err(|err| ServiceError::BadRequest(format!("invalid date: {err}")))?;

        if let Some(subject_id) = subject {
            if !self.directory.subject_exists(subject_id)? {
                return Err(ServiceError::NotFound {
                    entity: "subject",
                    id: subject_id,
                });
            }
        }
        if let Some(student_id) = target_student {
            if self.directory.get_user(student_id)?.is_none() {
                return Err(ServiceError::NotFound {
                    entity: "user",
                    id: student_id,
                });
            }
        }
        if let Some(class_id) = target_class {
            if !self.directory.class_exists(class_id)? {
                return Err(ServiceError::NotFound {
                    entity: "class",
                    id: class_id,
                });
            }
        }

        // Dual targeting is allowed; zero targets is not.
        if target_student.is_none() && target_class.is_none() {
            return Err(ServiceError::BadRequest(
                "notification must target a student or a class".to_string(),
            ));
        }

        let record = NewNotification {
            owner: principal.user_id,
            title: draft.title.clone(),
            description: draft.description.clone(),
            created_at: Utc::now(),
            date,
            target_student,
            target_class,
            subject,
            kind: draft.kind,
            custom_fields: draft
                .custom_fields
                .clone()
                .unwrap_or_else(|| serde_json::json!({})),
            icon: draft.icon.clone(),
        };

        let id = self.notifications.create(&record)?;
        let notification = self
            .notifications
            .get(id)?
            .ok_or_else(|| ServiceError::Internal(format!("notification {id} vanished after insert")))?;
        debug!(
            "event=notification_create module=service status=ok id={id} owner={}",
            principal.user_id
        );

        self.fan_out(&notification);
        Ok(notification)
    }

    // Fire-and-forget hand-off; failures are logged, never propagated.
    fn fan_out(&self, notification: &Notification) {
        let recipients = match resolve_push_recipients(&self.directory, notification) {
            Ok(recipients) => recipients,
            Err(err) => {
                warn!(
                    "event=push_fan_out module=service status=error id={} error=\"{err}\"",
                    notification.id
                );
                return;
            }
        };
        let payload = build_push_payload(notification, recipients);
        if let Err(err) = self.push.deliver(&payload) {
            warn!(
                "event=push_fan_out module=service status=error id={} error=\"{err}\"",
                notification.id
            );
        }
    }
}
