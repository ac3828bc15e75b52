//! Core domain logic for SchoolHub, a school-management backend.
//! This crate is the single source of truth for role-scoped visibility,
//! query filtering, notification dispatch and the conversation index.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod time;

pub use config::CoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::message::{conversation_key, Message, MessageId};
pub use model::notification::{Notification, NotificationDraft, NotificationId, NotificationKind};
pub use model::user::{Principal, Role, User, UserId};
pub use model::{ClassId, SubjectId};
pub use repo::directory_repo::{DirectoryRepository, SqliteDirectoryRepository};
pub use repo::message_repo::{MessageStore, SqliteMessageStore};
pub use repo::notification_repo::{NotificationRepository, SqliteNotificationRepository};
pub use repo::{RepoError, RepoResult};
pub use service::chat_service::ChatService;
pub use service::directory_service::DirectoryService;
pub use service::notification_service::NotificationService;
pub use service::provisioning::ProvisioningService;
pub use service::push::{build_push_payload, resolve_push_recipients, PushGateway, PushPayload};
pub use service::visibility::{
    notification_scope, subject_scope, user_scope, NotificationScope, SubjectScope, UserScope,
};
pub use service::{ServiceError, ServiceResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
