//! Notification repository: persistence plus scope/filter compilation.
//!
//! # Responsibility
//! - Persist immutable notification records.
//! - Compile a `NotificationScope` (role-derived base set) together with
//!   the secondary filters into one SQL statement.
//! - Serve scope-gated single retrieval so records outside the caller's
//!   visible set are indistinguishable from missing ones.
//!
//! # Invariants
//! - Ordering is `date DESC, id ASC` (logical date, stable insertion-order
//!   tie-break).
//! - `from_date` is an inclusive bound, `to_date` a strict exclusive one.
//! - The parent reach predicate never materializes child/class id lists.

use crate::model::notification::{
    kind_to_db, parse_kind, Notification, NotificationId, NotificationKind,
};
use crate::model::user::UserId;
use crate::model::{ClassId, SubjectId};
use crate::repo::{ensure_connection_ready, parse_db_timestamp, RepoError, RepoResult};
use crate::time::format_utc;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    n.id,
    n.owner_id,
    n.title,
    n.description,
    n.created_at,
    n.date,
    n.target_student_id,
    n.target_class_id,
    n.subject_id,
    n.kind,
    n.custom_fields,
    n.icon
FROM notifications n";

const NOTIFICATION_TABLES: &[&str] = &["notifications", "users", "classes", "user_parents"];

/// Role-derived base set for notification queries. An abstract set
/// predicate compiled to SQL, never a materialized record list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationScope {
    All,
    /// Notifications the principal created.
    OwnedBy(UserId),
    /// Notifications targeting one of the principal's children, or the
    /// attendance class of one of them. Union, deduplicated.
    ParentOf(UserId),
    Empty,
}

/// Counterpart filter: notifications aimed at one student, either
/// directly or via the student's attendance class when no direct target
/// is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentTargetFilter {
    pub student_id: UserId,
    pub attends: Option<ClassId>,
}

/// Compiled query over the notification set: scope plus secondary
/// filters, applied in the pipeline's fixed precedence order.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationListQuery {
    pub scope: NotificationScope,
    pub student: Option<StudentTargetFilter>,
    pub subject: Option<SubjectId>,
    pub kind: Option<NotificationKind>,
    /// Inclusive lower bound on the logical date.
    pub from_date: Option<DateTime<Utc>>,
    /// Exclusive upper bound on the logical date.
    pub to_date: Option<DateTime<Utc>>,
    /// Effective size cap; `Some(0)` yields an empty page.
    pub size: Option<u32>,
}

impl NotificationListQuery {
    pub fn for_scope(scope: NotificationScope) -> Self {
        Self {
            scope,
            student: None,
            subject: None,
            kind: None,
            from_date: None,
            to_date: None,
            size: None,
        }
    }
}

/// Validated fields for notification persistence. Target resolution has
/// already happened in the dispatch gate.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub owner: UserId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub date: DateTime<Utc>,
    pub target_student: Option<UserId>,
    pub target_class: Option<ClassId>,
    pub subject: Option<SubjectId>,
    pub kind: NotificationKind,
    pub custom_fields: serde_json::Value,
    pub icon: Option<String>,
}

/// Repository interface for notifications.
pub trait NotificationRepository {
    fn create(&self, notification: &NewNotification) -> RepoResult<NotificationId>;
    /// Unscoped lookup; reserved for internal paths such as push fan-out.
    fn get(&self, id: NotificationId) -> RepoResult<Option<Notification>>;
    /// Scope-gated lookup; returns `None` both for missing records and
    /// records outside the scope.
    fn get_in_scope(
        &self,
        scope: &NotificationScope,
        id: NotificationId,
    ) -> RepoResult<Option<Notification>>;
    fn list(&self, query: &NotificationListQuery) -> RepoResult<Vec<Notification>>;
}

/// SQLite-backed notification repository.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, NOTIFICATION_TABLES)?;
        Ok(Self { conn })
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn create(&self, notification: &NewNotification) -> RepoResult<NotificationId> {
        if notification.target_student.is_none() && notification.target_class.is_none() {
            return Err(RepoError::InvalidData(
                "notification must target a student or a class".to_string(),
            ));
        }

        let custom_fields = serde_json::to_string(&notification.custom_fields)
            .map_err(|err| RepoError::InvalidData(format!("unserializable custom_fields: {err}")))?;

        self.conn.execute(
            "INSERT INTO notifications (
                owner_id,
                title,
                description,
                created_at,
                date,
                target_student_id,
                target_class_id,
                subject_id,
                kind,
                custom_fields,
                icon
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
            params![
                notification.owner,
                notification.title.as_str(),
                notification.description.as_str(),
                format_utc(notification.created_at),
                format_utc(notification.date),
                notification.target_student,
                notification.target_class,
                notification.subject,
                kind_to_db(notification.kind),
                custom_fields,
                notification.icon.as_deref(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get(&self, id: NotificationId) -> RepoResult<Option<Notification>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTIFICATION_SELECT_SQL} WHERE n.id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_notification_row(row)?));
        }
        Ok(None)
    }

    fn get_in_scope(
        &self,
        scope: &NotificationScope,
        id: NotificationId,
    ) -> RepoResult<Option<Notification>> {
        let (predicate, mut bind_values) = compile_notification_scope(scope);
        let sql = format!("{NOTIFICATION_SELECT_SQL} WHERE ({predicate}) AND n.id = ?;");
        bind_values.push(Value::Integer(id));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_notification_row(row)?));
        }
        Ok(None)
    }

    fn list(&self, query: &NotificationListQuery) -> RepoResult<Vec<Notification>> {
        let (predicate, mut bind_values) = compile_notification_scope(&query.scope);
        let mut sql = format!("{NOTIFICATION_SELECT_SQL} WHERE ({predicate})");

        // Secondary filters in pipeline order: counterpart, subject, kind,
        // date range.
        if let Some(student) = &query.student {
            match student.attends {
                Some(class_id) => {
                    sql.push_str(
                        " AND (n.target_student_id = ?
                           OR (n.target_student_id IS NULL AND n.target_class_id = ?))",
                    );
                    bind_values.push(Value::Integer(student.student_id));
                    bind_values.push(Value::Integer(class_id));
                }
                None => {
                    sql.push_str(" AND n.target_student_id = ?");
                    bind_values.push(Value::Integer(student.student_id));
                }
            }
        }

        if let Some(subject_id) = query.subject {
            sql.push_str(" AND n.subject_id = ?");
            bind_values.push(Value::Integer(subject_id));
        }

        if let Some(kind) = query.kind {
            sql.push_str(" AND n.kind = ?");
            bind_values.push(Value::Text(kind_to_db(kind).to_string()));
        }

        if let Some(from_date) = query.from_date {
            sql.push_str(" AND n.date >= ?");
            bind_values.push(Value::Text(format_utc(from_date)));
        }

        if let Some(to_date) = query.to_date {
            // Strict upper bound; a notification dated exactly at to_date
            // is excluded.
            sql.push_str(" AND n.date < ?");
            bind_values.push(Value::Text(format_utc(to_date)));
        }

        sql.push_str(" ORDER BY n.date DESC, n.id ASC");

        if let Some(size) = query.size {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(size)));
        }
        sql.push(';');

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(parse_notification_row(row)?);
        }
        Ok(notifications)
    }
}

/// Compiles a notification scope into a WHERE predicate over alias `n`.
fn compile_notification_scope(scope: &NotificationScope) -> (String, Vec<Value>) {
    match scope {
        NotificationScope::All => ("1 = 1".to_string(), Vec::new()),
        NotificationScope::OwnedBy(owner) => {
            ("n.owner_id = ?".to_string(), vec![Value::Integer(*owner)])
        }
        NotificationScope::ParentOf(parent) => (
            "(
                EXISTS (
                    SELECT 1 FROM user_parents up
                    WHERE up.user_id = n.target_student_id
                      AND up.parent_id = ?
                )
                OR n.target_class_id IN (
                    SELECT child.attends_class_id
                    FROM users child
                    INNER JOIN user_parents up2 ON up2.user_id = child.id
                    WHERE up2.parent_id = ?
                      AND child.attends_class_id IS NOT NULL
                )
            )"
            .to_string(),
            vec![Value::Integer(*parent), Value::Integer(*parent)],
        ),
        NotificationScope::Empty => ("0 = 1".to_string(), Vec::new()),
    }
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let created_at_text: String = row.get("created_at")?;
    let date_text: String = row.get("date")?;
    let kind_text: String = row.get("kind")?;
    let kind = parse_kind(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid notification kind `{kind_text}` in notifications.kind"
        ))
    })?;
    let custom_fields_text: String = row.get("custom_fields")?;
    let custom_fields = serde_json::from_str(&custom_fields_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid custom_fields JSON in notifications.custom_fields: {err}"
        ))
    })?;

    Ok(Notification {
        id: row.get("id")?,
        owner: row.get("owner_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        created_at: parse_db_timestamp(&created_at_text, "notifications.created_at")?,
        date: parse_db_timestamp(&date_text, "notifications.date")?,
        target_student: row.get("target_student_id")?,
        target_class: row.get("target_class_id")?,
        subject: row.get("subject_id")?,
        kind,
        custom_fields,
        icon: row.get("icon")?,
    })
}
