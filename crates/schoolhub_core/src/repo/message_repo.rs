//! Message store: the flat direct-message log behind the conversation
//! index.
//!
//! # Responsibility
//! - Keep the message log behind a trait so the document-store choice
//!   stays swappable; the SQLite implementation is the default.
//! - Serve the per-conversation "most recent" aggregations with single
//!   set-based statements instead of one query per conversation.
//! - Serve cursor-bounded history pages and the filter-scoped mark-read
//!   update.
//!
//! # Invariants
//! - `conversation_id` is the canonical pair key and is computed here on
//!   append; callers never supply it.
//! - Mark-read covers exactly the history query's base filter
//!   (conversation plus optional cursor bound), so a cursor-bounded read
//!   marks only messages before the cursor.
//! - Read flags never revert to false through this interface.

use crate::model::message::{conversation_key, Message, MessageId, NewMessage};
use crate::model::user::UserId;
use crate::repo::{ensure_connection_ready, parse_db_bool, parse_db_timestamp, RepoResult};
use crate::time::format_utc;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::HashMap;

const MESSAGE_SELECT_SQL: &str = "SELECT
    m.id,
    m.conversation_id,
    m.sender_id,
    m.recipient_id,
    m.body,
    m.sent_at,
    m.is_read
FROM messages m";

const MESSAGE_TABLES: &[&str] = &["messages"];

/// Store interface over the message log.
pub trait MessageStore {
    /// Appends one message, computing the canonical conversation key.
    /// Ingestion hook; sending itself is outside this core.
    fn append(&self, message: &NewMessage) -> RepoResult<MessageId>;
    /// The most recent message of every conversation involving `user_id`,
    /// newest conversation first. Ties on `sent_at` resolve to the
    /// highest message id (stable insertion order).
    fn latest_per_conversation(&self, user_id: UserId) -> RepoResult<Vec<Message>>;
    /// Timestamp of the most recent read-flagged message per conversation
    /// involving `user_id`; conversations without one are absent.
    fn last_read_per_conversation(
        &self,
        user_id: UserId,
    ) -> RepoResult<HashMap<String, DateTime<Utc>>>;
    /// One history page, newest first, strictly before `before` when set.
    fn history_page(
        &self,
        conversation_id: &str,
        before: Option<MessageId>,
        limit: u32,
    ) -> RepoResult<Vec<Message>>;
    /// Flags every message matching the history base filter as read.
    /// Idempotent; returns the number of rows touched by this call.
    fn mark_read(&self, conversation_id: &str, before: Option<MessageId>) -> RepoResult<usize>;
}

/// SQLite-backed message store.
pub struct SqliteMessageStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMessageStore<'conn> {
    /// Constructs a store from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, MESSAGE_TABLES)?;
        Ok(Self { conn })
    }
}

impl MessageStore for SqliteMessageStore<'_> {
    fn append(&self, message: &NewMessage) -> RepoResult<MessageId> {
        let conversation_id = conversation_key(message.sender, message.recipient);
        self.conn.execute(
            "INSERT INTO messages (
                conversation_id,
                sender_id,
                recipient_id,
                body,
                sent_at,
                is_read
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0);",
            params![
                conversation_id,
                message.sender,
                message.recipient,
                message.body.as_str(),
                format_utc(message.sent_at),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn latest_per_conversation(&self, user_id: UserId) -> RepoResult<Vec<Message>> {
        // Every message of a conversation involving the user involves the
        // user, so the participant predicate also selects the distinct
        // conversation set.
        let sql = format!(
            "{MESSAGE_SELECT_SQL}
             WHERE (m.sender_id = ?1 OR m.recipient_id = ?1)
               AND m.id = (
                    SELECT m2.id FROM messages m2
                    WHERE m2.conversation_id = m.conversation_id
                    ORDER BY m2.sent_at DESC, m2.id DESC
                    LIMIT 1
               )
             ORDER BY m.sent_at DESC, m.id DESC;"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([user_id])?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next()? {
            messages.push(parse_message_row(row)?);
        }
        Ok(messages)
    }

    fn last_read_per_conversation(
        &self,
        user_id: UserId,
    ) -> RepoResult<HashMap<String, DateTime<Utc>>> {
        let mut stmt = self.conn.prepare(
            "SELECT m.conversation_id, m.sent_at
             FROM messages m
             WHERE (m.sender_id = ?1 OR m.recipient_id = ?1)
               AND m.is_read = 1
               AND m.id = (
                    SELECT m2.id FROM messages m2
                    WHERE m2.conversation_id = m.conversation_id
                      AND m2.is_read = 1
                    ORDER BY m2.sent_at DESC, m2.id DESC
                    LIMIT 1
               );",
        )?;
        let mut rows = stmt.query([user_id])?;
        let mut last_read = HashMap::new();
        while let Some(row) = rows.next()? {
            let conversation_id: String = row.get(0)?;
            let sent_at_text: String = row.get(1)?;
            last_read.insert(
                conversation_id,
                parse_db_timestamp(&sent_at_text, "messages.sent_at")?,
            );
        }
        Ok(last_read)
    }

    fn history_page(
        &self,
        conversation_id: &str,
        before: Option<MessageId>,
        limit: u32,
    ) -> RepoResult<Vec<Message>> {
        let mut sql = format!("{MESSAGE_SELECT_SQL} WHERE m.conversation_id = ?");
        let mut bind_values = vec![Value::Text(conversation_id.to_string())];

        if let Some(before) = before {
            sql.push_str(" AND m.id < ?");
            bind_values.push(Value::Integer(before));
        }

        sql.push_str(" ORDER BY m.sent_at DESC, m.id DESC LIMIT ?;");
        bind_values.push(Value::Integer(i64::from(limit)));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut messages = Vec::new();
        while let Some(row) = rows.next()? {
            messages.push(parse_message_row(row)?);
        }
        Ok(messages)
    }

    fn mark_read(&self, conversation_id: &str, before: Option<MessageId>) -> RepoResult<usize> {
        let changed = match before {
            Some(before) => self.conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE conversation_id = ?1 AND id < ?2;",
                params![conversation_id, before],
            )?,
            None => self.conn.execute(
                "UPDATE messages SET is_read = 1 WHERE conversation_id = ?1;",
                [conversation_id],
            )?,
        };
        Ok(changed)
    }
}

fn parse_message_row(row: &Row<'_>) -> RepoResult<Message> {
    let sent_at_text: String = row.get("sent_at")?;
    Ok(Message {
        id: row.get("id")?,
        conversation_id: row.get("conversation_id")?,
        sender: row.get("sender_id")?,
        recipient: row.get("recipient_id")?,
        body: row.get("body")?,
        sent_at: parse_db_timestamp(&sent_at_text, "messages.sent_at")?,
        is_read: parse_db_bool(row.get("is_read")?, "messages.is_read")?,
    })
}
