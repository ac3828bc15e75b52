//! Direct-message model and conversation key canonicalization.
//!
//! # Invariants
//! - `conversation_key(a, b) == conversation_key(b, a)` for all pairs.
//! - The key doubles as the storage key, so its shape
//!   (`<smaller>-<larger>`) must stay bit-exact.
//! - Message ids are insertion-ordered; backward pagination cursors are
//!   strictly-less-than bounds on the id.

use crate::model::user::UserId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Stable, insertion-ordered message identifier.
pub type MessageId = i64;

/// Canonical conversation identifier for an unordered participant pair.
pub fn conversation_key(a: UserId, b: UserId) -> String {
    if a < b {
        format!("{a}-{b}")
    } else {
        format!("{b}-{a}")
    }
}

/// One persisted direct message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: String,
    pub sender: UserId,
    pub recipient: UserId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    /// Set (only ever false -> true) by the bulk mark-read operation.
    pub is_read: bool,
}

impl Message {
    /// The participant who is not `user_id`.
    ///
    /// For self-conversations both participants are `user_id` and the
    /// counterpart is `user_id` itself.
    pub fn counterpart(&self, user_id: UserId) -> UserId {
        if self.sender == user_id {
            self.recipient
        } else {
            self.sender
        }
    }
}

/// Fields for message ingestion (send is external to this core; the store
/// exposes appends for ingestion tooling and tests).
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender: UserId,
    pub recipient: UserId,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}
