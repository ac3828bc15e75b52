//! Chat use cases: the per-user conversation index and paginated
//! history.
//!
//! # Responsibility
//! - Combine the message store's aggregations with directory lookups
//!   into counterpart-resolved projections.
//! - Apply the mark-read side effect with exactly the history query's
//!   base filter.
//!
//! # Invariants
//! - Conversation summaries are ordered by last-message timestamp,
//!   newest first.
//! - A cursor-bounded read with `mark_as_read` flags only messages
//!   before the cursor.

use crate::model::message::{conversation_key, Message, MessageId};
use crate::model::user::{User, UserId};
use crate::repo::directory_repo::DirectoryRepository;
use crate::repo::message_repo::MessageStore;
use crate::service::filters::HistoryQuery;
use crate::service::{ServiceError, ServiceResult};
use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

/// Display identity of a chat participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRef {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
}

impl UserRef {
    fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// One row of the conversation index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationSummary {
    pub counterpart: UserRef,
    pub last_sender: UserId,
    pub last_message: String,
    pub last_message_at: DateTime<Utc>,
    /// Timestamp of the newest read-flagged message, absent when the
    /// conversation holds none.
    pub last_read_at: Option<DateTime<Utc>>,
}

/// One history page entry with resolved participant identities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageView {
    pub id: MessageId,
    pub sender: UserRef,
    pub recipient: UserRef,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub is_read: bool,
}

/// Facade over the message store and the directory graph.
pub struct ChatService<M, D> {
    messages: M,
    directory: D,
}

impl<M, D> ChatService<M, D>
where
    M: MessageStore,
    D: DirectoryRepository,
{
    pub fn new(messages: M, directory: D) -> Self {
        Self { messages, directory }
    }

    /// The principal's conversation index, newest conversation first.
    pub fn list_conversations(&self, user_id: UserId) -> ServiceResult<Vec<ConversationSummary>> {
        let latest = self.messages.latest_per_conversation(user_id)?;
        let last_read = self.messages.last_read_per_conversation(user_id)?;

        // One batched lookup for every counterpart instead of a query per
        // conversation.
        let counterpart_ids: Vec<UserId> = latest
            .iter()
            .map(|message| message.counterpart(user_id))
            .collect();
        let counterparts: HashMap<UserId, User> = self
            .directory
            .users_by_ids(&counterpart_ids)?
            .into_iter()
            .map(|user| (user.id, user))
            .collect();

        let mut summaries = Vec::with_capacity(latest.len());
        for message in &latest {
            let counterpart_id = message.counterpart(user_id);
            let counterpart = counterparts.get(&counterpart_id).ok_or_else(|| {
                ServiceError::Internal(format!(
                    "conversation {} references unknown user {counterpart_id}",
                    message.conversation_id
                ))
            })?;
            summaries.push(ConversationSummary {
                counterpart: UserRef::from_user(counterpart),
                last_sender: message.sender,
                last_message: message.body.clone(),
                last_message_at: message.sent_at,
                last_read_at: last_read.get(&message.conversation_id).copied(),
            });
        }

        debug!(
            "event=chat_index module=service status=ok user={user_id} conversations={}",
            summaries.len()
        );
        Ok(summaries)
    }

    /// One backward-paginated history page between the principal and a
    /// counterpart. With `mark_as_read`, every message matching the page
    /// query's base filter is flagged read after the read.
    pub fn get_history(
        &self,
        user_id: UserId,
        counterpart_id: UserId,
        query: &HistoryQuery,
        mark_as_read: bool,
    ) -> ServiceResult<Vec<MessageView>> {
        let filters = query.parse()?;

        let user = self.require_user(user_id)?;
        let counterpart = self.require_user(counterpart_id)?;
        let user_ref = UserRef::from_user(&user);
        let counterpart_ref = UserRef::from_user(&counterpart);

        let conversation_id = conversation_key(user_id, counterpart_id);
        let page =
            self.messages
                .history_page(&conversation_id, filters.from_message, filters.size)?;

        let views = page
            .iter()
            .map(|message| project_message(message, &user_ref, &counterpart_ref))
            .collect::<ServiceResult<Vec<_>>>()?;

        if mark_as_read {
            let marked = self
                .messages
                .mark_read(&conversation_id, filters.from_message)?;
            debug!(
                "event=chat_mark_read module=service status=ok conversation={conversation_id} marked={marked}"
            );
        }

        Ok(views)
    }

    fn require_user(&self, id: UserId) -> ServiceResult<User> {
        self.directory
            .get_user(id)?
            .ok_or(ServiceError::NotFound { entity: "user", id })
    }
}

fn project_message(
    message: &Message,
    user: &UserRef,
    counterpart: &UserRef,
) -> ServiceResult<MessageView> {
    let resolve = |id: UserId| {
        if id == user.id {
            Ok(user.clone())
        } else if id == counterpart.id {
            Ok(counterpart.clone())
        } else {
            Err(ServiceError::Internal(format!(
                "message {} references user {id} outside conversation {}",
                message.id, message.conversation_id
            )))
        }
    };
    Ok(MessageView {
        id: message.id,
        sender: resolve(message.sender)?,
        recipient: resolve(message.recipient)?,
        body: message.body.clone(),
        sent_at: message.sent_at,
        is_read: message.is_read,
    })
}
