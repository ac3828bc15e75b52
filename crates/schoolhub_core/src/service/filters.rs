//! Wire-parameter parsing for the query filter pipeline.
//!
//! # Responsibility
//! - Turn raw string query parameters into typed filter values.
//! - Own the BadRequest half of the error taxonomy: non-integer ids and
//!   sizes, malformed dates and unknown kinds are client errors here;
//!   whether a referenced entity exists is checked later, against
//!   storage, and surfaces as NotFound.
//!
//! # Invariants
//! - `size == 0` is valid and means an empty page, never an error.
//! - Sizes above `PAGE_SIZE_MAX` clamp instead of failing (deliberate
//!   deviation from the unbounded original; see DESIGN.md).

use crate::model::message::MessageId;
use crate::model::notification::NotificationKind;
use crate::service::{ServiceError, ServiceResult};
use crate::time::parse_utc;
use chrono::{DateTime, Utc};

/// Upper bound applied to every requested page size.
pub const PAGE_SIZE_MAX: u32 = 500;

/// Default history page size when the caller does not supply one.
pub const HISTORY_DEFAULT_SIZE: u32 = 50;

/// Raw wire parameters of the notification list operation.
#[derive(Debug, Clone, Default)]
pub struct NotificationQuery {
    pub student: Option<String>,
    pub subject: Option<String>,
    pub kind: Option<String>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub size: Option<String>,
}

/// Parsed notification filters. Reference existence is still unchecked.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationFilters {
    pub student: Option<i64>,
    pub subject: Option<i64>,
    pub kind: Option<NotificationKind>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub size: Option<u32>,
}

impl NotificationQuery {
    pub fn parse(&self) -> ServiceResult<NotificationFilters> {
        Ok(NotificationFilters {
            student: parse_opt(self.student.as_deref(), |v| parse_id_param("student", v))?,
            subject: parse_opt(self.subject.as_deref(), |v| parse_id_param("subject", v))?,
            kind: parse_opt(self.kind.as_deref(), parse_kind_param)?,
            from_date: parse_opt(self.from_date.as_deref(), |v| {
                parse_date_param("from_date", v)
            })?,
            to_date: parse_opt(self.to_date.as_deref(), |v| parse_date_param("to_date", v))?,
            size: parse_opt(self.size.as_deref(), parse_size_param)?,
        })
    }
}

/// Raw wire parameters of the chat history operation.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    pub size: Option<String>,
    /// Boundary message id of the previous page (`from` on the wire).
    pub from_message: Option<String>,
}

/// Parsed history filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryFilters {
    pub size: u32,
    pub from_message: Option<MessageId>,
}

impl HistoryQuery {
    pub fn parse(&self) -> ServiceResult<HistoryFilters> {
        let size = match self.size.as_deref() {
            Some(value) => parse_size_param(value)?,
            None => HISTORY_DEFAULT_SIZE,
        };
        let from_message = parse_opt(self.from_message.as_deref(), |v| {
            parse_id_param("from", v)
        })?;
        Ok(HistoryFilters { size, from_message })
    }
}

/// Parses an integer id parameter; anything non-integer is a client error.
pub fn parse_id_param(name: &'static str, value: &str) -> ServiceResult<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ServiceError::BadRequest(format!("invalid {name} id: `{value}`")))
}

/// Parses a page size; clamps to [`PAGE_SIZE_MAX`], keeps zero as-is.
pub fn parse_size_param(value: &str) -> ServiceResult<u32> {
    let size = value
        .trim()
        .parse::<u32>()
        .map_err(|_| ServiceError::BadRequest(format!("invalid size: `{value}`")))?;
    Ok(size.min(PAGE_SIZE_MAX))
}

/// Parses a wire timestamp parameter.
pub fn parse_date_param(name: &'static str, value: &str) -> ServiceResult<DateTime<Utc>> {
    parse_utc(value).map_err(|err| ServiceError::BadRequest(format!("invalid {name}: {err}")))
}

/// Parses a notification kind parameter.
pub fn parse_kind_param(value: &str) -> ServiceResult<NotificationKind> {
    crate::model::notification::parse_kind(value.trim())
        .ok_or_else(|| ServiceError::BadRequest(format!("invalid notification type: `{value}`")))
}

fn parse_opt<T>(
    value: Option<&str>,
    parse: impl FnOnce(&str) -> ServiceResult<T>,
) -> ServiceResult<Option<T>> {
    value.map(parse).transpose()
}
