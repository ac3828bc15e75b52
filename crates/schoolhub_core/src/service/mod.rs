//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate visibility resolution, filter parsing and repository
//!   calls into use-case level APIs.
//! - Keep transport layers decoupled from storage and authorization
//!   details.
//!
//! # Invariants
//! - Every read runs through a visibility scope before any secondary
//!   filter; records outside the caller's scope surface as NotFound,
//!   never Forbidden.
//! - Validation errors surface before any write happens.

use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod chat_service;
pub mod directory_service;
pub mod filters;
pub mod notification_service;
pub mod provisioning;
pub mod push;
pub mod visibility;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service-level error taxonomy.
///
/// Authentication happens upstream in the credential service; a typed
/// `Principal` is already authenticated, so there is no Unauthenticated
/// variant here.
#[derive(Debug)]
pub enum ServiceError {
    /// Malformed client input: non-integer ids/sizes, bad dates, missing
    /// required notification target.
    BadRequest(String),
    /// Referenced entity does not exist, or exists outside the caller's
    /// visible set.
    NotFound { entity: &'static str, id: i64 },
    /// Internal invariant violation; should be unreachable.
    Internal(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(message) => write!(f, "bad request: {message}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Internal(message) => write!(f, "internal invariant violation: {message}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            other => Self::Repo(other),
        }
    }
}
