use crate::models::EntityKind;
use thiserror::Error;
use uuid::Uuid;

/// Error taxonomy of the record store. Every variant is recoverable; storage
/// connectivity faults surface through `Internal` and are retried by the
/// calling layer.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Malformed or out-of-range attribute, or a dangling reference on
    /// create/update. Carries the offending field.
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    #[error("no link between {left} and {right}")]
    LinkNotFound { left: Uuid, right: Uuid },

    /// Delete blocked by an existing dependent under a RESTRICT policy.
    /// Identifies the blocking row so the caller can resolve it.
    #[error("delete blocked by {kind} {id}")]
    Restricted { kind: EntityKind, id: Uuid },

    #[error("email already registered: {email}")]
    DuplicateEmail { email: String },

    /// An account may hold at most one profile of each type.
    #[error("account {account_id} already has a {kind} profile")]
    ProfileExists { kind: EntityKind, account_id: Uuid },

    #[error("link already exists")]
    DuplicateLink,

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RegistryError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub fn dangling(field: &'static str) -> Self {
        Self::Validation {
            field,
            reason: "dangling reference".to_string(),
        }
    }
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
