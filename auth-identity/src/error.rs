use records_core::{EntityKind, RegistryError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Secret shorter than the configured minimum")]
    WeakSecret,

    #[error("Email already in use: {email}")]
    DuplicateEmail { email: String },

    #[error("Account not found")]
    AccountNotFound,

    #[error("Account already holds a {kind} profile")]
    ProfileAlreadyAttached { kind: EntityKind },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Hashing error")]
    HashingError,

    #[error("Registry error: {0}")]
    Registry(RegistryError),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl From<RegistryError> for IdentityError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::DuplicateEmail { email } => IdentityError::DuplicateEmail { email },
            RegistryError::ProfileExists { kind, .. } => {
                IdentityError::ProfileAlreadyAttached { kind }
            }
            RegistryError::NotFound {
                kind: EntityKind::Account,
                ..
            } => IdentityError::AccountNotFound,
            other => IdentityError::Registry(other),
        }
    }
}

pub type IdentityResult<T> = std::result::Result<T, IdentityError>;
