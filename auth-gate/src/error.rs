use records_core::RegistryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("record store error: {0}")]
    Registry(#[from] RegistryError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type GateResult<T> = std::result::Result<T, GateError>;
