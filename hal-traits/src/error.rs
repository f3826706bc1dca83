use crate::capability::Capability;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum HalError {
    #[error("Invalid pin: {0}")]
    InvalidPin(usize),

    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(Capability),

    #[error("Invalid driver parameters: {0}")]
    InvalidParameters(String),

    #[error("Driver operation failed: {0}")]
    OperationFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HalError>;
