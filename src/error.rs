use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScannerError>;

#[derive(Error, Debug)]
pub enum ScannerError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Drive enumeration failed: {0}")]
    Enumeration(String),

    /// Lifecycle misuse, e.g. stopping a scanner whose timer is not armed.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("System error: {0}")]
    SystemError(String),
}

impl ScannerError {
    pub fn io(err: io::Error) -> Self {
        ScannerError::Io(err.to_string())
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, ScannerError::InvalidState(_))
    }
}

impl From<io::Error> for ScannerError {
    fn from(err: io::Error) -> Self {
        ScannerError::io(err)
    }
}

impl From<serde_json::Error> for ScannerError {
    fn from(err: serde_json::Error) -> Self {
        ScannerError::JsonError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for ScannerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ScannerError::SystemError(err.to_string())
    }
}
