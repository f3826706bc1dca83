//! Smart-plug driver errors

use hal_traits::HalError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while talking to a smart plug.
#[derive(Error, Debug)]
pub enum TasmotaError {
    /// The TCP connection could not be established
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Connecting, writing or reading took longer than allowed
    #[error("Timed out after {timeout:?} talking to {address}")]
    Timeout { address: String, timeout: Duration },

    /// I/O failure on an established connection
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The plug answered with a malformed frame
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// A command or response was not valid JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TasmotaError>;

impl From<TasmotaError> for HalError {
    fn from(error: TasmotaError) -> Self {
        match error {
            TasmotaError::Io(e) => HalError::Io(e),
            other => HalError::OperationFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = TasmotaError::Timeout {
            address: "192.168.1.11:9999".to_string(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(
            error.to_string(),
            "Timed out after 5s talking to 192.168.1.11:9999"
        );

        let error = TasmotaError::Protocol("frame too large".to_string());
        assert_eq!(error.to_string(), "Protocol error: frame too large");
    }

    #[test]
    fn test_error_conversion() {
        let error = TasmotaError::Connect {
            address: "10.0.0.2:9999".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        };
        match HalError::from(error) {
            HalError::OperationFailed(message) => {
                assert!(message.starts_with("Failed to connect to 10.0.0.2:9999"))
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let error = TasmotaError::Io(std::io::Error::from(std::io::ErrorKind::BrokenPipe));
        assert!(matches!(HalError::from(error), HalError::Io(_)));
    }
}
