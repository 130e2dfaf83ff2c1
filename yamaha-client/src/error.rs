//! Error types for the receiver control client

use thiserror::Error;

/// Errors that can occur while talking to a receiver
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Network or HTTP communication error
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// XML parsing error or an unexpected response shape
    #[error("XML parsing error: {0}")]
    Parse(String),

    /// The receiver answered with a non-zero `RC` code
    #[error("Receiver error: response code {code}")]
    Device { code: u16 },
}

/// Convenience Result type for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
