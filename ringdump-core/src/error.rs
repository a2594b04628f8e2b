//! Error types for ringdump

use thiserror::Error;

/// Result type alias for ringdump operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ringdump
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Capture source error
    #[error("Packet capture error: {0}")]
    Capture(String),

    /// Filter rejected by the capture source
    #[error("Filter error: {0}")]
    Filter(String),

    /// Output sink error
    #[error("Output sink error: {0}")]
    Sink(String),

    /// Interface not found
    #[error("Interface '{0}' not found")]
    InterfaceNotFound(String),

    /// Interface error
    #[error("Interface error: {0}")]
    Interface(String),
}

impl Error {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create a capture error with a custom message
    pub fn capture<S: Into<String>>(msg: S) -> Self {
        Error::Capture(msg.into())
    }

    /// Create a sink error with a custom message
    pub fn sink<S: Into<String>>(msg: S) -> Self {
        Error::Sink(msg.into())
    }
}
