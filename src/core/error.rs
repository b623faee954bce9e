//! Error types for the application

use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Sensor provider error: {0}")]
    Provider(String),

    #[error("Hardware not supported: {0}")]
    HardwareNotSupported(String),

    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("Link write error: {0}")]
    LinkWrite(#[source] std::io::Error),

    #[error("Serial session is not open")]
    SessionClosed,
}

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;
