//! # Service Error Types Module
//!
//! This module defines the error types raised inside the components that touch
//! unreliable resources: the reference table file, the nutrition lookup API and the
//! suggestion API. These errors never cross the component boundary; callers turn
//! them into "no data" (an empty table, `None`, or the fallback payload).

/// Failures of the file and network collaborators
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Credentials are absent or still set to a placeholder
    MissingCredentials(String),
    /// The request could not be sent or the connection failed
    Transport(String),
    /// The request did not complete within the configured timeout
    Timeout(String),
    /// The remote service answered with a non-success status
    Status(u16),
    /// The response body could not be interpreted
    Payload(String),
    /// A data file could not be read or parsed
    DataLoad(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::MissingCredentials(msg) => write!(f, "Missing credentials: {msg}"),
            ServiceError::Transport(msg) => write!(f, "Transport error: {msg}"),
            ServiceError::Timeout(msg) => write!(f, "Timeout error: {msg}"),
            ServiceError::Status(code) => write!(f, "Unexpected HTTP status: {code}"),
            ServiceError::Payload(msg) => write!(f, "Payload error: {msg}"),
            ServiceError::DataLoad(msg) => write!(f, "Data load error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout(err.to_string())
        } else if err.is_decode() {
            ServiceError::Payload(err.to_string())
        } else if let Some(status) = err.status() {
            ServiceError::Status(status.as_u16())
        } else {
            ServiceError::Transport(err.to_string())
        }
    }
}

impl From<csv::Error> for ServiceError {
    fn from(err: csv::Error) -> Self {
        ServiceError::DataLoad(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Payload(err.to_string())
    }
}
