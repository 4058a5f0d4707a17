//! Collaborator error types

use thiserror::Error;

/// Failure of an external collaborator, classified for logging
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Network, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Parse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::NotFound, message)
    }

    pub fn empty(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Empty, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Io, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Unavailable, message)
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(e: std::io::Error) -> Self {
        if e.kind() == std::io::ErrorKind::NotFound {
            Self::not_found(e.to_string())
        } else {
            Self::io(e.to_string())
        }
    }
}

impl From<csv::Error> for ServiceError {
    fn from(e: csv::Error) -> Self {
        Self::parse(format!("Malformed CSV: {e}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// Timeouts, refused connections, non-2xx responses
    Network,
    /// Response or file did not have the expected shape
    Parse,
    /// Backing file or remote resource missing
    NotFound,
    /// Well-formed but nothing to show
    Empty,
    /// Local filesystem failure
    Io,
    /// Not configured in this deployment
    Unavailable,
}

impl ServiceErrorKind {
    /// Whether an operator should look at the deployment rather than the input
    pub fn is_operational(self) -> bool {
        matches!(self, Self::Network | Self::Io | Self::Unavailable | Self::NotFound)
    }
}
