use crate::domain::{ConfigError, DomainError};
use crate::integrations::detector::DetectionError;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Detection unavailable: {0}")]
    DetectionUnavailable(#[from] DetectionError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Caller-facing error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidState,
    Validation,
    Config,
    DetectionUnavailable,
    Internal,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Domain(DomainError::NotFound(_)) => ErrorKind::NotFound,
            AppError::Domain(DomainError::InvalidState(_)) => ErrorKind::InvalidState,
            AppError::Domain(DomainError::Validation(_)) => ErrorKind::Validation,
            AppError::Domain(DomainError::InvariantViolation(_)) => ErrorKind::Internal,
            AppError::Config(_) => ErrorKind::Config,
            AppError::DetectionUnavailable(_) => ErrorKind::DetectionUnavailable,
            AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Serialization(_)
            | AppError::Io(_)
            | AppError::Other(_) => ErrorKind::Internal,
        }
    }

    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{} {}", what, id))
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        AppError::Domain(DomainError::InvalidState(message.into()))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Domain(DomainError::Validation(message.into()))
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Other(format!("UUID error: {}", err))
    }
}

impl From<chrono::ParseError> for AppError {
    fn from(err: chrono::ParseError) -> Self {
        AppError::Other(format!("Date parse error: {}", err))
    }
}

impl From<r2d2::Error> for AppError {
    fn from(err: r2d2::Error) -> Self {
        AppError::Pool(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
