// src/application/error_handling.rs
//
// Error Handling for Commands
//
// ARCHITECTURE:
// - Maps internal errors -> caller-facing responses
// - Provides one consistent error format
// - Never exposes internal implementation details
// - Logs internal errors for debugging

use log::error;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};

/// Standard error response returned by commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories exposed to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Referenced parcel, inspection, image or setting does not exist
    NotFound,

    /// Operation not allowed in the entity's current state
    InvalidState,

    /// Invalid input
    Validation,

    /// Stored settings cannot be interpreted
    Config,

    /// Detector failed or timed out
    DetectionUnavailable,

    Internal,
}

impl From<ErrorKind> for ErrorType {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::NotFound => ErrorType::NotFound,
            ErrorKind::InvalidState => ErrorType::InvalidState,
            ErrorKind::Validation => ErrorType::Validation,
            ErrorKind::Config => ErrorType::Config,
            ErrorKind::DetectionUnavailable => ErrorType::DetectionUnavailable,
            ErrorKind::Internal => ErrorType::Internal,
        }
    }
}

impl ErrorResponse {
    /// Create error response from AppError
    pub fn from_app_error(error: AppError) -> Self {
        let error_type = ErrorType::from(error.kind());
        match error_type {
            ErrorType::Internal => {
                error!("Internal error: {:?}", error);
                Self {
                    success: false,
                    error_type,
                    message: "Internal error".to_string(),
                    details: Some("Check logs for details".to_string()),
                }
            }
            ErrorType::DetectionUnavailable => Self {
                success: false,
                error_type,
                message: "Damage detector unavailable".to_string(),
                details: Some(error.to_string()),
            },
            ErrorType::Config => Self {
                success: false,
                error_type,
                message: "Invalid system settings".to_string(),
                details: Some(error.to_string()),
            },
            _ => Self {
                success: false,
                error_type,
                message: error.to_string(),
                details: None,
            },
        }
    }

    /// Create validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_type: ErrorType::Validation,
            message: message.into(),
            details: None,
        }
    }

    /// Create not found error
    pub fn not_found(resource: &str) -> Self {
        Self {
            success: false,
            error_type: ErrorType::NotFound,
            message: format!("{} not found", resource),
            details: None,
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self::from_app_error(error)
    }
}

impl std::fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.message, details),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ErrorResponse {}

pub type CommandResult<T> = Result<T, ErrorResponse>;
