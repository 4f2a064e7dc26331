use thiserror::Error;

use crate::domain::UserId;

pub type AdminResult<T> = std::result::Result<T, AdminError>;

/// Shown when a login request fails without a usable message in the body.
pub const LOGIN_FAILED: &str = "Login failed. Please try again.";
/// Shown when a login request never produced a response at all.
pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred.";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AdminError {
    /// Local, pre-submission; blocks the action.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Auth(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Request failed with status {status}")]
    Status { status: u16 },
    #[error("User not found: {0}")]
    NotFound(UserId),
    #[error("Unexpected response: {0}")]
    Decode(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Cache communication error: {0}")]
    CacheCommunication(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Console I/O error: {0}")]
    Console(String),
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AdminError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            AdminError::Status { status: status.as_u16() }
        } else {
            AdminError::Network(err.to_string())
        }
    }
}

impl From<std::io::Error> for AdminError {
    fn from(err: std::io::Error) -> Self {
        AdminError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AdminError {
    fn from(err: serde_json::Error) -> Self {
        AdminError::Storage(format!("JSON error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AdminError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .into_iter()
            .flat_map(|(_, errs)| errs.iter())
            .filter_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .next()
            .unwrap_or_else(|| "Invalid input".to_string());
        AdminError::Validation(message)
    }
}
