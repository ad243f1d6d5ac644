//! Error types for the client components.
//!
//! Each component has its own enum so callers can match on exactly the
//! outcomes that component produces. All of them convert from the HTTP
//! layer's [`ApiError`].

use portfolio_core::ValidationError;
use thiserror::Error;

use crate::http::ApiError;

/// Message shown when the backend rejects credentials without saying why.
pub const AUTH_FALLBACK_MESSAGE: &str = "Authentication failed";

/// Errors from reading or writing the persisted session.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem failure.
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session could not be serialized.
    #[error("Session serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from login and registration.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Rejected client-side before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The backend refused the credentials; carries its message verbatim.
    #[error("{0}")]
    Rejected(String),

    /// No response from the backend.
    #[error("Cannot connect to server. Please check that the backend is running. ({0})")]
    Unreachable(String),

    /// The backend answered 2xx with an unusable body.
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    /// The session could not be persisted.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Another login or registration is still in flight.
    #[error("A request is already in progress")]
    Busy,
}

impl From<ApiError> for AuthError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Transport(detail) | ApiError::InvalidUrl(detail) => Self::Unreachable(detail),
            ApiError::Rejected { message, .. } => {
                Self::Rejected(message.unwrap_or_else(|| AUTH_FALLBACK_MESSAGE.to_string()))
            }
            ApiError::Decode(detail) => Self::Decode(detail),
        }
    }
}

/// Errors from the authenticated admin endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModerationError {
    /// No session token; no request was sent.
    #[error("Not logged in")]
    NoSession,

    /// No response from the backend.
    #[error("Cannot reach server: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("{message} (HTTP {code})")]
    Rejected { code: u16, message: String },

    /// The backend answered 2xx with an unusable body.
    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl From<ApiError> for ModerationError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Transport(detail) | ApiError::InvalidUrl(detail) => Self::Transport(detail),
            ApiError::Rejected { status, message } => Self::Rejected {
                code: status,
                message: message.unwrap_or_else(|| format!("Request failed with status {status}")),
            },
            ApiError::Decode(detail) => Self::Decode(detail),
        }
    }
}

/// Errors from admin panel actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    /// The current session is not an admin session.
    #[error("Admin access required")]
    Denied,

    /// The panel has not been opened, or has been closed.
    #[error("Admin panel is not open")]
    Closed,

    /// The action refers to a record the panel has not loaded.
    #[error("{kind} {id} is not loaded")]
    NotLoaded { kind: &'static str, id: i64 },

    /// The backend call failed.
    #[error(transparent)]
    Moderation(#[from] ModerationError),
}

/// Errors from the public submission forms.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Rejected client-side before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The form is already submitting; no request was sent.
    #[error("Submission already in progress")]
    InFlight,

    /// No response from the backend.
    #[error("Cannot reach server: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Rejected { code: u16, message: String },

    /// The backend answered 2xx with an unusable body.
    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl From<ApiError> for SubmissionError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Transport(detail) | ApiError::InvalidUrl(detail) => Self::Transport(detail),
            ApiError::Rejected { status, message } => Self::Rejected {
                code: status,
                message: message.unwrap_or_else(|| format!("Submission failed with status {status}")),
            },
            ApiError::Decode(detail) => Self::Decode(detail),
        }
    }
}
