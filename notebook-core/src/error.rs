//! Error taxonomy shared by every Notebook client layer.
//!
//! Backends report failures as `{code, message, details?}`. The code is an
//! open string because servers may invent their own; [`ErrorCode`] names the
//! ones the client produces or reacts to.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ERROR CODES
// ============================================================================

/// Well-known error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    ValidationError,
    Conflict,
    InvalidCredentials,
    InternalError,
    Timeout,
    /// Non-2xx response without an envelope.
    HttpError,
    /// No response was received.
    NetworkError,
    /// Response arrived but its payload could not be decoded.
    InvalidResponse,
    /// A store operation was attempted without a session.
    NotAuthenticated,
    /// The local backend could not read or write its data file.
    StorageError,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::Forbidden => "FORBIDDEN",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InternalError => "INTERNAL_ERROR",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::HttpError => "HTTP_ERROR",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::InvalidResponse => "INVALID_RESPONSE",
            ErrorCode::NotAuthenticated => "NOT_AUTHENTICATED",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            ErrorCode::Unauthorized => "Authentication required",
            ErrorCode::Forbidden => "Access forbidden",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::ValidationError => "Request validation failed",
            ErrorCode::Conflict => "Resource already exists",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::Timeout => "Request timed out",
            ErrorCode::HttpError => "An error occurred",
            ErrorCode::NetworkError => "Network error. Please check your connection.",
            ErrorCode::InvalidResponse => "Unexpected response from server",
            ErrorCode::NotAuthenticated => "User not authenticated",
            ErrorCode::StorageError => "Local storage failure",
            ErrorCode::UnknownError => "An unexpected error occurred",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ERROR KIND
// ============================================================================

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad input, bad credentials, duplicates, not-found, access denied.
    Validation,
    /// The server rejected the session (HTTP 401).
    AuthenticationRejected,
    /// No response was received.
    Network,
    /// A store was used without a session; nothing was sent.
    NotAuthenticated,
    Unknown,
}

// ============================================================================
// API ERROR
// ============================================================================

/// Typed failure of a backend call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            http_status: None,
        }
    }

    /// Create an error with the code's default message.
    pub fn from_code(code: ErrorCode) -> Self {
        Self::new(code.as_str(), code.default_message())
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn has_code(&self, code: ErrorCode) -> bool {
        self.code == code.as_str()
    }

    pub fn kind(&self) -> ErrorKind {
        if self.http_status == Some(401) {
            return ErrorKind::AuthenticationRejected;
        }
        if self.has_code(ErrorCode::NetworkError) {
            return ErrorKind::Network;
        }
        if self.has_code(ErrorCode::NotAuthenticated) {
            return ErrorKind::NotAuthenticated;
        }
        match self.http_status {
            Some(status) if (400..500).contains(&status) => ErrorKind::Validation,
            Some(_) => ErrorKind::Unknown,
            None => {
                if self.has_code(ErrorCode::ValidationError)
                    || self.has_code(ErrorCode::NotFound)
                    || self.has_code(ErrorCode::Forbidden)
                    || self.has_code(ErrorCode::Conflict)
                    || self.has_code(ErrorCode::InvalidCredentials)
                {
                    ErrorKind::Validation
                } else {
                    ErrorKind::Unknown
                }
            }
        }
    }

    /// True for HTTP 404 or a `NOT_FOUND` code.
    pub fn is_not_found(&self) -> bool {
        self.http_status == Some(404) || self.has_code(ErrorCode::NotFound)
    }

    // ========================================================================
    // Convenience constructors
    // ========================================================================

    pub fn not_authenticated() -> Self {
        Self::from_code(ErrorCode::NotAuthenticated)
    }

    pub fn network() -> Self {
        Self::from_code(ErrorCode::NetworkError)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound.as_str(), message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict.as_str(), message)
    }

    pub fn invalid_credentials() -> Self {
        Self::from_code(ErrorCode::InvalidCredentials)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError.as_str(), message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidResponse.as_str(), message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError.as_str(), message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::UnknownError.as_str(), message)
    }
}

/// Result type for backend and store operations.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_401_is_authentication_rejected() {
        let err = ApiError::new("UNAUTHORIZED", "expired").with_status(401);
        assert_eq!(err.kind(), ErrorKind::AuthenticationRejected);
    }

    #[test]
    fn test_client_errors_are_validation() {
        let err = ApiError::new("HTTP_ERROR", "bad").with_status(422);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(ApiError::conflict("dup").kind(), ErrorKind::Validation);
        assert_eq!(ApiError::invalid_credentials().kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_server_errors_are_unknown() {
        let err = ApiError::new("INTERNAL_ERROR", "boom").with_status(500);
        assert_eq!(err.kind(), ErrorKind::Unknown);
        assert_eq!(ApiError::storage("disk").kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_network_and_not_authenticated_kinds() {
        assert_eq!(ApiError::network().kind(), ErrorKind::Network);
        assert_eq!(
            ApiError::not_authenticated().kind(),
            ErrorKind::NotAuthenticated
        );
    }

    #[test]
    fn test_not_found_detection() {
        assert!(ApiError::new("WHATEVER", "gone").with_status(404).is_not_found());
        assert!(ApiError::not_found("Note not found").is_not_found());
        assert!(!ApiError::validation("nope").is_not_found());
    }

    #[test]
    fn test_display_is_message() {
        let err = ApiError::new("X", "Something broke");
        assert_eq!(err.to_string(), "Something broke");
    }
}
