//! Error taxonomy for the client data layer.
//!
//! Errors are classified by how the caller recovers:
//! - Validation errors are rendered inline and never retried automatically
//! - Transient errors leave stale data visible and retry on the next
//!   natural trigger
//! - Authentication errors force a session recovery path
//!
//! No error here is fatal; the worst case is a full reset of
//! session-dependent state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure of a remote API operation, distinguishable by recovery class.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ApiError {
    /// The remote rejected the request as malformed or against the rules.
    #[error("validation failed: {message}")]
    Validation { message: String },

    /// Network or infrastructure trouble; the operation may succeed later.
    #[error("transient failure: {reason}")]
    Transient { reason: String },

    /// The caller holds no usable session.
    #[error("caller is not authenticated")]
    NotAuthenticated,

    /// The referenced entity does not exist.
    #[error("{what} not found")]
    NotFound { what: String },
}

impl ApiError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a transient error.
    pub fn transient(reason: impl Into<String>) -> Self {
        Self::Transient {
            reason: reason.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Whether retrying later could succeed without the caller changing
    /// anything.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Whether the failure is a rule rejection the user must correct.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

/// Failure of the session/identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum SessionError {
    /// Login was attempted while a session already exists.
    #[error("user is already authenticated")]
    AlreadyAuthenticated,

    /// Any other session failure (provider outage, user abort).
    #[error("session operation failed: {reason}")]
    Failed { reason: String },
}

impl SessionError {
    /// Create a generic session failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_predicates() {
        assert!(ApiError::transient("socket closed").is_transient());
        assert!(!ApiError::transient("socket closed").is_validation());
        assert!(ApiError::validation("too long").is_validation());
        assert!(!ApiError::NotAuthenticated.is_transient());
    }

    #[test]
    fn display_strings() {
        assert_eq!(
            ApiError::validation("username taken").to_string(),
            "validation failed: username taken"
        );
        assert_eq!(
            ApiError::not_found("post").to_string(),
            "post not found"
        );
        assert_eq!(
            SessionError::AlreadyAuthenticated.to_string(),
            "user is already authenticated"
        );
    }
}
