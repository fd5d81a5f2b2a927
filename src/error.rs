//! Error taxonomy shared by every engine and the service boundary.
//!
//! Three kinds reach callers: validation (never retried), not-found (never
//! retried) and dependency failures (retryable by redelivery). Collaborators
//! report their own failures as `CollaboratorError`, which the core wraps with
//! the subject and operation it was serving.

use serde::Serialize;
use thiserror::Error;

/// Failure reported by an external collaborator (store, channel, metrics sink).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("collaborator rejected the request: {0}")]
    Rejected(String),

    #[error("internal lock poisoned")]
    LockPoisoned,
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation failed during {operation} for subject '{subject_id}': {reason}")]
    Validation {
        operation: &'static str,
        subject_id: String,
        reason: String,
    },

    #[error("{entity} not found for subject '{subject_id}': {id}")]
    NotFound {
        entity: &'static str,
        subject_id: String,
        id: String,
    },

    #[error("{collaborator} failed during {operation} for subject '{subject_id}': {source}")]
    Dependency {
        collaborator: &'static str,
        operation: &'static str,
        subject_id: String,
        #[source]
        source: CollaboratorError,
    },
}

impl CoreError {
    pub fn validation(
        operation: &'static str,
        subject_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            operation,
            subject_id: subject_id.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(
        entity: &'static str,
        subject_id: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            entity,
            subject_id: subject_id.into(),
            id: id.into(),
        }
    }

    pub fn dependency(
        collaborator: &'static str,
        operation: &'static str,
        subject_id: impl Into<String>,
        source: CollaboratorError,
    ) -> Self {
        Self::Dependency {
            collaborator,
            operation,
            subject_id: subject_id.into(),
            source,
        }
    }

    /// Only dependency failures are worth redelivering.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Dependency { .. })
    }

    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Dependency { .. } => 503,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Dependency { .. } => "DEPENDENCY_ERROR",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message: self.to_string(),
            },
        }
    }
}

/// Structured error body returned at the service boundary.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400() {
        let err = CoreError::validation("add_medication", "u1", "frequency is required");
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("frequency is required"));
    }

    #[test]
    fn not_found_carries_subject_and_id() {
        let err = CoreError::not_found("Medication", "u1", "med-9");
        assert_eq!(err.status_code(), 404);
        let msg = err.to_string();
        assert!(msg.contains("u1"));
        assert!(msg.contains("med-9"));
    }

    #[test]
    fn dependency_is_retryable_and_keeps_source() {
        let err = CoreError::dependency(
            "history store",
            "append",
            "u1",
            CollaboratorError::Unavailable("timeout".into()),
        );
        assert!(err.is_retryable());
        assert_eq!(err.status_code(), 503);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("collaborator unavailable: timeout"));
    }

    #[test]
    fn body_serializes_code_and_message() {
        let body = CoreError::not_found("Medication", "u1", "m1").to_body();
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert!(json["error"]["message"].as_str().unwrap().contains("m1"));
    }
}
