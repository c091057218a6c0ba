use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while capturing pages, synthesizing selectors and replaying rules.
///
/// None of these are fatal to a host: access and syntax failures are recovered
/// locally by the callers that can skip a context or a candidate, the rest are
/// surfaced as typed results.
#[derive(Debug, Error)]
pub enum QaError {
    #[error("Document '{url}' is not accessible: {reason}")]
    AccessDenied { url: String, reason: String },

    #[error("Invalid selector '{selector}': {reason}")]
    SelectorSyntax { selector: String, reason: String },

    #[error("No well-scoped selector found for the picked node")]
    NoSelectorFound,

    #[error("Question selector '{selector}' matched no nodes")]
    EmptyQuestionMatch { selector: String },

    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    #[error("Failed to launch browser: {0}")]
    LaunchFailed(String),

    #[error("Failed to connect to browser: {0}")]
    ConnectionFailed(String),

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Tab operation failed: {0}")]
    TabOperationFailed(String),

    #[error("Page capture failed: {0}")]
    CaptureFailed(String),

    #[error("Failed to parse page snapshot: {0}")]
    SnapshotParse(String),
}

impl QaError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            QaError::AccessDenied { .. } => ErrorKind::AccessDenied,
            QaError::SelectorSyntax { .. } => ErrorKind::SelectorSyntaxError,
            QaError::NoSelectorFound => ErrorKind::NoSelectorFound,
            QaError::EmptyQuestionMatch { .. } => ErrorKind::EmptyQuestionMatch,
            QaError::InvalidRule(_) => ErrorKind::InvalidRule,
            QaError::LaunchFailed(_)
            | QaError::ConnectionFailed(_)
            | QaError::NavigationFailed(_)
            | QaError::TabOperationFailed(_) => ErrorKind::Browser,
            QaError::CaptureFailed(_) | QaError::SnapshotParse(_) => ErrorKind::Capture,
        }
    }
}

/// Error kind as reported to hosts in `EXTRACTION_ERROR` events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub enum ErrorKind {
    AccessDenied,
    SelectorSyntaxError,
    NoSelectorFound,
    EmptyQuestionMatch,
    InvalidRule,
    Browser,
    Capture,
}

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, QaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        let err = QaError::EmptyQuestionMatch { selector: ".q".to_string() };
        assert_eq!(err.kind(), ErrorKind::EmptyQuestionMatch);
        assert!(err.to_string().contains(".q"));

        assert_eq!(QaError::InvalidRule("missing".into()).kind(), ErrorKind::InvalidRule);
        assert_eq!(QaError::CaptureFailed("x".into()).kind(), ErrorKind::Capture);
    }
}
