//! Error types for the engine crate.

use thiserror::Error;

/// Class of engine failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// Credentials were rejected; a refresh may help.
    Unauthorized,
    /// Anything else: syntax, connectivity, engine-side failures.
    Other,
}

/// A transport or engine-reported failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            kind: EngineErrorKind::Unauthorized,
            message: message.into(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            kind: EngineErrorKind::Other,
            message: message.into(),
        }
    }

    /// Classify an error by its text: `401` or `Unauthorized` (any case) mark
    /// an authorization failure.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if mentions_unauthorized(&message) {
            Self::unauthorized(message)
        } else {
            Self::other(message)
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == EngineErrorKind::Unauthorized
    }
}

fn mentions_unauthorized(message: &str) -> bool {
    message.contains("401") || message.to_ascii_lowercase().contains("unauthorized")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(EngineError::from_message("HTTP 401").is_unauthorized());
        assert!(EngineError::from_message("Unauthorized: token expired").is_unauthorized());
        assert!(EngineError::from_message("UNAUTHORIZED").is_unauthorized());
        assert!(!EngineError::from_message("line 1:8: Column 'x' cannot be resolved").is_unauthorized());
        assert!(!EngineError::from_message("connection refused").is_unauthorized());
    }

    #[test]
    fn test_display_is_message() {
        assert_eq!(EngineError::other("boom").to_string(), "boom");
    }
}
