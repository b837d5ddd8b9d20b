//! Error handling for Fxtone
//!
//! Most failures in this crate are fail-soft: expression errors collapse to
//! `0`, playback faults return the controller to idle. The variants below
//! are what those paths log, and what configuration and file I/O surface
//! to the CLI.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Fxtone operations
pub type Result<T> = std::result::Result<T, FxError>;

/// Main error type for Fxtone operations
#[derive(Error, Debug)]
pub enum FxError {
    // Expression Errors
    #[error("Invalid expression '{expression}' at position {position}: {reason}")]
    ExpressionSyntax {
        expression: String,
        position: usize,
        reason: String,
    },

    #[error("Unknown identifier: {name}")]
    UnknownIdentifier { name: String },

    #[error("Function {name} expects {expected} argument(s), got {got}")]
    WrongArity {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Expression produced a non-numeric result at x = {x}")]
    NonFiniteResult { x: f64 },

    // Tone Engine Errors
    #[error("Tone engine unavailable: {reason}")]
    ToneEngineUnavailable { reason: String },

    #[error("Tone engine fault: {reason}")]
    ToneEngineFault { reason: String },

    #[error("Invalid note duration: {token}")]
    InvalidNoteDuration { token: String },

    // Configuration Errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // Rendering Errors
    #[error("Render error: {reason}")]
    Render { reason: String },

    // File Errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl FxError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::ExpressionSyntax { .. } => "EXPRESSION_SYNTAX",
            FxError::UnknownIdentifier { .. } => "UNKNOWN_IDENTIFIER",
            FxError::WrongArity { .. } => "WRONG_ARITY",
            FxError::NonFiniteResult { .. } => "NON_FINITE_RESULT",
            FxError::ToneEngineUnavailable { .. } => "TONE_ENGINE_UNAVAILABLE",
            FxError::ToneEngineFault { .. } => "TONE_ENGINE_FAULT",
            FxError::InvalidNoteDuration { .. } => "INVALID_NOTE_DURATION",
            FxError::InvalidConfig { .. } => "INVALID_CONFIG",
            FxError::Render { .. } => "RENDER_ERROR",
            FxError::FileNotFound { .. } => "FILE_NOT_FOUND",
            FxError::Wav(_) => "WAV_ERROR",
            FxError::Io(_) => "IO_ERROR",
            FxError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// True for the expression family of errors, which the evaluator
    /// absorbs by returning `0`.
    pub fn is_expression_error(&self) -> bool {
        matches!(
            self,
            FxError::ExpressionSyntax { .. }
                | FxError::UnknownIdentifier { .. }
                | FxError::WrongArity { .. }
                | FxError::NonFiniteResult { .. }
        )
    }

    /// Check if this error is recoverable without restarting the session
    pub fn is_recoverable(&self) -> bool {
        match self {
            FxError::ExpressionSyntax { .. } => true,
            FxError::UnknownIdentifier { .. } => true,
            FxError::WrongArity { .. } => true,
            FxError::NonFiniteResult { .. } => true,
            FxError::ToneEngineUnavailable { .. } => true,
            FxError::ToneEngineFault { .. } => true,
            FxError::InvalidNoteDuration { .. } => true,
            _ => false,
        }
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            FxError::ExpressionSyntax { .. } => vec![
                "Check for unbalanced parentheses or a dangling operator",
                "Write multiplication explicitly, e.g. 3 * x instead of 3x",
            ],
            FxError::UnknownIdentifier { .. } => vec![
                "Use x as the variable",
                "Supported functions include sin, cos, tan, sqrt, abs, pow, exp, log",
            ],
            FxError::WrongArity { .. } => vec!["Check the number of arguments passed to the function"],
            FxError::NonFiniteResult { .. } => vec![
                "The function is undefined somewhere in the domain",
                "Try narrowing the lower and upper limits",
            ],
            FxError::ToneEngineUnavailable { .. } => vec![
                "Make sure an audio output is available",
                "Start the tone engine before playing",
            ],
            FxError::InvalidNoteDuration { .. } => {
                vec!["Use a note value such as 4n, 8n, 16n or a dotted form like 8n."]
            }
            FxError::InvalidConfig { .. } => vec![
                "Delete the config file to fall back to defaults",
                "Steps, canvas size, sample rate and tempo must be positive",
                "Colors must be hex values such as #3b82f6",
            ],
            FxError::FileNotFound { .. } => vec!["Check the file path is correct"],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = FxError::UnknownIdentifier {
            name: "y".to_string(),
        };
        assert_eq!(err.error_code(), "UNKNOWN_IDENTIFIER");
        assert!(err.is_expression_error());
    }

    #[test]
    fn test_recovery_suggestions() {
        let err = FxError::NonFiniteResult { x: 0.0 };
        assert!(!err.recovery_suggestions().is_empty());
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_io_is_not_recoverable() {
        let err = FxError::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(err.error_code(), "IO_ERROR");
        assert!(!err.is_recoverable());
        assert!(!err.is_expression_error());
    }
}
